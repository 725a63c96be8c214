//! Point-in-time machine/item snapshots
//!
//! A [`Snapshot`] is captured once, immediately before a submission is
//! persisted, and is the only baseline used for rollback. Fields are private
//! and there is no mutating API.

use crate::inventory::{Machine, MachineStatus, StockItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine fields needed for diffing and rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Machine identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Status at capture time
    pub status: MachineStatus,
}

/// Item fields needed for diffing and rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    /// Item identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Single quantity at capture time
    pub quantity: i64,
    /// Assigned machine at capture time
    #[serde(default)]
    pub assigned_machine_id: Option<String>,
}

/// Frozen copy of machine/item state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    machines: Vec<MachineSnapshot>,
    items: Vec<ItemSnapshot>,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Project the full live collections down to the rollback fields.
    ///
    /// Pure: reads `machines` and `items`, touches nothing else.
    #[must_use]
    pub fn capture(machines: &[Machine], items: &[StockItem], captured_at: DateTime<Utc>) -> Self {
        Self {
            machines: machines
                .iter()
                .map(|m| MachineSnapshot {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    status: m.status,
                })
                .collect(),
            items: items
                .iter()
                .map(|i| ItemSnapshot {
                    id: i.id.clone(),
                    name: i.name.clone(),
                    quantity: i.quantity(),
                    assigned_machine_id: i.assigned_machine_id.clone(),
                })
                .collect(),
            captured_at,
        }
    }

    /// Captured machines
    #[inline]
    #[must_use]
    pub fn machines(&self) -> &[MachineSnapshot] {
        &self.machines
    }

    /// Captured items
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[ItemSnapshot] {
        &self.items
    }

    /// Capture time
    #[inline]
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Look up a captured machine
    #[must_use]
    pub fn machine(&self, id: &str) -> Option<&MachineSnapshot> {
        self.machines.iter().find(|m| m.id == id)
    }

    /// Look up a captured item
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemSnapshot> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::LocationQuantity;
    use chrono::TimeZone;

    #[test]
    fn capture_projects_rollback_fields() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let machines = vec![Machine::new("m1", "Crane A", MachineStatus::Online)];
        let items = vec![StockItem::new("i1", "Bear", 0)
            .with_locations(vec![LocationQuantity::new("Front", 6), LocationQuantity::new("Back", 4)])
            .assigned_to("m1")];

        let snapshot = Snapshot::capture(&machines, &items, at);

        assert_eq!(snapshot.captured_at(), at);
        assert_eq!(snapshot.machine("m1").unwrap().status, MachineStatus::Online);
        let item = snapshot.item("i1").unwrap();
        assert_eq!(item.quantity, 10);
        assert_eq!(item.assigned_machine_id.as_deref(), Some("m1"));
        assert!(snapshot.machine("missing").is_none());
    }

    #[test]
    fn capture_is_independent_of_later_changes() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut machines = vec![Machine::new("m1", "Crane A", MachineStatus::Online)];
        let snapshot = Snapshot::capture(&machines, &[], at);

        machines[0].status = MachineStatus::Error;
        assert_eq!(snapshot.machine("m1").unwrap().status, MachineStatus::Online);
    }
}
