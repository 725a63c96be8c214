//! Live inventory records and the single-quantity convention
//!
//! Machines and stock items are owned by external stores. An item's physical
//! quantity is spread over a list of named locations; the workflow treats it
//! as one number. Reading and rewriting that number goes through
//! [`to_single_quantity`] and [`from_single_quantity`] only.

use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location name used when an item has no locations yet
pub const DEFAULT_LOCATION_NAME: &str = "Warehouse";

/// Operational status of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineStatus {
    /// Running and accepting plays
    Online,
    /// Powered down or unplugged
    Offline,
    /// Out of service for maintenance
    Maintenance,
    /// Reporting a fault
    Error,
}

impl MachineStatus {
    /// All statuses, in display order
    pub const ALL: [MachineStatus; 4] = [
        MachineStatus::Online,
        MachineStatus::Offline,
        MachineStatus::Maintenance,
        MachineStatus::Error,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Online => "Online",
            MachineStatus::Offline => "Offline",
            MachineStatus::Maintenance => "Maintenance",
            MachineStatus::Error => "Error",
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MachineStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownMachineStatus(s.to_string()))
    }
}

/// A claw/arcade machine as held by the machine store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// Machine identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Current status
    pub status: MachineStatus,
    /// Floor location, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Machine {
    /// Create new machine record
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: MachineStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            location: None,
        }
    }
}

/// Quantity held at one named location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuantity {
    /// Location name (e.g. "Warehouse", "Back room")
    pub name: String,
    /// Units held there
    pub quantity: i64,
}

impl LocationQuantity {
    /// Create new location entry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// A stock item (prize) as held by the item store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Item identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Per-location quantities; the first entry is the primary location
    #[serde(default)]
    pub locations: Vec<LocationQuantity>,
    /// Machine the item is currently assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_machine_id: Option<String>,
    /// Last write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StockItem {
    /// Create item with all units at the default location
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locations: vec![LocationQuantity::new(DEFAULT_LOCATION_NAME, quantity)],
            assigned_machine_id: None,
            updated_at: None,
        }
    }

    /// Assign to machine
    #[inline]
    #[must_use]
    pub fn assigned_to(mut self, machine_id: impl Into<String>) -> Self {
        self.assigned_machine_id = Some(machine_id.into());
        self
    }

    /// Replace locations
    #[inline]
    #[must_use]
    pub fn with_locations(mut self, locations: Vec<LocationQuantity>) -> Self {
        self.locations = locations;
        self
    }

    /// Total quantity under the single-quantity convention
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> i64 {
        to_single_quantity(&self.locations)
    }
}

/// Collapse an item's locations into its single physical quantity.
///
/// The quantity is the sum over all locations. After a write through
/// [`from_single_quantity`] every non-primary location holds zero, so the
/// sum equals the primary location's value.
#[must_use]
pub fn to_single_quantity(locations: &[LocationQuantity]) -> i64 {
    locations.iter().map(|loc| loc.quantity).sum()
}

/// Rewrite an item's locations so that they hold exactly `quantity` units.
///
/// The primary (first) location receives `quantity` and every other location
/// is zeroed. An item with no locations gets a single
/// [`DEFAULT_LOCATION_NAME`] entry. This is a replacement, never an increment.
#[must_use]
pub fn from_single_quantity(locations: &[LocationQuantity], quantity: i64) -> Vec<LocationQuantity> {
    if locations.is_empty() {
        return vec![LocationQuantity::new(DEFAULT_LOCATION_NAME, quantity)];
    }

    locations
        .iter()
        .enumerate()
        .map(|(index, loc)| LocationQuantity {
            name: loc.name.clone(),
            quantity: if index == 0 { quantity } else { 0 },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn machine_status_round_trips_through_text() {
        for status in MachineStatus::ALL {
            assert_eq!(status.as_str().parse::<MachineStatus>().unwrap(), status);
        }
        assert_eq!("offline".parse::<MachineStatus>().unwrap(), MachineStatus::Offline);
        assert!("Broken".parse::<MachineStatus>().is_err());
    }

    #[test]
    fn machine_status_serializes_capitalized() {
        let json = serde_json::to_string(&MachineStatus::Maintenance).unwrap();
        assert_eq!(json, "\"Maintenance\"");
    }

    #[test]
    fn empty_locations_get_default_warehouse() {
        let rewritten = from_single_quantity(&[], 7);
        assert_eq!(rewritten, vec![LocationQuantity::new("Warehouse", 7)]);
    }

    #[test]
    fn primary_location_receives_quantity_and_rest_are_zeroed() {
        let locations = vec![
            LocationQuantity::new("Front", 3),
            LocationQuantity::new("Back", 4),
            LocationQuantity::new("Van", 1),
        ];
        let rewritten = from_single_quantity(&locations, 5);
        assert_eq!(
            rewritten,
            vec![
                LocationQuantity::new("Front", 5),
                LocationQuantity::new("Back", 0),
                LocationQuantity::new("Van", 0),
            ]
        );
        assert_eq!(to_single_quantity(&locations), 8);
    }

    #[test]
    fn stock_item_quantity_sums_locations() {
        let item = StockItem::new("i1", "Plush Bear", 0).with_locations(vec![
            LocationQuantity::new("A", 2),
            LocationQuantity::new("B", 6),
        ]);
        assert_eq!(item.quantity(), 8);
    }

    proptest! {
        #[test]
        fn prop_rewrite_then_read_is_identity(
            quantities in proptest::collection::vec(0i64..1_000, 0..6),
            target in 0i64..10_000,
        ) {
            let locations: Vec<_> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| LocationQuantity::new(format!("loc-{i}"), *q))
                .collect();

            let rewritten = from_single_quantity(&locations, target);
            prop_assert_eq!(to_single_quantity(&rewritten), target);
            prop_assert_eq!(rewritten.len(), locations.len().max(1));
        }

        #[test]
        fn prop_rewrite_is_last_writer_wins(
            first in 0i64..1_000,
            second in 0i64..1_000,
        ) {
            let base = vec![LocationQuantity::new("A", 4), LocationQuantity::new("B", 9)];
            let once = from_single_quantity(&base, first);
            let twice = from_single_quantity(&once, second);
            prop_assert_eq!(twice, from_single_quantity(&base, second));
        }
    }
}
