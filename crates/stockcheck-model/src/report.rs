//! Stock check reports
//!
//! A report is the staff member's observation set. Maps keep insertion
//! order, so every walk over a report visits entries in the order the staff
//! member recorded them.

use crate::error::ModelError;
use crate::inventory::MachineStatus;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Observation for one machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineCheck {
    /// Machine was physically checked
    #[serde(default)]
    pub checked: bool,
    /// Free-form note
    #[serde(default)]
    pub note: String,
    /// Observed status; `None` leaves the machine untouched on approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MachineStatus>,
}

impl MachineCheck {
    /// Checked machine with an observed status
    #[inline]
    #[must_use]
    pub fn with_status(status: MachineStatus) -> Self {
        Self {
            checked: true,
            note: String::new(),
            status: Some(status),
        }
    }

    /// Attach note
    #[inline]
    #[must_use]
    pub fn noted(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Observation for one item, either in a machine slot or in storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCheckEntry {
    /// Item was physically verified
    #[serde(default)]
    pub verified: bool,
    /// Counted quantity; `None` when not counted
    #[serde(default)]
    pub actual_qty: Option<i64>,
    /// Reported issue, blank when none
    #[serde(default)]
    pub issue: String,
    /// Item identifier; blank for an empty slot
    #[serde(default)]
    pub item_id: String,
    /// Item display name
    #[serde(default)]
    pub item_name: String,
    /// Slot display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slot_name: String,
    /// Quantity the system held when the form was filled
    #[serde(default)]
    pub system_qty: i64,
}

impl ItemCheckEntry {
    /// Counted entry for an item
    #[inline]
    #[must_use]
    pub fn counted(item_id: impl Into<String>, system_qty: i64, actual_qty: i64) -> Self {
        Self {
            verified: true,
            actual_qty: Some(actual_qty),
            item_id: item_id.into(),
            system_qty,
            ..Self::default()
        }
    }

    /// With item name
    #[inline]
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.item_name = name.into();
        self
    }

    /// With reported issue
    #[inline]
    #[must_use]
    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = issue.into();
        self
    }

    /// The counted quantity when it differs from the system quantity
    #[inline]
    #[must_use]
    pub fn reported_change(&self) -> Option<i64> {
        self.actual_qty.filter(|actual| *actual != self.system_qty)
    }

    /// Whether a non-blank issue was reported
    #[inline]
    #[must_use]
    pub fn has_issue(&self) -> bool {
        !self.issue.trim().is_empty()
    }

    fn validate(&self, entity: &str) -> Result<(), ModelError> {
        if let Some(actual) = self.actual_qty.filter(|q| *q < 0) {
            return Err(ModelError::NegativeQuantity {
                entity: entity.to_string(),
                field: "actualQty",
                value: actual,
            });
        }
        if self.system_qty < 0 {
            return Err(ModelError::NegativeQuantity {
                entity: entity.to_string(),
                field: "systemQty",
                value: self.system_qty,
            });
        }
        Ok(())
    }
}

/// Derived counts shown alongside a report. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportStats {
    /// Machines marked checked
    pub checked_machines: usize,
    /// Machines known at submission
    pub total_machines: usize,
    /// Items marked verified (slots and replacements)
    pub verified_items: usize,
    /// Items known at submission
    pub total_items: usize,
    /// Entries with a non-blank issue
    pub issues_found: usize,
}

impl ReportStats {
    /// Compute counts for a report against the live collection sizes
    #[must_use]
    pub fn compute(report: &StockCheckReport, total_machines: usize, total_items: usize) -> Self {
        let checked_machines = report.machine_checks.values().filter(|c| c.checked).count();

        let entries = report
            .slot_entries()
            .map(|(_, _, entry)| entry)
            .chain(report.replacement_item_checks.values());

        let (verified_items, issues_found) =
            entries.fold((0, 0), |(verified, issues), entry| {
                (
                    verified + usize::from(entry.verified),
                    issues + usize::from(entry.has_issue()),
                )
            });

        Self {
            checked_machines,
            total_machines,
            verified_items,
            total_items,
            issues_found,
        }
    }
}

/// A staff-filed stock check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckReport {
    /// Per-machine observations keyed by machine id
    #[serde(default)]
    pub machine_checks: IndexMap<String, MachineCheck>,
    /// Per-slot item observations: machine id → slot id → entry
    #[serde(default)]
    pub item_checks: IndexMap<String, IndexMap<String, ItemCheckEntry>>,
    /// Observations for items not tied to a slot, keyed by item id
    #[serde(default)]
    pub replacement_item_checks: IndexMap<String, ItemCheckEntry>,
    /// Derived counts
    #[serde(default)]
    pub stats: ReportStats,
}

impl StockCheckReport {
    /// Create empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add machine observation
    #[must_use]
    pub fn with_machine_check(mut self, machine_id: impl Into<String>, check: MachineCheck) -> Self {
        self.machine_checks.insert(machine_id.into(), check);
        self
    }

    /// Add slot observation
    #[must_use]
    pub fn with_slot_check(
        mut self,
        machine_id: impl Into<String>,
        slot_id: impl Into<String>,
        entry: ItemCheckEntry,
    ) -> Self {
        self.item_checks
            .entry(machine_id.into())
            .or_default()
            .insert(slot_id.into(), entry);
        self
    }

    /// Add replacement (storage) observation keyed by item id
    #[must_use]
    pub fn with_replacement_check(mut self, item_id: impl Into<String>, entry: ItemCheckEntry) -> Self {
        self.replacement_item_checks.insert(item_id.into(), entry);
        self
    }

    /// Walk slot entries in report order as `(machine_id, slot_id, entry)`
    pub fn slot_entries(&self) -> impl Iterator<Item = (&str, &str, &ItemCheckEntry)> {
        self.item_checks.iter().flat_map(|(machine_id, slots)| {
            slots
                .iter()
                .map(move |(slot_id, entry)| (machine_id.as_str(), slot_id.as_str(), entry))
        })
    }

    /// No machine checked and no item verified
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let any_machine = self.machine_checks.values().any(|c| c.checked);
        let any_item = self.slot_entries().any(|(_, _, e)| e.verified)
            || self.replacement_item_checks.values().any(|e| e.verified);
        !any_machine && !any_item
    }

    /// Structural validation applied where reports enter a store
    ///
    /// # Errors
    /// - `ModelError::BlankIdentifier` for blank machine, slot or item keys
    /// - `ModelError::NegativeQuantity` for negative counted/system quantities
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.machine_checks.keys().any(|k| k.trim().is_empty()) {
            return Err(ModelError::BlankIdentifier("machineChecks".to_string()));
        }

        for (machine_id, slots) in &self.item_checks {
            if machine_id.trim().is_empty() {
                return Err(ModelError::BlankIdentifier("itemChecks".to_string()));
            }
            for (slot_id, entry) in slots {
                if slot_id.trim().is_empty() {
                    return Err(ModelError::BlankIdentifier(format!("itemChecks.{machine_id}")));
                }
                entry.validate(&format!("{machine_id}/{slot_id}"))?;
            }
        }

        for (item_id, entry) in &self.replacement_item_checks {
            if item_id.trim().is_empty() {
                return Err(ModelError::BlankIdentifier("replacementItemChecks".to_string()));
            }
            entry.validate(item_id)?;
        }

        Ok(())
    }

    /// Recompute and store derived counts
    pub fn refresh_stats(&mut self, total_machines: usize, total_items: usize) {
        self.stats = ReportStats::compute(self, total_machines, total_items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> StockCheckReport {
        StockCheckReport::new()
            .with_machine_check("m1", MachineCheck::with_status(MachineStatus::Offline))
            .with_machine_check("m2", MachineCheck::default())
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5).with_issue("claw loose"))
            .with_slot_check("m1", "s2", ItemCheckEntry::counted("i2", 4, 4))
            .with_replacement_check("i3", ItemCheckEntry::counted("i3", 2, 3))
    }

    #[test]
    fn reported_change_ignores_matching_and_uncounted() {
        assert_eq!(ItemCheckEntry::counted("i1", 10, 5).reported_change(), Some(5));
        assert_eq!(ItemCheckEntry::counted("i1", 4, 4).reported_change(), None);

        let uncounted = ItemCheckEntry {
            system_qty: 3,
            ..ItemCheckEntry::default()
        };
        assert_eq!(uncounted.reported_change(), None);
    }

    #[test]
    fn slot_entries_follow_insertion_order() {
        let report = sample();
        let order: Vec<_> = report.slot_entries().map(|(m, s, _)| (m, s)).collect();
        assert_eq!(order, vec![("m1", "s1"), ("m1", "s2")]);
    }

    #[test]
    fn stats_count_checks_and_issues() {
        let stats = ReportStats::compute(&sample(), 5, 12);
        assert_eq!(
            stats,
            ReportStats {
                checked_machines: 1,
                total_machines: 5,
                verified_items: 3,
                total_items: 12,
                issues_found: 1,
            }
        );
    }

    #[test]
    fn empty_report_detected() {
        assert!(StockCheckReport::new().is_empty());
        let only_unchecked = StockCheckReport::new().with_machine_check("m1", MachineCheck::default());
        assert!(only_unchecked.is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn validate_rejects_negative_counts() {
        let report = StockCheckReport::new().with_replacement_check("i9", ItemCheckEntry::counted("i9", 1, -2));
        assert_eq!(
            report.validate(),
            Err(ModelError::NegativeQuantity {
                entity: "i9".to_string(),
                field: "actualQty",
                value: -2,
            })
        );
    }

    #[test]
    fn validate_rejects_blank_keys() {
        let report = StockCheckReport::new().with_machine_check(" ", MachineCheck::default());
        assert!(matches!(report.validate(), Err(ModelError::BlankIdentifier(_))));
    }

    #[test]
    fn deserializes_original_wire_shape() {
        let json = r#"{
            "machineChecks": {"m1": {"checked": true, "note": "", "status": "Offline"}},
            "itemChecks": {"m1": {"s1": {"verified": true, "actualQty": 5, "issue": "",
                "itemId": "i1", "itemName": "Bear", "systemQty": 10}}},
            "replacementItemChecks": {},
            "stats": {"checkedMachines": 1, "verifiedItems": 1, "issuesFound": 0}
        }"#;
        let report: StockCheckReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.machine_checks["m1"].status, Some(MachineStatus::Offline));
        assert_eq!(report.item_checks["m1"]["s1"].reported_change(), Some(5));
        assert_eq!(report.stats.checked_machines, 1);
        assert!(report.validate().is_ok());
    }
}
