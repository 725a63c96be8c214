//! Mutation plans
//!
//! Approval and rollback plans are pure functions of `report` and
//! `snapshot_before`. Neither reads live inventory, so the same record always
//! yields the same plan.

use std::collections::HashSet;
use stockcheck_model::{Snapshot, StockCheckReport};
use stockcheck_store::{ItemQuantityUpdate, MachineUpdate};

/// Grouped inventory writes for one review step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPlan {
    /// Machine status writes
    pub machines: Vec<MachineUpdate>,
    /// Item quantity writes, at most one per item
    pub items: Vec<ItemQuantityUpdate>,
}

impl MutationPlan {
    /// Writes that carry a report into live inventory.
    ///
    /// Machines: every check with an observed status. Items: slot entries
    /// with an item id, then replacement entries, whose counted quantity
    /// differs from the system quantity. The first entry for an item wins.
    #[must_use]
    pub fn for_approval(report: &StockCheckReport) -> Self {
        let machines = report
            .machine_checks
            .iter()
            .filter_map(|(id, check)| check.status.map(|status| MachineUpdate::new(id.clone(), status)))
            .collect();

        let slot_changes = report
            .slot_entries()
            .filter(|(_, _, entry)| !entry.item_id.trim().is_empty())
            .filter_map(|(_, _, entry)| entry.reported_change().map(|q| (entry.item_id.as_str(), q)));
        let replacement_changes = report
            .replacement_item_checks
            .iter()
            .filter_map(|(item_id, entry)| entry.reported_change().map(|q| (item_id.as_str(), q)));

        let mut seen = HashSet::new();
        let items = slot_changes
            .chain(replacement_changes)
            .filter(|(item_id, _)| seen.insert(*item_id))
            .map(|(item_id, quantity)| ItemQuantityUpdate::new(item_id, quantity))
            .collect();

        Self { machines, items }
    }

    /// Writes that return the entities an approval touched to their
    /// captured values. Entities missing from the snapshot are left alone.
    #[must_use]
    pub fn for_rollback(report: &StockCheckReport, snapshot: &Snapshot) -> Self {
        let forward = Self::for_approval(report);

        let machines = forward
            .machines
            .into_iter()
            .filter_map(|update| {
                let captured = snapshot.machine(&update.machine_id);
                if captured.is_none() {
                    tracing::debug!(machine_id = %update.machine_id, "Machine absent from snapshot, not rolled back");
                }
                captured.map(|m| MachineUpdate::new(update.machine_id, m.status))
            })
            .collect();

        let items = forward
            .items
            .into_iter()
            .filter_map(|update| {
                let captured = snapshot.item(&update.item_id);
                if captured.is_none() {
                    tracing::debug!(item_id = %update.item_id, "Item absent from snapshot, not rolled back");
                }
                captured.map(|i| ItemQuantityUpdate::new(update.item_id, i.quantity))
            })
            .collect();

        Self { machines, items }
    }

    /// No writes at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty() && self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use stockcheck_model::{ItemCheckEntry, Machine, MachineCheck, MachineStatus, StockItem};

    fn snapshot() -> Snapshot {
        Snapshot::capture(
            &[Machine::new("m1", "Crane A", MachineStatus::Online)],
            &[StockItem::new("i1", "Bear", 10), StockItem::new("i2", "Duck", 4)],
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn approval_collects_status_and_changed_counts() {
        let report = StockCheckReport::new()
            .with_machine_check("m1", MachineCheck::with_status(MachineStatus::Offline))
            .with_machine_check("m2", MachineCheck::default())
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5))
            .with_slot_check("m1", "s2", ItemCheckEntry::counted("i2", 4, 4));

        let plan = MutationPlan::for_approval(&report);
        assert_eq!(plan.machines, vec![MachineUpdate::new("m1", MachineStatus::Offline)]);
        assert_eq!(plan.items, vec![ItemQuantityUpdate::new("i1", 5)]);
    }

    #[test]
    fn first_entry_for_an_item_wins() {
        let report = StockCheckReport::new()
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5))
            .with_slot_check("m2", "s1", ItemCheckEntry::counted("i1", 10, 7))
            .with_replacement_check("i1", ItemCheckEntry::counted("i1", 10, 9));

        let plan = MutationPlan::for_approval(&report);
        assert_eq!(plan.items, vec![ItemQuantityUpdate::new("i1", 5)]);
    }

    #[test]
    fn empty_slots_are_ignored() {
        let report = StockCheckReport::new().with_slot_check("m1", "s1", ItemCheckEntry::counted("", 0, 3));
        assert!(MutationPlan::for_approval(&report).is_empty());
    }

    #[test]
    fn rollback_targets_snapshot_values_and_skips_unknown() {
        let report = StockCheckReport::new()
            .with_machine_check("m1", MachineCheck::with_status(MachineStatus::Offline))
            .with_machine_check("m9", MachineCheck::with_status(MachineStatus::Error))
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5))
            .with_replacement_check("ghost", ItemCheckEntry::counted("ghost", 1, 2));

        let plan = MutationPlan::for_rollback(&report, &snapshot());
        assert_eq!(plan.machines, vec![MachineUpdate::new("m1", MachineStatus::Online)]);
        assert_eq!(plan.items, vec![ItemQuantityUpdate::new("i1", 10)]);
    }

    proptest! {
        #[test]
        fn matching_counts_never_produce_item_writes(system in 0i64..1000, n in 1usize..8) {
            let mut report = StockCheckReport::new();
            for i in 0..n {
                report = report.with_slot_check("m1", format!("s{i}"), ItemCheckEntry::counted(format!("i{i}"), system, system));
            }
            prop_assert!(MutationPlan::for_approval(&report).items.is_empty());
        }

        #[test]
        fn item_writes_are_unique_per_item(counts in prop::collection::vec((0usize..4, 0i64..20, 0i64..20), 0..16)) {
            let mut report = StockCheckReport::new();
            for (slot, (item, system, actual)) in counts.iter().enumerate() {
                report = report.with_slot_check("m1", format!("s{slot}"), ItemCheckEntry::counted(format!("i{item}"), *system, *actual));
            }
            let plan = MutationPlan::for_approval(&report);
            let mut ids: Vec<_> = plan.items.iter().map(|u| u.item_id.clone()).collect();
            let before = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), before);
        }

        #[test]
        fn rollback_touches_a_subset_of_approval(actual in 0i64..50) {
            let report = StockCheckReport::new()
                .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, actual))
                .with_replacement_check("i3", ItemCheckEntry::counted("i3", 1, actual + 2));
            let forward = MutationPlan::for_approval(&report);
            let back = MutationPlan::for_rollback(&report, &snapshot());
            prop_assert!(back.items.len() <= forward.items.len());
            prop_assert!(back.items.iter().all(|u| forward.items.iter().any(|f| f.item_id == u.item_id)));
        }
    }
}
