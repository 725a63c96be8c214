//! Reviewer-facing comparison of a report against its snapshot

use serde::Serialize;
use stockcheck_model::{PendingStockCheck, Snapshot};

/// What a comparison row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Observed machine status
    MachineStatus,
    /// Counted item quantity
    ItemQuantity,
    /// Reported slot issue
    Issue,
}

/// One line of the comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRow {
    /// Row kind
    pub kind: ChangeKind,
    /// Machine id, absent for replacement items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    /// Machine display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_name: Option<String>,
    /// Item id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Item display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// Value at submission time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Reported value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Issue text for issue rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    /// Reported value differs from the captured one
    pub changed: bool,
}

/// Counts of changed rows per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    /// Changed item quantities
    pub quantity_changes: usize,
    /// Changed machine statuses
    pub status_changes: usize,
    /// Issues reported
    pub issues_reported: usize,
}

/// All comparison rows in report order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    rows: Vec<ChangeRow>,
}

impl Comparison {
    /// Every row
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[ChangeRow] {
        &self.rows
    }

    /// Rows whose value changed
    pub fn changed(&self) -> impl Iterator<Item = &ChangeRow> {
        self.rows.iter().filter(|r| r.changed)
    }

    /// Rows confirmed unchanged
    pub fn unchanged(&self) -> impl Iterator<Item = &ChangeRow> {
        self.rows.iter().filter(|r| !r.changed)
    }

    /// Changed-row counts
    #[must_use]
    pub fn summary(&self) -> ComparisonSummary {
        self.changed().fold(ComparisonSummary::default(), |mut s, row| {
            match row.kind {
                ChangeKind::ItemQuantity => s.quantity_changes += 1,
                ChangeKind::MachineStatus => s.status_changes += 1,
                ChangeKind::Issue => s.issues_reported += 1,
            }
            s
        })
    }
}

fn machine_name(snapshot: &Snapshot, machine_id: &str) -> String {
    snapshot
        .machine(machine_id)
        .map_or_else(|| machine_id.to_string(), |m| m.name.clone())
}

/// Build the comparison for a submission.
///
/// Machine rows need a captured machine. Quantity rows show the captured
/// quantity as `before`, falling back to the reported system quantity when the
/// item was not captured, and are `changed` exactly when approving would write
/// the counted quantity (counted differs from reported system quantity).
#[must_use]
pub fn compare(record: &PendingStockCheck) -> Comparison {
    let report = &record.report;
    let snapshot = &record.snapshot_before;
    let mut rows = Vec::new();

    for (machine_id, check) in &report.machine_checks {
        let (Some(status), Some(original)) = (check.status, snapshot.machine(machine_id)) else {
            continue;
        };
        rows.push(ChangeRow {
            kind: ChangeKind::MachineStatus,
            machine_id: Some(machine_id.clone()),
            machine_name: Some(original.name.clone()),
            item_id: None,
            item_name: None,
            before: Some(original.status.to_string()),
            after: Some(status.to_string()),
            issue: None,
            changed: original.status != status,
        });
    }

    for (machine_id, _, entry) in report.slot_entries() {
        let Some(actual) = entry.actual_qty else { continue };
        if entry.item_id.trim().is_empty() {
            continue;
        }
        let before = snapshot.item(&entry.item_id).map_or(entry.system_qty, |i| i.quantity);
        rows.push(ChangeRow {
            kind: ChangeKind::ItemQuantity,
            machine_id: Some(machine_id.to_string()),
            machine_name: Some(machine_name(snapshot, machine_id)),
            item_id: Some(entry.item_id.clone()),
            item_name: Some(entry.item_name.clone()),
            before: Some(before.to_string()),
            after: Some(actual.to_string()),
            issue: None,
            changed: entry.reported_change().is_some(),
        });

        if entry.has_issue() {
            rows.push(ChangeRow {
                kind: ChangeKind::Issue,
                machine_id: Some(machine_id.to_string()),
                machine_name: Some(machine_name(snapshot, machine_id)),
                item_id: Some(entry.item_id.clone()),
                item_name: Some(entry.item_name.clone()),
                before: None,
                after: None,
                issue: Some(entry.issue.clone()),
                changed: true,
            });
        }
    }

    for (item_id, entry) in &report.replacement_item_checks {
        let Some(actual) = entry.actual_qty else { continue };
        let before = snapshot.item(item_id).map_or(entry.system_qty, |i| i.quantity);
        rows.push(ChangeRow {
            kind: ChangeKind::ItemQuantity,
            machine_id: None,
            machine_name: None,
            item_id: Some(item_id.clone()),
            item_name: Some(entry.item_name.clone()),
            before: Some(before.to_string()),
            after: Some(actual.to_string()),
            issue: None,
            changed: entry.reported_change().is_some(),
        });
    }

    Comparison { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::MutationPlan;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use stockcheck_model::{
        ItemCheckEntry, Machine, MachineCheck, MachineStatus, StockCheckReport, StockItem,
    };

    fn record(report: StockCheckReport) -> PendingStockCheck {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let snapshot = Snapshot::capture(
            &[
                Machine::new("m1", "Crane A", MachineStatus::Online),
                Machine::new("m2", "Crane B", MachineStatus::Online),
            ],
            &[StockItem::new("i1", "Bear", 10), StockItem::new("i2", "Duck", 3)],
            at,
        );
        PendingStockCheck::new(report, snapshot, "u1", "Sam", at)
    }

    #[test]
    fn summary_counts_changed_rows_only() {
        let report = StockCheckReport::new()
            .with_machine_check("m1", MachineCheck::with_status(MachineStatus::Offline))
            .with_machine_check("m2", MachineCheck::with_status(MachineStatus::Online))
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5).named("Bear").with_issue("torn"))
            .with_slot_check("m1", "s2", ItemCheckEntry::counted("i2", 3, 3).named("Duck"))
            .with_replacement_check("i9", ItemCheckEntry::counted("i9", 2, 6).named("Frog"));

        let comparison = compare(&record(report));

        assert_eq!(comparison.rows().len(), 6);
        assert_eq!(comparison.unchanged().count(), 2);
        assert_eq!(
            comparison.summary(),
            ComparisonSummary {
                quantity_changes: 2,
                status_changes: 1,
                issues_reported: 1,
            }
        );
    }

    #[test]
    fn quantity_before_prefers_snapshot() {
        let report = StockCheckReport::new().with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 7, 10));
        let comparison = compare(&record(report));
        let row = &comparison.rows()[0];
        assert_eq!(row.before.as_deref(), Some("10"));
        assert!(row.changed, "counted 10 differs from reported 7, so approve writes it");
    }

    #[test]
    fn changed_matches_approval_writes_when_snapshot_drifts() {
        // Snapshot holds 3 for i2 but the staff saw 5 and counted 5.
        let report = StockCheckReport::new()
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i2", 5, 5))
            .with_replacement_check("i1", ItemCheckEntry::counted("i1", 8, 8));
        let comparison = compare(&record(report));

        assert_eq!(comparison.rows().len(), 2);
        for row in comparison.rows() {
            assert_ne!(row.before, row.after);
            assert!(!row.changed);
        }
        assert_eq!(comparison.summary().quantity_changes, 0);
    }

    #[test]
    fn changed_rows_match_approval_item_writes() {
        let report = StockCheckReport::new()
            .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 7, 10))
            .with_slot_check("m1", "s2", ItemCheckEntry::counted("i2", 5, 5))
            .with_replacement_check("i8", ItemCheckEntry::counted("i8", 1, 4));
        let record = record(report);

        let mut changed: Vec<_> = compare(&record)
            .changed()
            .filter_map(|r| r.item_id.clone())
            .collect();
        changed.sort();
        let mut planned: Vec<_> = MutationPlan::for_approval(&record.report)
            .items
            .into_iter()
            .map(|u| u.item_id)
            .collect();
        planned.sort();

        assert_eq!(changed, planned);
    }

    #[test]
    fn uncaptured_machine_has_no_status_row() {
        let report = StockCheckReport::new().with_machine_check("m7", MachineCheck::with_status(MachineStatus::Error));
        assert!(compare(&record(report)).rows().is_empty());
    }
}
