//! End-to-end review workflow over in-memory stores

use chrono::Duration;
use pretty_assertions::assert_eq;
use stockcheck_core::{AuditAction, NotificationKind, ReviewError, PENDING_BLOCK_REASON};
use stockcheck_model::{
    ItemCheckEntry, LocationQuantity, MachineCheck, MachineStatus, PendingStockCheck, QueueMode,
    ReviewStatus, StockCheckReport, StockCheckSettings,
};
use stockcheck_store::{BatchTarget, ItemLocationsWrite, MachineStatusWrite};
use stockcheck_test_utils::{reviewer, staff, Harness};

fn scenario_a_report() -> StockCheckReport {
    StockCheckReport::new()
        .with_machine_check("m1", MachineCheck::with_status(MachineStatus::Offline))
        .with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5))
}

async fn submit(h: &Harness, report: StockCheckReport) -> PendingStockCheck {
    let (machines, items) = h.live();
    h.engine.submit(report, &machines, &items, &staff()).await.unwrap()
}

fn machine_writes(batch: &[MachineStatusWrite]) -> Vec<(&str, MachineStatus)> {
    batch.iter().map(|w| (w.id.as_str(), w.status)).collect()
}

fn item_writes(batch: &[ItemLocationsWrite]) -> Vec<(&str, i64)> {
    batch.iter().map(|w| (w.id.as_str(), w.quantity())).collect()
}

#[tokio::test]
async fn approve_applies_reported_changes() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;
    assert_eq!(record.status, ReviewStatus::Pending);

    let outcome = h.engine.approve(record.id, &reviewer()).await.unwrap();

    assert_eq!(outcome.record.status, ReviewStatus::Approved);
    assert_eq!(outcome.record.reviewed_by.as_deref(), Some("mgr-1"));
    assert!(outcome.applied.is_complete());

    let machine_batches = h.machines.received_batches();
    assert_eq!(machine_batches.len(), 1);
    assert_eq!(machine_writes(&machine_batches[0]), vec![("m1", MachineStatus::Offline)]);

    let item_batches = h.items.received_batches();
    assert_eq!(item_batches.len(), 1);
    assert_eq!(item_writes(&item_batches[0]), vec![("i1", 5)]);
    assert_eq!(
        h.items.get("i1").unwrap().locations,
        vec![LocationQuantity::new("Warehouse", 5)]
    );
}

#[tokio::test]
async fn restore_after_approval_rolls_back_to_snapshot() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;
    h.engine.approve(record.id, &reviewer()).await.unwrap();

    h.clock.advance(Duration::hours(2));
    let outcome = h.engine.restore(record.id, &reviewer()).await.unwrap();

    let machine_batches = h.machines.received_batches();
    assert_eq!(machine_batches.len(), 2);
    assert_eq!(machine_writes(&machine_batches[1]), vec![("m1", MachineStatus::Online)]);
    assert_eq!(item_writes(&h.items.received_batches()[1]), vec![("i1", 10)]);

    assert_eq!(h.machine_status("m1"), MachineStatus::Online);
    assert_eq!(h.item_quantity("i1"), 10);

    let restored = outcome.record;
    assert_eq!(restored.status, ReviewStatus::Pending);
    assert!(restored.reviewed_by.is_none());
    assert!(restored.reviewed_by_name.is_none());
    assert!(restored.reviewed_at.is_none());
}

#[tokio::test]
async fn failed_machine_batch_does_not_stop_item_batch() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;
    h.machines.fail_next_batch();

    let outcome = h.engine.approve(record.id, &reviewer()).await.unwrap();

    assert_eq!(outcome.record.status, ReviewStatus::Approved);
    assert_eq!(outcome.applied.machines_updated, 0);
    assert_eq!(outcome.applied.items_updated, 1);
    assert_eq!(outcome.applied.failures.len(), 1);
    assert!(outcome.applied.failure(BatchTarget::Machines).is_some());
    assert_eq!(h.machine_status("m1"), MachineStatus::Online);
    assert_eq!(h.item_quantity("i1"), 5);
}

#[tokio::test]
async fn failed_rollback_batch_still_restores_to_pending() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;
    h.engine.approve(record.id, &reviewer()).await.unwrap();

    h.clock.advance(Duration::hours(1));
    h.items.fail_next_batch();
    let outcome = h.engine.restore(record.id, &reviewer()).await.unwrap();

    assert_eq!(outcome.record.status, ReviewStatus::Pending);
    assert!(outcome.record.reviewed_at.is_none());
    assert_eq!(outcome.applied.machines_updated, 1);
    assert_eq!(outcome.applied.items_updated, 0);
    assert_eq!(outcome.applied.failures.len(), 1);
    assert!(outcome.applied.failure(BatchTarget::Items).is_some());
    assert_eq!(h.machine_status("m1"), MachineStatus::Online);
    assert_eq!(h.item_quantity("i1"), 5);
}

#[tokio::test]
async fn unknown_items_are_not_counted_as_updated() {
    let h = Harness::new();
    let report = scenario_a_report().with_replacement_check("ghost", ItemCheckEntry::counted("ghost", 0, 3));
    let record = submit(&h, report).await;

    let outcome = h.engine.approve(record.id, &reviewer()).await.unwrap();

    assert!(outcome.applied.is_complete());
    assert_eq!(outcome.applied.items_updated, 1);
    assert_eq!(item_writes(&h.items.received_batches()[0]), vec![("i1", 5)]);
}

#[tokio::test]
async fn restoring_older_approval_clobbers_newer_one() {
    let h = Harness::new();
    let first = submit(&h, StockCheckReport::new().with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 5))).await;
    h.clock.advance(Duration::minutes(5));
    let second = submit(&h, StockCheckReport::new().with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 7))).await;

    h.engine.approve(first.id, &reviewer()).await.unwrap();
    assert_eq!(h.item_quantity("i1"), 5);
    h.engine.approve(second.id, &reviewer()).await.unwrap();
    assert_eq!(h.item_quantity("i1"), 7);

    h.engine.restore(first.id, &reviewer()).await.unwrap();
    assert_eq!(h.item_quantity("i1"), 10);
    assert_eq!(h.engine.get(second.id).await.unwrap().status, ReviewStatus::Approved);
}

#[tokio::test]
async fn second_review_is_rejected_without_mutation() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;
    h.engine.approve(record.id, &reviewer()).await.unwrap();

    let again = h.engine.approve(record.id, &reviewer()).await.unwrap_err();
    assert!(again.is_invalid_state());
    let discard = h.engine.discard(record.id, &reviewer(), None).await.unwrap_err();
    assert!(discard.is_invalid_state());

    assert_eq!(h.machines.received_batches().len(), 1);
    assert_eq!(h.items.received_batches().len(), 1);
}

#[tokio::test]
async fn restore_window_edges() {
    for (offset, allowed) in [
        (Duration::hours(12) - Duration::seconds(1), true),
        (Duration::hours(12) + Duration::seconds(1), false),
    ] {
        let h = Harness::new();
        let record = submit(&h, scenario_a_report()).await;
        h.engine.approve(record.id, &reviewer()).await.unwrap();
        h.clock.advance(offset);

        let result = h.engine.restore(record.id, &reviewer()).await;
        if allowed {
            assert_eq!(result.unwrap().record.status, ReviewStatus::Pending);
        } else {
            assert!(matches!(result.unwrap_err(), ReviewError::RestoreWindowExpired { .. }));
            assert_eq!(h.machines.received_batches().len(), 1);
            assert_eq!(h.engine.get(record.id).await.unwrap().status, ReviewStatus::Approved);
        }
    }
}

#[tokio::test]
async fn matching_count_produces_no_item_write() {
    let h = Harness::new();
    let report = StockCheckReport::new().with_slot_check("m1", "s1", ItemCheckEntry::counted("i1", 10, 10));
    let record = submit(&h, report).await;

    let outcome = h.engine.approve(record.id, &reviewer()).await.unwrap();
    assert_eq!(outcome.applied.items_updated, 0);
    assert!(h.items.received_batches().is_empty());
    assert!(h.machines.received_batches().is_empty());
}

#[tokio::test]
async fn discard_and_restore_never_touch_inventory() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;

    let outcome = h
        .engine
        .discard(record.id, &reviewer(), Some("wrong crane".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome.record.status, ReviewStatus::Discarded);
    assert_eq!(outcome.record.rejection_reason.as_deref(), Some("wrong crane"));

    let restored = h.engine.restore(record.id, &reviewer()).await.unwrap();
    assert_eq!(restored.record.status, ReviewStatus::Pending);
    assert!(restored.record.rejection_reason.is_none());

    assert!(h.machines.received_batches().is_empty());
    assert!(h.items.received_batches().is_empty());
}

#[tokio::test]
async fn block_until_resolved_opens_after_review() {
    let h = Harness::with_settings(StockCheckSettings::default().with_queue_mode(QueueMode::BlockUntilResolved));
    let first = submit(&h, scenario_a_report()).await;

    let (machines, items) = h.live();
    let err = h
        .engine
        .submit(scenario_a_report(), &machines, &items, &staff())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReviewError::Blocked {
            reason: PENDING_BLOCK_REASON.to_string(),
            unblock_at: None,
        }
    );
    assert_eq!(h.submissions.records().len(), 1);

    h.engine.discard(first.id, &reviewer(), None).await.unwrap();
    submit(&h, scenario_a_report()).await;
    assert_eq!(h.submissions.records().len(), 2);
}

#[tokio::test]
async fn cooldown_blocks_following_submission() {
    let h = Harness::with_settings(
        StockCheckSettings::default()
            .with_queue_mode(QueueMode::BlockForDuration)
            .with_block_duration(15),
    );
    let first = submit(&h, scenario_a_report()).await;
    assert_eq!(h.settings.settings().last_submission_at, Some(first.submitted_at));

    h.clock.advance(Duration::minutes(5));
    let (machines, items) = h.live();
    let err = h
        .engine
        .submit(scenario_a_report(), &machines, &items, &staff())
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    h.clock.advance(Duration::minutes(10));
    submit(&h, scenario_a_report()).await;
}

#[tokio::test]
async fn collaborators_see_every_committed_step() {
    let h = Harness::new();
    let report = scenario_a_report().with_replacement_check(
        "i3",
        ItemCheckEntry::counted("i3", 6, 6).named("Frog").with_issue("bag torn"),
    );
    let record = submit(&h, report).await;
    h.engine.approve(record.id, &reviewer()).await.unwrap();
    h.engine.restore(record.id, &reviewer()).await.unwrap();
    h.engine.discard(record.id, &reviewer(), None).await.unwrap();

    let actions: Vec<_> = h.audit.entries().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Create, AuditAction::Approve, AuditAction::Restore, AuditAction::Discard]
    );

    let kinds: Vec<_> = h.notifier.sent().iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::StockCheckApproved, NotificationKind::StockCheckRejected]);
    assert!(h.notifier.sent().iter().all(|n| n.user_id == "staff-1"));

    let tasks = h.maintenance.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].machine_id, "storage");
    assert_eq!(tasks[0].description, "[Stock Check] Replacement - Frog: bag torn");
}

#[tokio::test]
async fn notifier_failure_is_swallowed() {
    let h = Harness::new();
    h.notifier.set_failing(true);
    let record = submit(&h, scenario_a_report()).await;

    let outcome = h.engine.approve(record.id, &reviewer()).await.unwrap();
    assert_eq!(outcome.record.status, ReviewStatus::Approved);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn store_outage_is_fatal_and_leaves_record_unchanged() {
    let h = Harness::new();
    let record = submit(&h, scenario_a_report()).await;
    h.submissions.set_available(false);

    let err = h.engine.approve(record.id, &reviewer()).await.unwrap_err();
    assert!(matches!(err, ReviewError::Persistence(_)));
    assert!(err.is_retryable());
    assert!(h.machines.received_batches().is_empty());

    h.submissions.set_available(true);
    assert_eq!(h.engine.get(record.id).await.unwrap().status, ReviewStatus::Pending);
}

#[tokio::test]
async fn comparison_and_history_views() {
    let h = Harness::new();
    let first = submit(&h, scenario_a_report()).await;
    h.clock.advance(Duration::minutes(1));
    let second = submit(&h, scenario_a_report()).await;

    let summary = h.engine.compare(first.id).await.unwrap().summary();
    assert_eq!((summary.status_changes, summary.quantity_changes), (1, 1));

    h.engine.approve(first.id, &reviewer()).await.unwrap();
    h.clock.advance(Duration::minutes(1));
    h.engine.discard(second.id, &reviewer(), None).await.unwrap();

    let history: Vec<_> = h.engine.history(None).await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(history, vec![second.id, first.id]);
    let approved = h.engine.history(Some(ReviewStatus::Approved)).await.unwrap();
    assert_eq!(approved.len(), 1);
    assert!(h.engine.pending().await.unwrap().is_empty());
}
