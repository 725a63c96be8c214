//! Review engine
//!
//! Orchestrates the submission lifecycle:
//! - `submit`: gate, capture snapshot, persist as pending
//! - `approve`: apply the report to live inventory, then mark approved
//! - `discard`: mark discarded without touching inventory
//! - `restore`: inside the window, roll an approval back to the snapshot and
//!   return the record to pending
//!
//! Store failures abort the operation. Batch failures are carried in the
//! outcome and never block the status transition. Notifications and hooks
//! run after the commit and cannot fail the operation.

use crate::comparison::{compare, Comparison};
use crate::error::ReviewError;
use crate::gate::Gate;
use crate::hooks::{Notification, Notifier, PostCommitHook, ReviewEvent};
use crate::permission::{AllowAll, ReviewPermission};
use crate::plan::MutationPlan;
use crate::types::{ApplyOutcome, ReviewConfig, ReviewOutcome};
use crate::window::RestoreWindow;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use stockcheck_model::{
    Actor, Machine, PendingStockCheck, ReviewStatus, Snapshot, StockCheckReport, StockItem,
    SubmissionId,
};
use stockcheck_store::{BatchMutator, Clock, StoreError, SubmissionStore};

/// The review workflow orchestrator
#[derive(Clone)]
pub struct ReviewEngine {
    /// Configuration
    config: ReviewConfig,
    /// Submission records
    submissions: Arc<dyn SubmissionStore>,
    /// Live inventory writer
    mutator: Arc<dyn BatchMutator>,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Admission control; `None` admits everything
    gate: Option<Arc<dyn Gate>>,
    /// Reviewer capability
    permission: Arc<dyn ReviewPermission>,
    /// Submitter notifications
    notifier: Option<Arc<dyn Notifier>>,
    /// Post-commit hooks
    hooks: Vec<Arc<dyn PostCommitHook>>,
}

impl ReviewEngine {
    /// Create engine with default configuration, no gate and no hooks
    #[must_use]
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        mutator: Arc<dyn BatchMutator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: ReviewConfig::default(),
            submissions,
            mutator,
            clock,
            gate: None,
            permission: Arc::new(AllowAll),
            notifier: None,
            hooks: Vec::new(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ReviewConfig) -> Self {
        self.config = config;
        self
    }

    /// With submission gate
    #[inline]
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// With reviewer capability check
    #[inline]
    #[must_use]
    pub fn with_permission(mut self, permission: Arc<dyn ReviewPermission>) -> Self {
        self.permission = permission;
        self
    }

    /// With submitter notifier
    #[inline]
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Add post-commit hook
    #[inline]
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn PostCommitHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Restore window built from the configuration
    #[inline]
    #[must_use]
    pub fn window(&self) -> RestoreWindow {
        RestoreWindow::new(self.config.restore_window)
    }

    /// File a new stock check.
    ///
    /// Validates the report, asks the gate, captures the snapshot from the
    /// given live collections and persists a pending record.
    ///
    /// # Errors
    /// - `ReviewError::InvalidReport` / `ReviewError::EmptyReport` for bad reports
    /// - `ReviewError::Blocked` when the gate denies admission
    /// - `ReviewError::Persistence` when the store fails
    pub async fn submit(
        &self,
        mut report: StockCheckReport,
        machines: &[Machine],
        items: &[StockItem],
        submitter: &Actor,
    ) -> Result<PendingStockCheck, ReviewError> {
        tracing::info!(submitter = %submitter.id, "Submitting stock check");

        report.validate()?;
        if report.is_empty() {
            return Err(ReviewError::EmptyReport);
        }

        if let Some(gate) = &self.gate {
            let status = gate.can_submit().await?;
            if status.blocked {
                tracing::info!(reason = ?status.reason, "Stock check submission blocked");
                return Err(ReviewError::blocked(status));
            }
        }

        report.refresh_stats(machines.len(), items.len());
        let snapshot = Snapshot::capture(machines, items, self.clock.now());

        let record = match self
            .submissions
            .create(report, snapshot, &submitter.id, &submitter.name)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist stock check");
                return Err(e.into());
            }
        };

        if let Some(gate) = &self.gate {
            gate.record_submission(record.submitted_at).await;
        }

        tracing::info!(
            submission_id = %record.id,
            machines = record.snapshot_before.machines().len(),
            items = record.snapshot_before.items().len(),
            "Stock check submitted for review"
        );
        let event = ReviewEvent::Submitted {
            record: record.clone(),
        };
        self.dispatch(event, submitter).await;

        Ok(record)
    }

    /// Approve a pending submission and apply it to live inventory.
    ///
    /// # Errors
    /// - `ReviewError::NotPermitted` if the reviewer lacks the capability
    /// - `ReviewError::NotFound` / `ReviewError::InvalidState` from the guard
    /// - `ReviewError::Persistence` when the store fails
    pub async fn approve(&self, id: SubmissionId, reviewer: &Actor) -> Result<ReviewOutcome, ReviewError> {
        tracing::info!(submission_id = %id, reviewer = %reviewer.id, "Approving stock check");
        self.ensure_permitted(reviewer)?;

        let record = self.load(id).await?;
        if record.status != ReviewStatus::Pending {
            return Err(ReviewError::InvalidState {
                id,
                expected: "pending",
                actual: record.status,
            });
        }

        let plan = MutationPlan::for_approval(&record.report);
        tracing::debug!(
            submission_id = %id,
            machines = plan.machines.len(),
            items = plan.items.len(),
            "Approval plan"
        );
        let applied = self.apply(id, &plan).await;

        let record = committed(id, self.submissions.approve(id, reviewer).await)?;

        tracing::info!(
            submission_id = %id,
            machines_updated = applied.machines_updated,
            items_updated = applied.items_updated,
            failed_batches = applied.failures.len(),
            "Stock check approved"
        );

        self.notify(Notification::approved(&record, reviewer)).await;
        let event = ReviewEvent::Approved {
            record: record.clone(),
            applied: applied.clone(),
        };
        self.dispatch(event, reviewer).await;

        Ok(ReviewOutcome { record, applied })
    }

    /// Discard a pending submission. Never touches inventory.
    ///
    /// A blank reason is treated as no reason.
    ///
    /// # Errors
    /// - `ReviewError::NotPermitted` if the reviewer lacks the capability
    /// - `ReviewError::ReasonRequired` when configured and no reason is given
    /// - `ReviewError::NotFound` / `ReviewError::InvalidState` from the guard
    /// - `ReviewError::Persistence` when the store fails
    pub async fn discard(
        &self,
        id: SubmissionId,
        reviewer: &Actor,
        reason: Option<String>,
    ) -> Result<ReviewOutcome, ReviewError> {
        tracing::info!(submission_id = %id, reviewer = %reviewer.id, "Discarding stock check");
        self.ensure_permitted(reviewer)?;

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if reason.is_none() && self.config.require_reason_on_discard {
            return Err(ReviewError::ReasonRequired);
        }

        let record = committed(id, self.submissions.discard(id, reviewer, reason).await)?;
        tracing::info!(submission_id = %id, "Stock check discarded");

        self.notify(Notification::rejected(&record, reviewer)).await;
        let event = ReviewEvent::Discarded {
            record: record.clone(),
        };
        self.dispatch(event, reviewer).await;

        Ok(ReviewOutcome {
            record,
            applied: ApplyOutcome::default(),
        })
    }

    /// Return a reviewed submission to pending while the window is open.
    ///
    /// An approved record is first rolled back to its snapshot values. The
    /// rollback may overwrite changes made after the approval.
    ///
    /// # Errors
    /// - `ReviewError::NotPermitted` if the actor lacks the capability
    /// - `ReviewError::NotFound`, `ReviewError::InvalidState` or
    ///   `ReviewError::MissingReviewTime` from the guard
    /// - `ReviewError::RestoreWindowExpired` once the window has closed
    /// - `ReviewError::Persistence` when the store fails
    pub async fn restore(&self, id: SubmissionId, actor: &Actor) -> Result<ReviewOutcome, ReviewError> {
        tracing::info!(submission_id = %id, actor = %actor.id, "Restoring stock check");
        self.ensure_permitted(actor)?;

        let record = self.load(id).await?;
        if let Err(e) = self.window().check(&record, self.clock.now()) {
            tracing::warn!(submission_id = %id, error = %e, "Restore refused");
            return Err(e);
        }

        let previous = record.status;
        let applied = if previous == ReviewStatus::Approved {
            let plan = MutationPlan::for_rollback(&record.report, &record.snapshot_before);
            tracing::debug!(
                submission_id = %id,
                machines = plan.machines.len(),
                items = plan.items.len(),
                "Rollback plan"
            );
            self.apply(id, &plan).await
        } else {
            ApplyOutcome::default()
        };

        let record = committed(id, self.submissions.restore(id).await)?;
        tracing::info!(submission_id = %id, previous = %previous, "Stock check restored to pending");

        let event = ReviewEvent::Restored {
            record: record.clone(),
            previous,
            applied: applied.clone(),
        };
        self.dispatch(event, actor).await;

        Ok(ReviewOutcome { record, applied })
    }

    /// Pending submissions, oldest first
    ///
    /// # Errors
    /// `ReviewError::Persistence` when the store fails
    pub async fn pending(&self) -> Result<Vec<PendingStockCheck>, ReviewError> {
        Ok(self.submissions.get_pending().await?)
    }

    /// Reviewed submissions, most recently reviewed first
    ///
    /// # Errors
    /// `ReviewError::Persistence` when the store fails
    pub async fn history(&self, filter: Option<ReviewStatus>) -> Result<Vec<PendingStockCheck>, ReviewError> {
        Ok(self.submissions.get_history(filter).await?)
    }

    /// Every submission, newest first
    ///
    /// # Errors
    /// `ReviewError::Persistence` when the store fails
    pub async fn all(&self) -> Result<Vec<PendingStockCheck>, ReviewError> {
        Ok(self.submissions.get_all().await?)
    }

    /// One submission
    ///
    /// # Errors
    /// `ReviewError::NotFound` for unknown ids, `ReviewError::Persistence`
    /// when the store fails
    pub async fn get(&self, id: SubmissionId) -> Result<PendingStockCheck, ReviewError> {
        self.load(id).await
    }

    /// Comparison of a submission against its snapshot
    ///
    /// # Errors
    /// Same as [`ReviewEngine::get`]
    pub async fn compare(&self, id: SubmissionId) -> Result<Comparison, ReviewError> {
        Ok(compare(&self.load(id).await?))
    }

    fn ensure_permitted(&self, actor: &Actor) -> Result<(), ReviewError> {
        if self.permission.can_review(actor) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor.id, "Review capability denied");
            Err(ReviewError::NotPermitted {
                actor: actor.id.clone(),
            })
        }
    }

    async fn load(&self, id: SubmissionId) -> Result<PendingStockCheck, ReviewError> {
        self.submissions
            .get_by_id(id)
            .await?
            .ok_or(ReviewError::NotFound(id))
    }

    /// Apply both batches independently; failures are collected, not raised
    async fn apply(&self, id: SubmissionId, plan: &MutationPlan) -> ApplyOutcome {
        let (machines, items) = futures::join!(
            self.mutator.apply_machine_updates(&plan.machines),
            self.mutator.apply_item_quantity_updates(&plan.items),
        );

        let mut outcome = ApplyOutcome::default();
        match machines {
            Ok(written) => outcome.machines_updated = written,
            Err(e) => {
                tracing::warn!(submission_id = %id, error = %e, "Machine batch failed");
                outcome.failures.push(e);
            }
        }
        match items {
            Ok(written) => outcome.items_updated = written,
            Err(e) => {
                tracing::warn!(submission_id = %id, error = %e, "Item batch failed");
                outcome.failures.push(e);
            }
        }
        outcome
    }

    async fn notify(&self, notification: Notification) {
        if !self.config.notify_submitter {
            return;
        }
        let Some(notifier) = &self.notifier else {
            return;
        };
        let kind = notification.kind;
        if let Err(e) = notifier.create(notification).await {
            tracing::warn!(kind = %kind, error = %e, "Failed to send notification");
        }
    }

    async fn dispatch(&self, event: ReviewEvent, actor: &Actor) {
        let results = join_all(self.hooks.iter().map(|hook| hook.on_event(&event, actor))).await;
        for (hook, result) in self.hooks.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    hook = hook.name(),
                    event = event.name(),
                    submission_id = %event.record().id,
                    error = %e,
                    "Post-commit hook failed"
                );
            }
        }
    }
}

/// Log and convert a failed status transition
fn committed(
    id: SubmissionId,
    result: Result<PendingStockCheck, StoreError>,
) -> Result<PendingStockCheck, ReviewError> {
    result.map_err(|e| {
        tracing::error!(submission_id = %id, error = %e, "Status transition failed");
        ReviewError::from(e)
    })
}

impl fmt::Debug for ReviewEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewEngine")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("permission", &self.permission)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}
