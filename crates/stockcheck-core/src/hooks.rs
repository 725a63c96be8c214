//! Post-commit collaborators
//!
//! Everything here runs after the submission store has committed. Failures
//! are logged by the engine and never undo or fail the operation.
//!
//! - [`Notifier`]: submitter notifications on approve and discard
//! - [`AuditLog`]: one entry per submit, approve, discard and restore
//! - [`MaintenanceSink`]: tasks raised from reported issues and notes

use crate::error::HookError;
use crate::types::ApplyOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use stockcheck_model::{Actor, PendingStockCheck, ReviewStatus, StockCheckReport};

/// Committed workflow event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    /// New pending submission persisted
    Submitted {
        /// Created record
        record: PendingStockCheck,
    },
    /// Submission approved
    Approved {
        /// Record after transition
        record: PendingStockCheck,
        /// Inventory writes performed
        applied: ApplyOutcome,
    },
    /// Submission discarded
    Discarded {
        /// Record after transition
        record: PendingStockCheck,
    },
    /// Submission returned to pending
    Restored {
        /// Record after transition
        record: PendingStockCheck,
        /// Status before restore
        previous: ReviewStatus,
        /// Rollback writes performed
        applied: ApplyOutcome,
    },
}

impl ReviewEvent {
    /// Record the event concerns
    #[must_use]
    pub fn record(&self) -> &PendingStockCheck {
        match self {
            Self::Submitted { record }
            | Self::Approved { record, .. }
            | Self::Discarded { record }
            | Self::Restored { record, .. } => record,
        }
    }

    /// Short event name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Approved { .. } => "approved",
            Self::Discarded { .. } => "discarded",
            Self::Restored { .. } => "restored",
        }
    }
}

/// Hook invoked after each committed event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostCommitHook: Send + Sync {
    /// Hook name for logs
    fn name(&self) -> &'static str;

    /// React to a committed event
    ///
    /// # Errors
    /// `HookError` if the collaborator failed; the engine logs and moves on
    async fn on_event(&self, event: &ReviewEvent, actor: &Actor) -> Result<(), HookError>;
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Submission approved
    StockCheckApproved,
    /// Submission discarded
    StockCheckRejected,
}

impl NotificationKind {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockCheckApproved => "stock_check_approved",
            Self::StockCheckRejected => "stock_check_rejected",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message for a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Recipient user id
    pub user_id: String,
    /// Category
    pub kind: NotificationKind,
    /// Title line
    pub title: String,
    /// Body text
    pub body: String,
    /// Structured payload (`{"submissionId": ...}`)
    pub metadata: Value,
}

impl Notification {
    /// Approval notice for the submitter
    #[must_use]
    pub fn approved(record: &PendingStockCheck, reviewer: &Actor) -> Self {
        Self {
            user_id: record.submitted_by.clone(),
            kind: NotificationKind::StockCheckApproved,
            title: "Stock Check Approved".to_string(),
            body: format!(
                "Your stock check submission has been approved by {}.",
                reviewer.name
            ),
            metadata: json!({ "submissionId": record.id.to_string() }),
        }
    }

    /// Rejection notice for the submitter
    #[must_use]
    pub fn rejected(record: &PendingStockCheck, reviewer: &Actor) -> Self {
        let body = match record.rejection_reason.as_deref().filter(|r| !r.trim().is_empty()) {
            Some(reason) => format!("Your stock check was rejected: {reason}"),
            None => format!("Your stock check was rejected by {}.", reviewer.name),
        };
        Self {
            user_id: record.submitted_by.clone(),
            kind: NotificationKind::StockCheckRejected,
            title: "Stock Check Rejected".to_string(),
            body,
            metadata: json!({ "submissionId": record.id.to_string() }),
        }
    }
}

/// Fire-and-forget notification service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    ///
    /// # Errors
    /// `HookError` if the service could not accept it
    async fn create(&self, notification: Notification) -> Result<(), HookError>;
}

/// Audit verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Submission created
    Create,
    /// Submission approved
    Approve,
    /// Submission discarded
    Discard,
    /// Submission restored
    Restore,
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Acting user id
    pub actor_id: String,
    /// Verb
    pub action: AuditAction,
    /// Entity type (`stock` for submissions, `stock_check` for reviews)
    pub entity_type: String,
    /// Entity id
    pub entity_id: String,
    /// Human-readable description
    pub description: String,
    /// Value before the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Value after the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl AuditEntry {
    /// Build the entry for a committed event
    #[must_use]
    pub fn for_event(event: &ReviewEvent, actor: &Actor) -> Self {
        let record = event.record();
        let review_entry = |action, description: String, old: Value, new: Value| Self {
            actor_id: actor.id.clone(),
            action,
            entity_type: "stock_check".to_string(),
            entity_id: record.id.to_string(),
            description,
            old_value: Some(old),
            new_value: Some(new),
        };

        match event {
            ReviewEvent::Submitted { record } => Self {
                actor_id: actor.id.clone(),
                action: AuditAction::Create,
                entity_type: "stock".to_string(),
                entity_id: format!("STK-CHK-{}", record.id),
                description: "Submitted Comprehensive Stock Check".to_string(),
                old_value: None,
                new_value: serde_json::to_value(&record.report).ok(),
            },
            ReviewEvent::Approved { record, applied } => review_entry(
                AuditAction::Approve,
                format!(
                    "Approved stock check from {}: {} machine(s), {} item(s) updated",
                    record.submitted_by_name, applied.machines_updated, applied.items_updated
                ),
                json!({ "status": "pending" }),
                json!({ "status": "approved", "failedBatches": applied.failures.len() }),
            ),
            ReviewEvent::Discarded { record } => review_entry(
                AuditAction::Discard,
                format!("Discarded stock check from {}", record.submitted_by_name),
                json!({ "status": "pending" }),
                json!({ "status": "discarded", "reason": record.rejection_reason }),
            ),
            ReviewEvent::Restored {
                previous, applied, ..
            } => review_entry(
                AuditAction::Restore,
                format!(
                    "Restored stock check to pending: {} machine(s), {} item(s) rolled back",
                    applied.machines_updated, applied.items_updated
                ),
                json!({ "status": previous.as_str() }),
                json!({ "status": "pending" }),
            ),
        }
    }
}

/// Best-effort audit trail
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an entry
    ///
    /// # Errors
    /// `HookError` if the entry could not be written
    async fn log_action(&self, entry: AuditEntry) -> Result<(), HookError>;
}

/// [`PostCommitHook`] writing every event to an [`AuditLog`]
#[derive(Clone)]
pub struct AuditHook {
    log: Arc<dyn AuditLog>,
}

impl AuditHook {
    /// Create new audit hook
    #[inline]
    #[must_use]
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }
}

impl fmt::Debug for AuditHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditHook").finish_non_exhaustive()
    }
}

#[async_trait]
impl PostCommitHook for AuditHook {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn on_event(&self, event: &ReviewEvent, actor: &Actor) -> Result<(), HookError> {
        self.log.log_action(AuditEntry::for_event(event, actor)).await
    }
}

/// Machine id used for tasks raised against storage items
pub const STORAGE_MACHINE_ID: &str = "storage";

/// Task urgency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low
    Low,
    /// Medium
    #[default]
    Medium,
    /// High
    High,
}

/// Open maintenance task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTask {
    /// Machine the task is about, or [`STORAGE_MACHINE_ID`]
    pub machine_id: String,
    /// Task text
    pub description: String,
    /// Urgency
    pub priority: TaskPriority,
    /// Reporting user id
    pub created_by: String,
}

impl MaintenanceTask {
    fn medium(machine_id: impl Into<String>, description: String, created_by: &str) -> Self {
        Self {
            machine_id: machine_id.into(),
            description,
            priority: TaskPriority::Medium,
            created_by: created_by.to_string(),
        }
    }
}

/// Tasks raised by a report: slot issues, then replacement issues, then
/// machine notes. Blank issues and notes raise nothing.
#[must_use]
pub fn maintenance_tasks(report: &StockCheckReport, created_by: &str) -> Vec<MaintenanceTask> {
    let slot_issues = report
        .slot_entries()
        .filter(|(_, _, entry)| entry.has_issue())
        .map(|(machine_id, _, entry)| {
            MaintenanceTask::medium(
                machine_id,
                format!(
                    "[Stock Check] {} - {}: {}",
                    entry.slot_name, entry.item_name, entry.issue
                ),
                created_by,
            )
        });

    let replacement_issues = report
        .replacement_item_checks
        .values()
        .filter(|entry| entry.has_issue())
        .map(|entry| {
            MaintenanceTask::medium(
                STORAGE_MACHINE_ID,
                format!("[Stock Check] Replacement - {}: {}", entry.item_name, entry.issue),
                created_by,
            )
        });

    let machine_notes = report
        .machine_checks
        .iter()
        .filter(|(_, check)| !check.note.trim().is_empty())
        .map(|(machine_id, check)| {
            MaintenanceTask::medium(
                machine_id.as_str(),
                format!("[Stock Check] General: {}", check.note),
                created_by,
            )
        });

    slot_issues.chain(replacement_issues).chain(machine_notes).collect()
}

/// Maintenance task intake
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaintenanceSink: Send + Sync {
    /// Open a task
    ///
    /// # Errors
    /// `HookError` if the task could not be created
    async fn create_task(&self, task: MaintenanceTask) -> Result<(), HookError>;
}

/// [`PostCommitHook`] raising maintenance tasks for new submissions
#[derive(Clone)]
pub struct MaintenanceHook {
    sink: Arc<dyn MaintenanceSink>,
}

impl MaintenanceHook {
    /// Create new maintenance hook
    #[inline]
    #[must_use]
    pub fn new(sink: Arc<dyn MaintenanceSink>) -> Self {
        Self { sink }
    }
}

impl fmt::Debug for MaintenanceHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaintenanceHook").finish_non_exhaustive()
    }
}

#[async_trait]
impl PostCommitHook for MaintenanceHook {
    fn name(&self) -> &'static str {
        "maintenance"
    }

    /// Every task is attempted; the last failure is returned.
    async fn on_event(&self, event: &ReviewEvent, actor: &Actor) -> Result<(), HookError> {
        let ReviewEvent::Submitted { record } = event else {
            return Ok(());
        };

        let tasks = maintenance_tasks(&record.report, &actor.id);
        let total = tasks.len();
        let mut last_err = None;
        for task in tasks {
            if let Err(e) = self.sink.create_task(task).await {
                tracing::warn!(submission_id = %record.id, error = %e, "Failed to create maintenance task");
                last_err = Some(e);
            }
        }

        tracing::debug!(submission_id = %record.id, count = total, "Raised maintenance tasks");
        last_err.map_or(Ok(()), Err)
    }
}
