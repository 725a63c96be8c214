//! Stock check review workflow
//!
//! A staff member files a [`StockCheckReport`](stockcheck_model::StockCheckReport);
//! it waits in the pending queue until a reviewer approves it (applying the
//! reported machine statuses and item counts to live inventory) or discards
//! it. Either decision can be undone for a limited time by restoring the
//! submission, which rolls an approval back to the snapshot taken at
//! submission time.
//!
//! # Components
//! - [`ReviewEngine`]: approve, discard and restore orchestration
//! - [`SubmissionGate`]: admission control before a submission is created
//! - [`MutationPlan`]: pure approval/rollback plans
//! - [`RestoreWindow`]: time-boxed undo
//! - [`compare`]: reviewer-facing change rows
//! - [`hooks`]: notifications, audit trail and maintenance tasks
//!
//! # Example
//! ```rust,ignore
//! let engine = ReviewEngine::new(submissions, mutator, clock)
//!     .with_gate(Arc::new(gate))
//!     .with_notifier(notifier);
//!
//! let record = engine.submit(report, &machines, &items, &staff).await?;
//! let outcome = engine.approve(record.id, &reviewer).await?;
//! ```

pub mod comparison;
pub mod engine;
pub mod error;
pub mod gate;
pub mod hooks;
pub mod permission;
pub mod plan;
pub mod types;
pub mod window;

pub use comparison::{compare, ChangeKind, ChangeRow, Comparison, ComparisonSummary};
pub use engine::ReviewEngine;
pub use error::{HookError, ReviewError};
pub use gate::{AdmissionPolicy, CooldownPolicy, Gate, SubmissionGate, PENDING_BLOCK_REASON};
pub use hooks::{
    maintenance_tasks, AuditAction, AuditEntry, AuditHook, AuditLog, MaintenanceHook, MaintenanceSink,
    MaintenanceTask, Notification, NotificationKind, Notifier, PostCommitHook, ReviewEvent,
    TaskPriority, STORAGE_MACHINE_ID,
};
pub use permission::{AllowAll, ReviewPermission, ReviewerList};
pub use plan::MutationPlan;
pub use types::{ApplyOutcome, ReviewConfig, ReviewOutcome, DEFAULT_RESTORE_WINDOW_HOURS};
pub use window::RestoreWindow;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
