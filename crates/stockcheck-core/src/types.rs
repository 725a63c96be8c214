//! Review configuration and operation outcomes

use chrono::Duration;
use stockcheck_model::PendingStockCheck;
use stockcheck_store::{BatchMutationError, BatchTarget};

/// Default restore window in hours
pub const DEFAULT_RESTORE_WINDOW_HOURS: i64 = 12;

/// Review engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewConfig {
    /// How long after review a submission may be restored
    pub restore_window: Duration,
    /// Discard must carry a non-blank reason
    pub require_reason_on_discard: bool,
    /// Send approve/discard notifications to the submitter
    pub notify_submitter: bool,
}

impl ReviewConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With restore window
    #[inline]
    #[must_use]
    pub fn with_restore_window(mut self, window: Duration) -> Self {
        self.restore_window = window;
        self
    }

    /// With discard reason requirement
    #[inline]
    #[must_use]
    pub fn with_required_discard_reason(mut self, required: bool) -> Self {
        self.require_reason_on_discard = required;
        self
    }

    /// With submitter notifications on or off
    #[inline]
    #[must_use]
    pub fn with_notify_submitter(mut self, notify: bool) -> Self {
        self.notify_submitter = notify;
        self
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            restore_window: Duration::hours(DEFAULT_RESTORE_WINDOW_HOURS),
            require_reason_on_discard: false,
            notify_submitter: true,
        }
    }
}

/// Result of applying a mutation plan to live inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Machine writes sent in batches that succeeded
    pub machines_updated: usize,
    /// Item writes sent in batches that succeeded; unknown items are not counted
    pub items_updated: usize,
    /// Batches that failed as a whole
    pub failures: Vec<BatchMutationError>,
}

impl ApplyOutcome {
    /// No batch failed
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure for one batch target, if any
    #[must_use]
    pub fn failure(&self, target: BatchTarget) -> Option<&BatchMutationError> {
        self.failures.iter().find(|f| f.target == target)
    }
}

/// Result of approve, discard or restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Record after the status transition
    pub record: PendingStockCheck,
    /// Inventory writes performed before the transition
    pub applied: ApplyOutcome,
}
