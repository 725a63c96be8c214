//! Error types for the review engine, submission gate and post-commit hooks
//!
//! Store failures are fatal to the operation and surface as
//! [`ReviewError::Persistence`]. Batch failures are not errors at this level:
//! they are carried in the operation outcome instead.

use chrono::{DateTime, Duration, Utc};
use stockcheck_model::{BlockStatus, ModelError, ReviewStatus, SubmissionId};
use stockcheck_store::StoreError;

/// Main review workflow error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// No submission with this id
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// Status guard rejected the operation
    #[error("submission {id} is {actual}, expected {expected}")]
    InvalidState {
        /// Submission id
        id: SubmissionId,
        /// Status the operation requires
        expected: &'static str,
        /// Status the record holds
        actual: ReviewStatus,
    },

    /// Reviewed record carries no review time
    #[error("review time not recorded for submission {0}")]
    MissingReviewTime(SubmissionId),

    /// Restore attempted after the window closed
    #[error("restore window expired for submission {id}: reviewed {elapsed_mins} min ago, window is {window_mins} min")]
    RestoreWindowExpired {
        /// Submission id
        id: SubmissionId,
        /// When the review happened
        reviewed_at: DateTime<Utc>,
        /// Minutes since review
        elapsed_mins: i64,
        /// Window length in minutes
        window_mins: i64,
    },

    /// Actor lacks the review capability
    #[error("{actor} is not permitted to review stock checks")]
    NotPermitted {
        /// Actor id
        actor: String,
    },

    /// Submission gate denied admission
    #[error("submission blocked: {reason}")]
    Blocked {
        /// Gate reason
        reason: String,
        /// When a time-based block lifts
        unblock_at: Option<DateTime<Utc>>,
    },

    /// Nothing was checked or verified
    #[error("stock check is empty: check at least one machine or verify one item")]
    EmptyReport,

    /// Discard without a reason when one is required
    #[error("a reason is required to discard a stock check")]
    ReasonRequired,

    /// Report failed structural validation
    #[error("invalid report: {0}")]
    InvalidReport(ModelError),

    /// Store unreachable or failed
    #[error("persistence error: {0}")]
    Persistence(StoreError),
}

impl ReviewError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Blocked { .. } => true,
            Self::Persistence(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Whether the same request can succeed once the caller fixes its input
    /// or waits. An expired restore window never reopens.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound(_)
            | Self::InvalidState { .. }
            | Self::MissingReviewTime(_)
            | Self::RestoreWindowExpired { .. } => false,
            Self::NotPermitted { .. }
            | Self::Blocked { .. }
            | Self::EmptyReport
            | Self::ReasonRequired
            | Self::InvalidReport(_) => true,
            Self::Persistence(e) => e.is_retryable(),
        }
    }

    /// Status guard failure (wrong status or missing review time)
    #[inline]
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. } | Self::MissingReviewTime(_))
    }

    /// Create window-expired error
    #[must_use]
    pub fn window_expired(
        id: SubmissionId,
        reviewed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Self {
        Self::RestoreWindowExpired {
            id,
            reviewed_at,
            elapsed_mins: (now - reviewed_at).num_minutes(),
            window_mins: window.num_minutes(),
        }
    }

    /// Create gate denial from a block status
    #[must_use]
    pub fn blocked(status: BlockStatus) -> Self {
        Self::Blocked {
            reason: status
                .reason
                .unwrap_or_else(|| "Submissions are currently blocked".to_string()),
            unblock_at: status.unblock_at,
        }
    }
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::InvalidState {
                id,
                expected,
                actual,
            } => Self::InvalidState {
                id,
                expected,
                actual,
            },
            StoreError::MissingReviewTime(id) => Self::MissingReviewTime(id),
            StoreError::InvalidRecord(e) => Self::InvalidReport(e),
            other => Self::Persistence(other),
        }
    }
}

impl From<ModelError> for ReviewError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::EmptyReport => Self::EmptyReport,
            other => Self::InvalidReport(other),
        }
    }
}

/// Post-commit collaborator failures. Logged by the engine, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// Collaborator unreachable
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        /// Collaborator name
        collaborator: &'static str,
        /// Underlying failure
        reason: String,
    },

    /// Collaborator refused the payload
    #[error("{collaborator} rejected payload: {reason}")]
    Rejected {
        /// Collaborator name
        collaborator: &'static str,
        /// Underlying failure
        reason: String,
    },
}

impl HookError {
    /// Create unavailable error
    #[inline]
    #[must_use]
    pub fn unavailable(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
