//! Error types for stores and the batch mutator

use std::fmt;
use stockcheck_model::{ModelError, ReviewStatus, SubmissionId};

/// Store operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No submission with this id
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// Status guard rejected the transition
    #[error("submission {id} is {actual}, expected {expected}")]
    InvalidState {
        /// Submission id
        id: SubmissionId,
        /// Status the transition requires
        expected: &'static str,
        /// Status the record holds
        actual: ReviewStatus,
    },

    /// Reviewed record has no review time
    #[error("review time not recorded for submission {0}")]
    MissingReviewTime(SubmissionId),

    /// Live inventory entity missing
    #[error("{kind} not found: {id}")]
    EntityNotFound {
        /// Entity kind ("machine" or "item")
        kind: &'static str,
        /// Entity id
        id: String,
    },

    /// Record failed boundary validation
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] ModelError),

    /// Backend unreachable
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Status guard failure
    #[inline]
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. } | Self::MissingReviewTime(_))
    }
}

/// Which inventory batch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchTarget {
    /// Machine status batch
    Machines,
    /// Item quantity batch
    Items,
}

impl fmt::Display for BatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchTarget::Machines => f.write_str("machine"),
            BatchTarget::Items => f.write_str("item"),
        }
    }
}

/// A whole batch failed to apply.
///
/// The applier cannot tell which writes inside the batch landed, so every
/// attempted update is presumed failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{target} batch of {attempted} update(s) failed: {reason}")]
pub struct BatchMutationError {
    /// Failed batch
    pub target: BatchTarget,
    /// Updates in the batch
    pub attempted: usize,
    /// Underlying failure
    pub reason: String,
}

impl BatchMutationError {
    /// Create new batch error
    #[inline]
    #[must_use]
    pub fn new(target: BatchTarget, attempted: usize, reason: impl Into<String>) -> Self {
        Self {
            target,
            attempted,
            reason: reason.into(),
        }
    }
}
