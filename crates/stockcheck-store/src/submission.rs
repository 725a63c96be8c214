//! Submission store contract

use crate::error::StoreError;
use async_trait::async_trait;
use stockcheck_model::{Actor, PendingStockCheck, ReviewStatus, Snapshot, StockCheckReport, SubmissionId};

/// Owner of submission records.
///
/// Implementations must make each status transition a check-and-set: the
/// guard (`status == pending` for approve/discard, `status != pending` for
/// restore) and the write happen as one step, so a record is reviewed at most
/// once per pending period.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a new `pending` record stamped with the store's current time.
    ///
    /// # Errors
    /// - `StoreError::InvalidRecord` if the report fails validation
    /// - `StoreError::Unavailable` if the backend is unreachable
    async fn create(
        &self,
        report: StockCheckReport,
        snapshot_before: Snapshot,
        submitted_by: &str,
        submitted_by_name: &str,
    ) -> Result<PendingStockCheck, StoreError>;

    /// Every record, newest submission first
    async fn get_all(&self) -> Result<Vec<PendingStockCheck>, StoreError>;

    /// Pending records, oldest submission first
    async fn get_pending(&self) -> Result<Vec<PendingStockCheck>, StoreError>;

    /// Reviewed records, most recently reviewed first.
    ///
    /// `filter` narrows to `approved` or `discarded`; passing `pending`
    /// yields nothing.
    async fn get_history(
        &self,
        filter: Option<ReviewStatus>,
    ) -> Result<Vec<PendingStockCheck>, StoreError>;

    /// Single record
    async fn get_by_id(&self, id: SubmissionId) -> Result<Option<PendingStockCheck>, StoreError>;

    /// `pending` → `approved`, stamping reviewer and review time
    ///
    /// # Errors
    /// - `StoreError::InvalidState` if the record is not pending
    async fn approve(
        &self,
        id: SubmissionId,
        reviewer: &Actor,
    ) -> Result<PendingStockCheck, StoreError>;

    /// `pending` → `discarded`, stamping reviewer, review time and reason
    ///
    /// # Errors
    /// - `StoreError::InvalidState` if the record is not pending
    async fn discard(
        &self,
        id: SubmissionId,
        reviewer: &Actor,
        reason: Option<String>,
    ) -> Result<PendingStockCheck, StoreError>;

    /// `approved`/`discarded` → `pending`, clearing review metadata.
    ///
    /// The restore window is the caller's policy and is not checked here.
    ///
    /// # Errors
    /// - `StoreError::InvalidState` if the record is already pending
    /// - `StoreError::MissingReviewTime` if the record has no review time
    async fn restore(&self, id: SubmissionId) -> Result<PendingStockCheck, StoreError>;
}
