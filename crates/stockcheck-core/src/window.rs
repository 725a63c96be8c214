//! Time-boxed restore window
//!
//! Evaluated lazily against the caller's clock; nothing expires in the
//! background. A record is restorable while `now - reviewed_at <= window`.

use crate::error::ReviewError;
use chrono::{DateTime, Duration, Utc};
use stockcheck_model::{PendingStockCheck, ReviewStatus};

/// Restore window of a fixed length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreWindow {
    length: Duration,
}

impl RestoreWindow {
    /// Create window of `length`
    #[inline]
    #[must_use]
    pub fn new(length: Duration) -> Self {
        Self { length }
    }

    /// Window length
    #[inline]
    #[must_use]
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Last instant a reviewed record may be restored; `None` when unreviewed
    /// or past the representable range
    #[must_use]
    pub fn deadline(&self, record: &PendingStockCheck) -> Option<DateTime<Utc>> {
        record.reviewed_at?.checked_add_signed(self.length)
    }

    /// Guard for restore.
    ///
    /// # Errors
    /// - `ReviewError::InvalidState` if the record is still pending
    /// - `ReviewError::MissingReviewTime` if no review time was stamped
    /// - `ReviewError::RestoreWindowExpired` once the window has closed
    pub fn check(&self, record: &PendingStockCheck, now: DateTime<Utc>) -> Result<(), ReviewError> {
        if record.status == ReviewStatus::Pending {
            return Err(ReviewError::InvalidState {
                id: record.id,
                expected: "approved or discarded",
                actual: record.status,
            });
        }
        let reviewed_at = record
            .reviewed_at
            .ok_or(ReviewError::MissingReviewTime(record.id))?;

        if now - reviewed_at > self.length {
            return Err(ReviewError::window_expired(record.id, reviewed_at, now, self.length));
        }
        Ok(())
    }

    /// Whether restore would pass the guard right now
    #[inline]
    #[must_use]
    pub fn can_restore(&self, record: &PendingStockCheck, now: DateTime<Utc>) -> bool {
        self.check(record, now).is_ok()
    }

    /// Time left before the window closes; `None` when not restorable
    #[must_use]
    pub fn time_remaining(&self, record: &PendingStockCheck, now: DateTime<Utc>) -> Option<Duration> {
        if !self.can_restore(record, now) {
            return None;
        }
        self.deadline(record).map(|deadline| deadline - now)
    }

    /// Reviewer-facing countdown such as `3h 12m left to restore`
    #[must_use]
    pub fn remaining_text(&self, record: &PendingStockCheck, now: DateTime<Utc>) -> Option<String> {
        let remaining = self.time_remaining(record, now)?;
        let hours = remaining.num_hours();
        let minutes = remaining.num_minutes() % 60;
        Some(if hours > 0 {
            format!("{hours}h {minutes}m left to restore")
        } else {
            format!("{minutes}m left to restore")
        })
    }
}

impl Default for RestoreWindow {
    fn default() -> Self {
        Self::new(Duration::hours(crate::types::DEFAULT_RESTORE_WINDOW_HOURS))
    }
}
