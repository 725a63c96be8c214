//! Submission gate
//!
//! Decides whether a new stock check may be created. Two independent checks
//! run in order:
//! 1. the admission policy over the stored settings (cooldown by default)
//! 2. `block_until_resolved` against the pending queue
//!
//! A blocked answer persists and mutates nothing.

use crate::error::ReviewError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::{self, Debug};
use std::sync::Arc;
use stockcheck_model::{BlockStatus, QueueMode, StockCheckSettings};
use stockcheck_store::{Clock, SettingsStore, SubmissionStore};

/// Reason reported while a submission awaits review
pub const PENDING_BLOCK_REASON: &str = "A stock check is already awaiting review";

/// Settings-driven admission rule
pub trait AdmissionPolicy: Send + Sync + Debug {
    /// Evaluate the rule at `now`
    fn evaluate(&self, settings: &StockCheckSettings, now: DateTime<Utc>) -> BlockStatus;
}

/// Blocks for `block_duration_minutes` after the last submission when the
/// queue mode is `block_for_duration`
#[derive(Debug, Clone, Copy, Default)]
pub struct CooldownPolicy;

impl AdmissionPolicy for CooldownPolicy {
    fn evaluate(&self, settings: &StockCheckSettings, now: DateTime<Utc>) -> BlockStatus {
        settings.cooldown_status(now)
    }
}

/// Admission check seen by the review engine
#[async_trait]
pub trait Gate: Send + Sync {
    /// Whether a submission may be created now
    ///
    /// # Errors
    /// `ReviewError::Persistence` if the pending queue cannot be read
    async fn can_submit(&self) -> Result<BlockStatus, ReviewError>;

    /// Stamp a successful submission for cooldown tracking
    async fn record_submission(&self, at: DateTime<Utc>);
}

/// [`Gate`] over the settings and submission stores
#[derive(Clone)]
pub struct SubmissionGate {
    settings: Arc<dyn SettingsStore>,
    submissions: Arc<dyn SubmissionStore>,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn AdmissionPolicy>,
}

impl SubmissionGate {
    /// Create gate with the cooldown policy
    #[must_use]
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        submissions: Arc<dyn SubmissionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            submissions,
            clock,
            policy: Arc::new(CooldownPolicy),
        }
    }

    /// With a different admission policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn AdmissionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Stored settings, or defaults when they cannot be read
    async fn current_settings(&self) -> StockCheckSettings {
        match self.settings.get().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stock check settings, using defaults");
                StockCheckSettings::default()
            }
        }
    }
}

impl Debug for SubmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionGate")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Gate for SubmissionGate {
    async fn can_submit(&self) -> Result<BlockStatus, ReviewError> {
        let settings = self.current_settings().await;

        let status = self.policy.evaluate(&settings, self.clock.now());
        if status.blocked {
            tracing::debug!(reason = ?status.reason, "Submission blocked by admission policy");
            return Ok(status);
        }

        if settings.queue_mode == QueueMode::BlockUntilResolved {
            let pending = self.submissions.get_pending().await?;
            if !pending.is_empty() {
                tracing::debug!(pending = pending.len(), "Submission blocked until pending reviews resolve");
                return Ok(BlockStatus::blocked(PENDING_BLOCK_REASON));
            }
        }

        Ok(BlockStatus::open())
    }

    async fn record_submission(&self, at: DateTime<Utc>) {
        if let Err(e) = self.settings.record_submission(at).await {
            tracing::warn!(error = %e, "Failed to record submission time");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use stockcheck_model::{Actor, ItemCheckEntry, Snapshot, StockCheckReport};
    use stockcheck_store::{InMemorySettingsStore, InMemorySubmissionStore, ManualClock};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        settings: Arc<InMemorySettingsStore>,
        submissions: Arc<InMemorySubmissionStore>,
        gate: SubmissionGate,
    }

    fn fixture(settings: StockCheckSettings) -> Fixture {
        let clock = Arc::new(ManualClock::new(start()));
        let settings = Arc::new(InMemorySettingsStore::new(settings));
        let submissions = Arc::new(InMemorySubmissionStore::new(clock.clone()));
        let gate = SubmissionGate::new(settings.clone(), submissions.clone(), clock.clone());
        Fixture {
            clock,
            settings,
            submissions,
            gate,
        }
    }

    async fn submit(store: &InMemorySubmissionStore) -> stockcheck_model::PendingStockCheck {
        let report = StockCheckReport::new().with_replacement_check("i1", ItemCheckEntry::counted("i1", 1, 2));
        store
            .create(report, Snapshot::capture(&[], &[], start()), "u1", "Sam")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn allow_multiple_is_open_with_pending() {
        let f = fixture(StockCheckSettings::default());
        submit(&f.submissions).await;
        assert!(!f.gate.can_submit().await.unwrap().blocked);
    }

    #[tokio::test]
    async fn block_until_resolved_tracks_pending_queue() {
        let f = fixture(StockCheckSettings::default().with_queue_mode(QueueMode::BlockUntilResolved));
        assert!(!f.gate.can_submit().await.unwrap().blocked);

        let record = submit(&f.submissions).await;
        let status = f.gate.can_submit().await.unwrap();
        assert!(status.blocked);
        assert_eq!(status.reason.as_deref(), Some(PENDING_BLOCK_REASON));

        f.submissions.discard(record.id, &Actor::new("r1", "Riley"), None).await.unwrap();
        assert!(!f.gate.can_submit().await.unwrap().blocked);
    }

    #[tokio::test]
    async fn cooldown_runs_from_recorded_submission() {
        let f = fixture(
            StockCheckSettings::default()
                .with_queue_mode(QueueMode::BlockForDuration)
                .with_block_duration(30),
        );
        f.gate.record_submission(start()).await;

        f.clock.advance(Duration::minutes(10));
        let status = f.gate.can_submit().await.unwrap();
        assert!(status.blocked);
        assert_eq!(status.unblock_at, Some(start() + Duration::minutes(30)));

        f.clock.advance(Duration::minutes(20));
        assert!(!f.gate.can_submit().await.unwrap().blocked);
    }

    #[tokio::test]
    async fn unreadable_settings_fall_back_to_open() {
        let f = fixture(StockCheckSettings::default().with_queue_mode(QueueMode::BlockUntilResolved));
        submit(&f.submissions).await;
        f.settings.set_available(false);
        assert!(!f.gate.can_submit().await.unwrap().blocked);
    }

    #[tokio::test]
    async fn unreadable_pending_queue_is_an_error() {
        let f = fixture(StockCheckSettings::default().with_queue_mode(QueueMode::BlockUntilResolved));
        f.submissions.set_available(false);
        let err = f.gate.can_submit().await.unwrap_err();
        assert!(matches!(err, ReviewError::Persistence(_)));
    }
}
