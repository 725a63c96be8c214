//! Stock check queue settings

use crate::error::ModelError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How new submissions are admitted while others exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Any number of submissions may wait for review
    #[default]
    AllowMultiple,
    /// At most one submission may be pending at a time
    BlockUntilResolved,
    /// A cooldown follows each submission
    BlockForDuration,
}

impl QueueMode {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueMode::AllowMultiple => "allow_multiple",
            QueueMode::BlockUntilResolved => "block_until_resolved",
            QueueMode::BlockForDuration => "block_for_duration",
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "allow_multiple" => Ok(QueueMode::AllowMultiple),
            "block_until_resolved" => Ok(QueueMode::BlockUntilResolved),
            "block_for_duration" => Ok(QueueMode::BlockForDuration),
            other => Err(ModelError::UnknownQueueMode(other.to_string())),
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    /// Submission is not allowed right now
    pub blocked: bool,
    /// Human-readable reason when blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When a time-based block lifts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unblock_at: Option<DateTime<Utc>>,
}

impl BlockStatus {
    /// Not blocked
    #[inline]
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Blocked with reason
    #[inline]
    #[must_use]
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
            unblock_at: None,
        }
    }

    /// Blocked until a point in time
    #[inline]
    #[must_use]
    pub fn blocked_until(unblock_at: DateTime<Utc>) -> Self {
        Self {
            blocked: true,
            reason: Some(format!(
                "Submissions blocked until {}",
                unblock_at.format("%H:%M:%S UTC")
            )),
            unblock_at: Some(unblock_at),
        }
    }
}

/// Runtime queue settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockCheckSettings {
    /// Queue mode
    pub queue_mode: QueueMode,
    /// Cooldown length for `block_for_duration`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_duration_minutes: Option<u32>,
    /// Time of the most recent successful submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submission_at: Option<DateTime<Utc>>,
    /// Who last changed the settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// When the settings last changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StockCheckSettings {
    /// Settings with a queue mode
    #[inline]
    #[must_use]
    pub fn with_queue_mode(mut self, mode: QueueMode) -> Self {
        self.queue_mode = mode;
        self
    }

    /// With cooldown minutes
    #[inline]
    #[must_use]
    pub fn with_block_duration(mut self, minutes: u32) -> Self {
        self.block_duration_minutes = Some(minutes);
        self
    }

    /// Cooldown check.
    ///
    /// Only `block_for_duration` can block here. `block_until_resolved`
    /// depends on the pending queue and is answered by the submission gate.
    #[must_use]
    pub fn cooldown_status(&self, now: DateTime<Utc>) -> BlockStatus {
        if self.queue_mode != QueueMode::BlockForDuration {
            return BlockStatus::open();
        }

        let (Some(last), Some(minutes)) = (self.last_submission_at, self.block_duration_minutes) else {
            return BlockStatus::open();
        };
        if minutes == 0 {
            return BlockStatus::open();
        }

        let unblock_at = last + Duration::minutes(i64::from(minutes));
        if now < unblock_at {
            BlockStatus::blocked_until(unblock_at)
        } else {
            BlockStatus::open()
        }
    }
}
