//! Queue settings contract

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockcheck_model::{QueueMode, StockCheckSettings};

/// Read/write access to stock check queue settings
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current settings; defaults when never saved
    async fn get(&self) -> Result<StockCheckSettings, StoreError>;

    /// Change queue mode and cooldown, stamping who changed them and when
    async fn update(
        &self,
        queue_mode: QueueMode,
        block_duration_minutes: Option<u32>,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<StockCheckSettings, StoreError>;

    /// Remember the time of a successful submission for cooldowns
    async fn record_submission(&self, at: DateTime<Utc>) -> Result<(), StoreError>;
}
