//! Live machine and item store contracts
//!
//! These stores are owned outside the review workflow. The workflow only
//! lists them (for snapshots and for rewriting item locations) and sends
//! grouped writes.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockcheck_model::{LocationQuantity, Machine, MachineStatus, StockItem};

/// `{id, data: {status}}` write for the machine store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineStatusWrite {
    /// Machine id
    pub id: String,
    /// New status
    pub status: MachineStatus,
}

/// `{id, data: {locations}}` write for the item store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLocationsWrite {
    /// Item id
    pub id: String,
    /// Full replacement location list
    pub locations: Vec<LocationQuantity>,
    /// Write time
    pub updated_at: DateTime<Utc>,
}

impl ItemLocationsWrite {
    /// Single quantity the write leaves the item holding
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> i64 {
        stockcheck_model::to_single_quantity(&self.locations)
    }
}

/// Machine records store
#[async_trait]
pub trait MachineStore: Send + Sync {
    /// All machines
    async fn list(&self) -> Result<Vec<Machine>, StoreError>;

    /// Apply status writes as one request; all or nothing
    async fn update_batch(&self, writes: Vec<MachineStatusWrite>) -> Result<(), StoreError>;
}

/// Stock item records store
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items
    async fn list(&self) -> Result<Vec<StockItem>, StoreError>;

    /// Items with the given ids in one read; unknown ids are omitted
    async fn get_many(&self, ids: &[String]) -> Result<Vec<StockItem>, StoreError>;

    /// Apply location writes as one request; all or nothing
    async fn update_batch(&self, writes: Vec<ItemLocationsWrite>) -> Result<(), StoreError>;
}
