//! In-process backends
//!
//! Every store here keeps its records behind a `parking_lot` lock and can be
//! switched to "unavailable" to exercise persistence failures. The inventory
//! stores also record each batch they receive.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::inventory::{ItemLocationsWrite, ItemStore, MachineStatusWrite, MachineStore};
use crate::settings::SettingsStore;
use crate::submission::SubmissionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stockcheck_model::{
    Actor, Machine, PendingStockCheck, QueueMode, ReviewStatus, Snapshot, StockCheckReport,
    StockCheckSettings, StockItem, SubmissionId,
};

const UNAVAILABLE: &str = "in-memory store switched off";

fn check_available(available: &AtomicBool) -> Result<(), StoreError> {
    if available.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(StoreError::Unavailable(UNAVAILABLE.to_string()))
    }
}

/// In-memory [`SubmissionStore`]
pub struct InMemorySubmissionStore {
    records: RwLock<IndexMap<SubmissionId, PendingStockCheck>>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl InMemorySubmissionStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_records(clock, Vec::new())
    }

    /// Create store holding existing records
    #[must_use]
    pub fn with_records(clock: Arc<dyn Clock>, records: Vec<PendingStockCheck>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id, r)).collect()),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Copy of every record in insertion order
    #[must_use]
    pub fn records(&self) -> Vec<PendingStockCheck> {
        self.records.read().values().cloned().collect()
    }

    /// Simulate the backend going away or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn review(
        &self,
        id: SubmissionId,
        status: ReviewStatus,
        reviewer: &Actor,
        reason: Option<String>,
    ) -> Result<PendingStockCheck, StoreError> {
        check_available(&self.available)?;

        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status != ReviewStatus::Pending {
            return Err(StoreError::InvalidState {
                id,
                expected: "pending",
                actual: record.status,
            });
        }

        record.mark_reviewed(status, reviewer, self.clock.now(), reason);
        Ok(record.clone())
    }
}

impl fmt::Debug for InMemorySubmissionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySubmissionStore")
            .field("records", &self.records.read().len())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn create(
        &self,
        report: StockCheckReport,
        snapshot_before: Snapshot,
        submitted_by: &str,
        submitted_by_name: &str,
    ) -> Result<PendingStockCheck, StoreError> {
        check_available(&self.available)?;
        report.validate()?;

        let record = PendingStockCheck::new(
            report,
            snapshot_before,
            submitted_by,
            submitted_by_name,
            self.clock.now(),
        );
        self.records.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_all(&self) -> Result<Vec<PendingStockCheck>, StoreError> {
        check_available(&self.available)?;
        let mut all = self.records();
        all.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn get_pending(&self) -> Result<Vec<PendingStockCheck>, StoreError> {
        check_available(&self.available)?;
        let mut pending: Vec<_> = self
            .records
            .read()
            .values()
            .filter(|r| r.status == ReviewStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn get_history(
        &self,
        filter: Option<ReviewStatus>,
    ) -> Result<Vec<PendingStockCheck>, StoreError> {
        check_available(&self.available)?;
        let mut history: Vec<_> = self
            .records
            .read()
            .values()
            .filter(|r| r.status.is_reviewed())
            .filter(|r| filter.map_or(true, |f| r.status == f))
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.reviewed_at
                .cmp(&a.reviewed_at)
                .then(b.submitted_at.cmp(&a.submitted_at))
        });
        Ok(history)
    }

    async fn get_by_id(&self, id: SubmissionId) -> Result<Option<PendingStockCheck>, StoreError> {
        check_available(&self.available)?;
        Ok(self.records.read().get(&id).cloned())
    }

    async fn approve(
        &self,
        id: SubmissionId,
        reviewer: &Actor,
    ) -> Result<PendingStockCheck, StoreError> {
        self.review(id, ReviewStatus::Approved, reviewer, None)
    }

    async fn discard(
        &self,
        id: SubmissionId,
        reviewer: &Actor,
        reason: Option<String>,
    ) -> Result<PendingStockCheck, StoreError> {
        self.review(id, ReviewStatus::Discarded, reviewer, reason)
    }

    async fn restore(&self, id: SubmissionId) -> Result<PendingStockCheck, StoreError> {
        check_available(&self.available)?;

        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status == ReviewStatus::Pending {
            return Err(StoreError::InvalidState {
                id,
                expected: "approved or discarded",
                actual: record.status,
            });
        }
        if record.reviewed_at.is_none() {
            return Err(StoreError::MissingReviewTime(id));
        }

        record.clear_review();
        Ok(record.clone())
    }
}

/// In-memory [`MachineStore`]
#[derive(Debug)]
pub struct InMemoryMachineStore {
    machines: RwLock<IndexMap<String, Machine>>,
    batches: Mutex<Vec<Vec<MachineStatusWrite>>>,
    fail_next: AtomicBool,
    available: AtomicBool,
}

impl InMemoryMachineStore {
    /// Create store holding machines
    #[must_use]
    pub fn new(machines: Vec<Machine>) -> Self {
        Self {
            machines: RwLock::new(machines.into_iter().map(|m| (m.id.clone(), m)).collect()),
            batches: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
            available: AtomicBool::new(true),
        }
    }

    /// Current machine record
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Machine> {
        self.machines.read().get(id).cloned()
    }

    /// Copy of every machine
    #[must_use]
    pub fn machines(&self) -> Vec<Machine> {
        self.machines.read().values().cloned().collect()
    }

    /// Every batch received, including rejected ones
    #[must_use]
    pub fn received_batches(&self) -> Vec<Vec<MachineStatusWrite>> {
        self.batches.lock().clone()
    }

    /// Reject the next batch
    pub fn fail_next_batch(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Simulate the backend going away or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl MachineStore for InMemoryMachineStore {
    async fn list(&self) -> Result<Vec<Machine>, StoreError> {
        check_available(&self.available)?;
        Ok(self.machines())
    }

    async fn update_batch(&self, writes: Vec<MachineStatusWrite>) -> Result<(), StoreError> {
        self.batches.lock().push(writes.clone());
        check_available(&self.available)?;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("machine batch rejected".to_string()));
        }

        let mut machines = self.machines.write();
        if let Some(missing) = writes.iter().find(|w| !machines.contains_key(&w.id)) {
            return Err(StoreError::EntityNotFound {
                kind: "machine",
                id: missing.id.clone(),
            });
        }
        for write in writes {
            if let Some(machine) = machines.get_mut(&write.id) {
                machine.status = write.status;
            }
        }
        Ok(())
    }
}

/// In-memory [`ItemStore`]
#[derive(Debug)]
pub struct InMemoryItemStore {
    items: RwLock<IndexMap<String, StockItem>>,
    batches: Mutex<Vec<Vec<ItemLocationsWrite>>>,
    fail_next: AtomicBool,
    available: AtomicBool,
}

impl InMemoryItemStore {
    /// Create store holding items
    #[must_use]
    pub fn new(items: Vec<StockItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|i| (i.id.clone(), i)).collect()),
            batches: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
            available: AtomicBool::new(true),
        }
    }

    /// Current item record
    #[must_use]
    pub fn get(&self, id: &str) -> Option<StockItem> {
        self.items.read().get(id).cloned()
    }

    /// Copy of every item
    #[must_use]
    pub fn items(&self) -> Vec<StockItem> {
        self.items.read().values().cloned().collect()
    }

    /// Every batch received, including rejected ones
    #[must_use]
    pub fn received_batches(&self) -> Vec<Vec<ItemLocationsWrite>> {
        self.batches.lock().clone()
    }

    /// Reject the next batch
    pub fn fail_next_batch(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Simulate the backend going away or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list(&self) -> Result<Vec<StockItem>, StoreError> {
        check_available(&self.available)?;
        Ok(self.items())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<StockItem>, StoreError> {
        check_available(&self.available)?;
        let items = self.items.read();
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    async fn update_batch(&self, writes: Vec<ItemLocationsWrite>) -> Result<(), StoreError> {
        self.batches.lock().push(writes.clone());
        check_available(&self.available)?;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("item batch rejected".to_string()));
        }

        let mut items = self.items.write();
        if let Some(missing) = writes.iter().find(|w| !items.contains_key(&w.id)) {
            return Err(StoreError::EntityNotFound {
                kind: "item",
                id: missing.id.clone(),
            });
        }
        for write in writes {
            if let Some(item) = items.get_mut(&write.id) {
                item.locations = write.locations;
                item.updated_at = Some(write.updated_at);
            }
        }
        Ok(())
    }
}

/// In-memory [`SettingsStore`]
#[derive(Debug)]
pub struct InMemorySettingsStore {
    settings: RwLock<StockCheckSettings>,
    available: AtomicBool,
}

impl InMemorySettingsStore {
    /// Create store holding settings
    #[must_use]
    pub fn new(settings: StockCheckSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            available: AtomicBool::new(true),
        }
    }

    /// Copy of the current settings
    #[must_use]
    pub fn settings(&self) -> StockCheckSettings {
        self.settings.read().clone()
    }

    /// Simulate the backend going away or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new(StockCheckSettings::default())
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self) -> Result<StockCheckSettings, StoreError> {
        check_available(&self.available)?;
        Ok(self.settings())
    }

    async fn update(
        &self,
        queue_mode: QueueMode,
        block_duration_minutes: Option<u32>,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<StockCheckSettings, StoreError> {
        check_available(&self.available)?;
        let mut settings = self.settings.write();
        settings.queue_mode = queue_mode;
        settings.block_duration_minutes = block_duration_minutes;
        settings.updated_by = Some(updated_by.to_string());
        settings.updated_at = Some(updated_at);
        Ok(settings.clone())
    }

    async fn record_submission(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        check_available(&self.available)?;
        self.settings.write().last_submission_at = Some(at);
        Ok(())
    }
}
