//! Testing utilities for the stock check workspace
//!
//! Shared fixtures, recording collaborators and a fully wired engine harness.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stockcheck_core::{
    AuditEntry, AuditHook, AuditLog, HookError, MaintenanceHook, MaintenanceSink, MaintenanceTask,
    Notification, Notifier, ReviewConfig, ReviewEngine, SubmissionGate,
};
use stockcheck_model::{Actor, Machine, MachineStatus, StockCheckSettings, StockItem};
use stockcheck_store::{
    InMemoryItemStore, InMemoryMachineStore, InMemorySettingsStore, InMemorySubmissionStore,
    ManualClock, StoreBatchMutator,
};

/// Fixed start of every test timeline
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn staff() -> Actor {
    Actor::new("staff-1", "Sam Staff")
}

pub fn reviewer() -> Actor {
    Actor::new("mgr-1", "Riley Manager")
}

/// Two online cranes
pub fn machines() -> Vec<Machine> {
    vec![
        Machine::new("m1", "Crane A", MachineStatus::Online),
        Machine::new("m2", "Crane B", MachineStatus::Online),
    ]
}

/// Bear (10, in m1), Duck (4, in m2), Frog (6, storage)
pub fn items() -> Vec<StockItem> {
    vec![
        StockItem::new("i1", "Bear", 10).assigned_to("m1"),
        StockItem::new("i2", "Duck", 4).assigned_to("m2"),
        StockItem::new("i3", "Frog", 6),
    ]
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn create(&self, notification: Notification) -> Result<(), HookError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HookError::unavailable("notifier", "switched off"));
        }
        self.sent.lock().push(notification);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditLog {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl AuditLog for RecordingAuditLog {
    async fn log_action(&self, entry: AuditEntry) -> Result<(), HookError> {
        self.entries.lock().push(entry);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingMaintenanceSink {
    tasks: Mutex<Vec<MaintenanceTask>>,
}

impl RecordingMaintenanceSink {
    pub fn tasks(&self) -> Vec<MaintenanceTask> {
        self.tasks.lock().clone()
    }
}

#[async_trait]
impl MaintenanceSink for RecordingMaintenanceSink {
    async fn create_task(&self, task: MaintenanceTask) -> Result<(), HookError> {
        self.tasks.lock().push(task);
        Ok(())
    }
}

/// Engine wired to in-memory stores and recording collaborators
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub machines: Arc<InMemoryMachineStore>,
    pub items: Arc<InMemoryItemStore>,
    pub submissions: Arc<InMemorySubmissionStore>,
    pub settings: Arc<InMemorySettingsStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAuditLog>,
    pub maintenance: Arc<RecordingMaintenanceSink>,
    pub engine: ReviewEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(machines(), items(), StockCheckSettings::default(), ReviewConfig::default())
    }

    pub fn with_settings(settings: StockCheckSettings) -> Self {
        Self::with(machines(), items(), settings, ReviewConfig::default())
    }

    pub fn with(
        machines: Vec<Machine>,
        items: Vec<StockItem>,
        settings: StockCheckSettings,
        config: ReviewConfig,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let machines = Arc::new(InMemoryMachineStore::new(machines));
        let items = Arc::new(InMemoryItemStore::new(items));
        let submissions = Arc::new(InMemorySubmissionStore::new(clock.clone()));
        let settings = Arc::new(InMemorySettingsStore::new(settings));
        let notifier = Arc::new(RecordingNotifier::default());
        let audit = Arc::new(RecordingAuditLog::default());
        let maintenance = Arc::new(RecordingMaintenanceSink::default());

        let mutator = Arc::new(StoreBatchMutator::new(machines.clone(), items.clone(), clock.clone()));
        let gate = SubmissionGate::new(settings.clone(), submissions.clone(), clock.clone());
        let engine = ReviewEngine::new(submissions.clone(), mutator, clock.clone())
            .with_config(config)
            .with_gate(Arc::new(gate))
            .with_notifier(notifier.clone())
            .with_hook(Arc::new(AuditHook::new(audit.clone())))
            .with_hook(Arc::new(MaintenanceHook::new(maintenance.clone())));

        Self {
            clock,
            machines,
            items,
            submissions,
            settings,
            notifier,
            audit,
            maintenance,
            engine,
        }
    }

    /// Live machines and items, as a caller would pass them to `submit`
    pub fn live(&self) -> (Vec<Machine>, Vec<StockItem>) {
        (self.machines.machines(), self.items.items())
    }

    pub fn machine_status(&self, id: &str) -> MachineStatus {
        self.machines.get(id).unwrap().status
    }

    pub fn item_quantity(&self, id: &str) -> i64 {
        self.items.get(id).unwrap().quantity()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
