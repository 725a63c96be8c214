//! JSON state file and the workspace built from it
//!
//! The state file holds the live inventory, every submission, the queue
//! settings and the outboxes of the post-commit collaborators. A
//! [`Workspace`] loads it into in-memory stores, runs one command, and
//! writes the result back.

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use stockcheck_core::{
    AllowAll, AuditEntry, AuditHook, AuditLog, HookError, MaintenanceHook, MaintenanceSink,
    MaintenanceTask, Notification, Notifier, ReviewEngine, ReviewPermission, ReviewerList,
    SubmissionGate,
};
use stockcheck_model::{Machine, PendingStockCheck, StockCheckSettings, StockItem};
use stockcheck_store::{
    Clock, InMemoryItemStore, InMemoryMachineStore, InMemorySettingsStore, InMemorySubmissionStore,
    StoreBatchMutator,
};

use crate::config::CliConfig;

/// On-disk state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateFile {
    /// Live machines
    pub machines: Vec<Machine>,
    /// Live items
    pub items: Vec<StockItem>,
    /// Every submission
    pub submissions: Vec<PendingStockCheck>,
    /// Queue settings
    pub settings: StockCheckSettings,
    /// Notifications sent
    pub notifications: Vec<Notification>,
    /// Audit entries written
    pub audit_log: Vec<AuditEntry>,
    /// Maintenance tasks raised
    pub maintenance_tasks: Vec<MaintenanceTask>,
}

impl StateFile {
    /// Read from `path`; a missing file is an empty state
    ///
    /// # Errors
    /// Unreadable file or malformed JSON
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "State file not found, starting empty");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read state file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid state file {}", path.display()))
    }

    /// Write to `path` as pretty JSON
    ///
    /// # Errors
    /// Unwritable path
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to encode state")?;
        std::fs::write(path, text).with_context(|| format!("failed to write state file {}", path.display()))
    }
}

/// Append-only collaborator sink persisted with the state file
#[derive(Debug, Default)]
pub struct Outbox<T> {
    entries: Mutex<Vec<T>>,
}

impl<T: Clone> Outbox<T> {
    /// Create outbox holding earlier entries
    #[must_use]
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Copy of all entries
    #[must_use]
    pub fn entries(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    fn push(&self, entry: T) {
        self.entries.lock().push(entry);
    }
}

#[async_trait]
impl Notifier for Outbox<Notification> {
    async fn create(&self, notification: Notification) -> Result<(), HookError> {
        self.push(notification);
        Ok(())
    }
}

#[async_trait]
impl AuditLog for Outbox<AuditEntry> {
    async fn log_action(&self, entry: AuditEntry) -> Result<(), HookError> {
        self.push(entry);
        Ok(())
    }
}

#[async_trait]
impl MaintenanceSink for Outbox<MaintenanceTask> {
    async fn create_task(&self, task: MaintenanceTask) -> Result<(), HookError> {
        self.push(task);
        Ok(())
    }
}

/// Stores, collaborators and engine for one CLI invocation
pub struct Workspace {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Live machines
    pub machines: Arc<InMemoryMachineStore>,
    /// Live items
    pub items: Arc<InMemoryItemStore>,
    /// Submissions
    pub submissions: Arc<InMemorySubmissionStore>,
    /// Queue settings
    pub settings: Arc<InMemorySettingsStore>,
    /// Submission gate
    pub gate: Arc<SubmissionGate>,
    /// Review engine
    pub engine: ReviewEngine,
    notifications: Arc<Outbox<Notification>>,
    audit: Arc<Outbox<AuditEntry>>,
    maintenance: Arc<Outbox<MaintenanceTask>>,
}

impl Workspace {
    /// Wire a workspace around loaded state
    #[must_use]
    pub fn new(state: StateFile, config: &CliConfig, clock: Arc<dyn Clock>) -> Self {
        let machines = Arc::new(InMemoryMachineStore::new(state.machines));
        let items = Arc::new(InMemoryItemStore::new(state.items));
        let submissions = Arc::new(InMemorySubmissionStore::with_records(clock.clone(), state.submissions));
        let settings = Arc::new(InMemorySettingsStore::new(state.settings));
        let notifications = Arc::new(Outbox::new(state.notifications));
        let audit = Arc::new(Outbox::new(state.audit_log));
        let maintenance = Arc::new(Outbox::new(state.maintenance_tasks));

        let permission: Arc<dyn ReviewPermission> = if config.review.reviewers.is_empty() {
            Arc::new(AllowAll)
        } else {
            Arc::new(ReviewerList::new(config.review.reviewers.iter().cloned()))
        };

        let mutator = Arc::new(StoreBatchMutator::new(machines.clone(), items.clone(), clock.clone()));
        let gate = Arc::new(SubmissionGate::new(settings.clone(), submissions.clone(), clock.clone()));
        let engine = ReviewEngine::new(submissions.clone(), mutator, clock.clone())
            .with_config(config.review.to_review_config())
            .with_gate(gate.clone())
            .with_permission(permission)
            .with_notifier(notifications.clone())
            .with_hook(Arc::new(AuditHook::new(audit.clone())))
            .with_hook(Arc::new(MaintenanceHook::new(maintenance.clone())));

        Self {
            clock,
            machines,
            items,
            submissions,
            settings,
            gate,
            engine,
            notifications,
            audit,
            maintenance,
        }
    }

    /// Current state, ready to save
    #[must_use]
    pub fn to_state(&self) -> StateFile {
        StateFile {
            machines: self.machines.machines(),
            items: self.items.items(),
            submissions: self.submissions.records(),
            settings: self.settings.settings(),
            notifications: self.notifications.entries(),
            audit_log: self.audit.entries(),
            maintenance_tasks: self.maintenance.entries(),
        }
    }
}
