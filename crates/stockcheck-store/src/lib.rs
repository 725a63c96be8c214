//! Stock check storage contracts
//!
//! Narrow, intention-revealing operations over the shared mutable resources
//! of the review workflow:
//! - [`SubmissionStore`]: owns submission records and their status guard
//! - [`MachineStore`] / [`ItemStore`]: externally owned live inventory
//! - [`BatchMutator`]: stateless applier of grouped writes to inventory
//! - [`SettingsStore`]: queue settings consulted by the submission gate
//!
//! The [`memory`] module provides in-process backends for all of them.

pub mod clock;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod mutator;
pub mod settings;
pub mod submission;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BatchMutationError, BatchTarget, StoreError};
pub use inventory::{ItemLocationsWrite, ItemStore, MachineStatusWrite, MachineStore};
pub use memory::{
    InMemoryItemStore, InMemoryMachineStore, InMemorySettingsStore, InMemorySubmissionStore,
};
pub use mutator::{BatchMutator, ItemQuantityUpdate, MachineUpdate, StoreBatchMutator};
pub use settings::SettingsStore;
pub use submission::SubmissionStore;
