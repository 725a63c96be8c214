//! Stock check data model
//!
//! The typed records that flow through the review workflow:
//! - [`StockCheckReport`]: what a staff member observed
//! - [`Snapshot`]: the frozen machine/item state at submission time
//! - [`PendingStockCheck`]: a report plus its snapshot, tracked through review
//! - [`StockCheckSettings`]: the queue policy consulted before submission
//!
//! Live inventory records ([`Machine`], [`StockItem`]) are owned by external
//! stores; this crate only describes their shape and the single quantity
//! convention used to read and rewrite item locations.

pub mod error;
pub mod inventory;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod submission;

pub use error::ModelError;
pub use inventory::{
    from_single_quantity, to_single_quantity, LocationQuantity, Machine, MachineStatus, StockItem,
    DEFAULT_LOCATION_NAME,
};
pub use report::{ItemCheckEntry, MachineCheck, ReportStats, StockCheckReport};
pub use settings::{BlockStatus, QueueMode, StockCheckSettings};
pub use snapshot::{ItemSnapshot, MachineSnapshot, Snapshot};
pub use submission::{Actor, PendingStockCheck, ReviewStatus, SubmissionId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
