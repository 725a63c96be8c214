//! # stockcheck CLI
//!
//! Command-line front end for the stock check review workflow. State lives
//! in one JSON file (inventory, submissions, queue settings and collaborator
//! outboxes); each invocation loads it, runs one command and saves it back
//! when the command changed anything.
//!
//! ```text
//! stockcheck submit --report count.json --user staff-1 --name "Sam"
//! stockcheck pending
//! stockcheck approve 01J... --user mgr-1
//! stockcheck --at 2026-03-01T21:00:00Z restore 01J... --user mgr-1
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod state;

pub use cli::{command, decode, Action, Invocation};
pub use commands::{execute, run, run_with};
pub use config::{CliConfig, LogFormat, LoggingConfig, ReviewSection};
pub use state::{Outbox, StateFile, Workspace};
