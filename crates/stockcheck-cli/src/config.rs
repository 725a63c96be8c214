//! CLI configuration file
//!
//! ```toml
//! state_file = "stockcheck.json"
//!
//! [logging]
//! filter = "info"
//! format = "pretty"   # or "json"
//!
//! [review]
//! restore_window_hours = 12
//! require_reason_on_discard = false
//! notify_submitter = true
//! reviewers = ["mgr-1"]   # empty means anyone may review
//! ```

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stockcheck_core::{ReviewConfig, DEFAULT_RESTORE_WINDOW_HOURS};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Longest accepted `restore_window_hours` (one leap year)
pub const MAX_RESTORE_WINDOW_HOURS: u32 = 24 * 366;

/// `[review]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSection {
    /// Restore window in hours, at most [`MAX_RESTORE_WINDOW_HOURS`]
    pub restore_window_hours: u32,
    /// Discard needs a reason
    pub require_reason_on_discard: bool,
    /// Notify submitters of decisions
    pub notify_submitter: bool,
    /// User ids allowed to review; empty allows everyone
    pub reviewers: Vec<String>,
}

impl Default for ReviewSection {
    fn default() -> Self {
        let defaults = ReviewConfig::default();
        Self {
            restore_window_hours: u32::try_from(DEFAULT_RESTORE_WINDOW_HOURS).unwrap_or(12),
            require_reason_on_discard: defaults.require_reason_on_discard,
            notify_submitter: defaults.notify_submitter,
            reviewers: Vec::new(),
        }
    }
}

impl ReviewSection {
    /// Engine configuration for this section
    #[must_use]
    pub fn to_review_config(&self) -> ReviewConfig {
        ReviewConfig::new()
            .with_restore_window(chrono::Duration::hours(i64::from(self.restore_window_hours)))
            .with_required_discard_reason(self.require_reason_on_discard)
            .with_notify_submitter(self.notify_submitter)
    }
}

/// Whole configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON state file
    pub state_file: PathBuf,
    /// Logging
    pub logging: LoggingConfig,
    /// Review behavior
    pub review: ReviewSection,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("stockcheck.json"),
            logging: LoggingConfig::default(),
            review: ReviewSection::default(),
        }
    }
}

impl CliConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Malformed TOML, unknown enum values or out-of-range numbers
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges serde cannot express
    ///
    /// # Errors
    /// `restore_window_hours` above [`MAX_RESTORE_WINDOW_HOURS`]
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.review.restore_window_hours <= MAX_RESTORE_WINDOW_HOURS,
            "review.restore_window_hours must be at most {MAX_RESTORE_WINDOW_HOURS}, got {}",
            self.review.restore_window_hours
        );
        Ok(())
    }

    /// Load from `path`, or defaults when no path is given
    ///
    /// # Errors
    /// Unreadable file or malformed TOML
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}
