//! Submission records and review status

use crate::error::ModelError;
use crate::report::StockCheckReport;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique submission identifier (ULID, sorts by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Ulid);

impl SubmissionId {
    /// Generate new submission ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubmissionId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s.trim())
            .map(Self)
            .map_err(|_| ModelError::InvalidSubmissionId(s.to_string()))
    }
}

/// Review lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Awaiting review
    Pending,
    /// Changes applied
    Approved,
    /// Rejected without changes
    Discarded,
}

impl ReviewStatus {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Discarded => "discarded",
        }
    }

    /// Approved or discarded
    #[inline]
    #[must_use]
    pub fn is_reviewed(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated actor performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
}

impl Actor {
    /// Create new actor
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Build from an auth profile, preferring display name over email
    #[must_use]
    pub fn from_profile(uid: impl Into<String>, display_name: Option<&str>, email: Option<&str>) -> Self {
        let name = display_name
            .filter(|n| !n.trim().is_empty())
            .or(email.filter(|e| !e.trim().is_empty()))
            .unwrap_or("Unknown");
        Self::new(uid, name)
    }
}

/// A stock check submission tracked through review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingStockCheck {
    /// Submission identifier
    pub id: SubmissionId,
    /// Reported observations
    pub report: StockCheckReport,
    /// State captured at submission time
    pub snapshot_before: Snapshot,
    /// Submitter user id
    pub submitted_by: String,
    /// Submitter display name
    pub submitted_by_name: String,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
    /// Review status
    pub status: ReviewStatus,
    /// Reviewer user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    /// Reviewer display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by_name: Option<String>,
    /// Review time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reason given on discard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl PendingStockCheck {
    /// New pending record
    #[must_use]
    pub fn new(
        report: StockCheckReport,
        snapshot_before: Snapshot,
        submitted_by: impl Into<String>,
        submitted_by_name: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            report,
            snapshot_before,
            submitted_by: submitted_by.into(),
            submitted_by_name: submitted_by_name.into(),
            submitted_at,
            status: ReviewStatus::Pending,
            reviewed_by: None,
            reviewed_by_name: None,
            reviewed_at: None,
            rejection_reason: None,
        }
    }

    /// Stamp a review decision. Callers check the status guard first.
    pub fn mark_reviewed(
        &mut self,
        status: ReviewStatus,
        reviewer: &Actor,
        reviewed_at: DateTime<Utc>,
        reason: Option<String>,
    ) {
        self.status = status;
        self.reviewed_by = Some(reviewer.id.clone());
        self.reviewed_by_name = Some(reviewer.name.clone());
        self.reviewed_at = Some(reviewed_at);
        self.rejection_reason = reason;
    }

    /// Return to pending and clear review metadata
    pub fn clear_review(&mut self) {
        self.status = ReviewStatus::Pending;
        self.reviewed_by = None;
        self.reviewed_by_name = None;
        self.reviewed_at = None;
        self.rejection_reason = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> PendingStockCheck {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        PendingStockCheck::new(
            StockCheckReport::new(),
            Snapshot::capture(&[], &[], at),
            "u1",
            "Sam",
            at,
        )
    }

    #[test]
    fn submission_id_parses_back() {
        let id = SubmissionId::new();
        assert_eq!(id.to_string().parse::<SubmissionId>().unwrap(), id);
        assert!("not-a-ulid".parse::<SubmissionId>().is_err());
    }

    #[test]
    fn review_then_clear_resets_metadata() {
        let mut rec = record();
        let reviewer = Actor::new("r1", "Riley");
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

        rec.mark_reviewed(ReviewStatus::Discarded, &reviewer, at, Some("dup".to_string()));
        assert!(rec.status.is_reviewed());
        assert_eq!(rec.reviewed_at, Some(at));
        assert_eq!(rec.rejection_reason.as_deref(), Some("dup"));

        rec.clear_review();
        assert_eq!(rec.status, ReviewStatus::Pending);
        assert!(rec.reviewed_by.is_none());
        assert!(rec.reviewed_by_name.is_none());
        assert!(rec.reviewed_at.is_none());
        assert!(rec.rejection_reason.is_none());
    }

    #[test]
    fn actor_from_profile_falls_back() {
        assert_eq!(Actor::from_profile("u", Some("Ann"), Some("a@x")).name, "Ann");
        assert_eq!(Actor::from_profile("u", Some(""), Some("a@x")).name, "a@x");
        assert_eq!(Actor::from_profile("u", None, None).name, "Unknown");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ReviewStatus::Approved).unwrap(), "\"approved\"");
    }
}
