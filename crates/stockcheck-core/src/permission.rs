//! Reviewer capability check
//!
//! How a capability is granted is outside this crate; the engine only asks.

use std::collections::HashSet;
use std::fmt::Debug;
use stockcheck_model::Actor;

/// Opaque "may review stock checks" capability
pub trait ReviewPermission: Send + Sync + Debug {
    /// Whether `actor` may approve, discard or restore
    fn can_review(&self, actor: &Actor) -> bool;
}

/// Every actor may review
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ReviewPermission for AllowAll {
    #[inline]
    fn can_review(&self, _actor: &Actor) -> bool {
        true
    }
}

/// Only listed user ids may review
#[derive(Debug, Clone, Default)]
pub struct ReviewerList {
    ids: HashSet<String>,
}

impl ReviewerList {
    /// Create from user ids
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl ReviewPermission for ReviewerList {
    fn can_review(&self, actor: &Actor) -> bool {
        self.ids.contains(&actor.id)
    }
}
