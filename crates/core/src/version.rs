//! Monotonic optimistic-concurrency counter for workflow documents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lock version of a workflow document.
///
/// Strictly increases by 1 on every successful persisted save, with no gaps
/// or repeats. A save performed against a stale lock version is rejected by
/// the persistence layer (compare-and-swap), never silently merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockVersion(u64);

impl LockVersion {
    /// The version a freshly created workflow starts at.
    pub const INITIAL: Self = Self(1);

    /// Wrap a raw version number.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The version produced by the next successful save.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The raw version number.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LockVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
