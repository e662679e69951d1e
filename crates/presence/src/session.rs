//! Presence session entries and lock state.

use chrono::{DateTime, Utc};
use tapestry_core::{SessionId, UserId, WorkflowId};

/// One connected viewer session on a document.
///
/// Ephemeral: created on connect, removed on disconnect or liveness timeout,
/// never persisted or versioned. A session holds only the document's id —
/// never a pointer into the document itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSession {
    /// Unique id of this connection (one per browser tab).
    pub session_id: SessionId,
    /// The user behind the connection.
    pub user_id: UserId,
    /// The document being viewed.
    pub workflow_id: WorkflowId,
    /// Monotonic join order, process-wide. The session with the lowest
    /// sequence among a document's live sessions holds editability; this is
    /// the deterministic tie-break for near-simultaneous joins.
    pub join_seq: u64,
    /// Last proof of liveness. Sessions that stop heartbeating are evicted.
    pub last_seen_at: DateTime<Utc>,
}

/// The single-writer lock state of a document, from one user's perspective.
///
/// This is a presence-based mutual-exclusion lock, not a permission check:
/// whoever was present first holds editability, regardless of role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// The requesting user may edit (they hold the lock, one session).
    Unlocked,
    /// Another user was present first; all of their peers are view-only.
    LockedByOther {
        /// The user holding editability.
        user: UserId,
    },
    /// The requesting user holds the lock but has the document open in
    /// several tabs, so editing is blocked until the extras close.
    SelfMultiSession {
        /// How many concurrent sessions the user has open.
        sessions: usize,
    },
}

impl LockState {
    /// Returns `true` if the requesting user may edit.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Unlocked)
    }
}
