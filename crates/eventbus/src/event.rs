//! Collaboration lifecycle events.

use serde::{Deserialize, Serialize};
use tapestry_core::{LockVersion, UserId, WorkflowId};

/// An event on a document topic.
///
/// These events are projections for connected sessions, **not** the source
/// of truth: a session that misses one recovers by re-reading the canonical
/// persisted state. Saves are independently guarded by optimistic
/// concurrency, so delivery may be eventually consistent without risking a
/// lost update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A new version of the document was saved.
    DocumentUpdated {
        /// The workflow that changed.
        workflow_id: WorkflowId,
        /// The lock version produced by the save.
        lock_version: LockVersion,
    },
    /// The set of sessions viewing the document changed.
    PresenceChanged {
        /// The workflow whose presence changed.
        workflow_id: WorkflowId,
    },
    /// The document was soft-deleted.
    WorkflowDeleted {
        /// The workflow that was deleted.
        workflow_id: WorkflowId,
        /// Who deleted it.
        actor: UserId,
    },
}

impl WorkflowEvent {
    /// The document topic this event belongs to.
    #[must_use]
    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            Self::DocumentUpdated { workflow_id, .. }
            | Self::PresenceChanged { workflow_id }
            | Self::WorkflowDeleted { workflow_id, .. } => *workflow_id,
        }
    }
}
