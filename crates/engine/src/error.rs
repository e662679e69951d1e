//! Engine error taxonomy.
//!
//! Every variant is recoverable at the session boundary: a failed operation
//! leaves the document and all sessions in their prior state.

use tapestry_core::{JobId, LockVersion, UserId, WorkflowId};
use tapestry_store::StoreError;
use tapestry_workflow::WorkflowError;
use thiserror::Error;

/// Errors from the collaboration engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The actor may not perform this action; refused before any validation
    /// runs.
    #[error("you are not authorized to perform this action")]
    Unauthorized,

    /// The session may only view the document right now; the attempted
    /// action is blocked with an action-specific message.
    #[error(transparent)]
    ViewOnly(#[from] ViewOnlyReason),

    /// The document failed validation; nothing was saved.
    #[error("workflow validation failed")]
    Validation(Vec<WorkflowError>),

    /// The save was based on a stale lock version. The caller must reload
    /// and re-apply its edit; stale saves are never merged.
    #[error("document has changed: expected lock version {expected}, found {actual}")]
    Conflict {
        /// The version the edit was based on.
        expected: LockVersion,
        /// The version the document is actually at.
        actual: LockVersion,
    },

    /// The usage limiter denied the trigger activation; the whole save was
    /// aborted and the limiter's message is surfaced verbatim.
    #[error("{message}")]
    Limit {
        /// The limiter's user-facing message.
        message: String,
    },

    /// Switching to the latest version was refused because the focused job
    /// no longer exists there; the snapshot view is retained.
    #[error("the job has been deleted from the workflow")]
    StaleReference {
        /// The job that no longer exists in the live document.
        job_id: JobId,
    },

    /// No snapshot captured for the requested version.
    #[error("no snapshot of workflow {workflow_id} at version {lock_version}")]
    SnapshotNotFound {
        /// The workflow whose history was requested.
        workflow_id: WorkflowId,
        /// The version that has no snapshot.
        lock_version: LockVersion,
    },

    /// No active workflow with the given id.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// The audit sink failed; the save was rolled back.
    #[error("audit record failed: {0}")]
    AuditFailed(String),
}

/// Why a session is restricted to viewing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewOnlyReason {
    /// Another user was present first and holds editability.
    #[error("this workflow is being edited by another user")]
    LockedBy {
        /// The user holding the lock.
        user: UserId,
    },

    /// The same user has the document open in several tabs.
    #[error("you have this workflow open in {sessions} tabs")]
    MultipleTabs {
        /// How many tabs are open.
        sessions: usize,
    },

    /// The session is pinned to a snapshot, where all mutations are refused.
    #[error("you are viewing an older version of this workflow; switch to the latest to edit")]
    SnapshotPinned,
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::NameTaken(name) => Self::Validation(vec![WorkflowError::NameTaken(name)]),
            StoreError::VersionConflict { expected, actual } => {
                Self::Conflict { expected, actual }
            }
            StoreError::SnapshotNotFound {
                workflow_id,
                lock_version,
            } => Self::SnapshotNotFound {
                workflow_id,
                lock_version,
            },
            StoreError::AuditFailed(message) => Self::AuditFailed(message),
        }
    }
}
