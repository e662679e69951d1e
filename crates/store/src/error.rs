//! Store-layer error types.

use tapestry_core::{LockVersion, WorkflowId};
use thiserror::Error;

/// Errors from the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No active workflow with the given id.
    #[error("workflow not found: {0}")]
    NotFound(WorkflowId),

    /// Another active workflow in the project already uses this name.
    #[error("a workflow named \"{0}\" already exists in this project")]
    NameTaken(String),

    /// The save was based on a stale lock version (optimistic concurrency).
    #[error("document has changed: expected lock version {expected}, found {actual}")]
    VersionConflict {
        /// The version the caller based its edit on.
        expected: LockVersion,
        /// The version the document is actually at.
        actual: LockVersion,
    },

    /// No snapshot captured for the requested version.
    #[error("no snapshot of workflow {workflow_id} at version {lock_version}")]
    SnapshotNotFound {
        /// The workflow whose history was queried.
        workflow_id: WorkflowId,
        /// The version that has no snapshot.
        lock_version: LockVersion,
    },

    /// The audit sink rejected the record; the save rolls back.
    #[error("audit record failed: {0}")]
    AuditFailed(String),
}
