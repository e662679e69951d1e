//! Persistence boundary traits.

use async_trait::async_trait;
use tapestry_core::{LockVersion, UserId, WorkflowId};
use tapestry_workflow::Workflow;

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Canonical storage of workflow documents.
///
/// The repository is the single source of truth; sessions hold cheap,
/// discardable copies and re-read through it.
#[async_trait]
pub trait WorkflowRepo: Send + Sync {
    /// Insert a new workflow.
    ///
    /// Fails with [`StoreError::NameTaken`] if an active workflow in the
    /// same project already uses the name.
    async fn insert(&self, workflow: Workflow) -> Result<(), StoreError>;

    /// Fetch an active (non-deleted) workflow.
    async fn find(&self, id: WorkflowId) -> Option<Workflow>;

    /// Soft-delete a workflow, freeing its name for reuse.
    ///
    /// Returns the deleted document.
    async fn soft_delete(&self, id: WorkflowId) -> Result<Workflow, StoreError>;
}

/// The result of a committed save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// The persisted document at its new lock version.
    pub workflow: Workflow,
    /// The snapshot capturing the new version.
    pub snapshot: Snapshot,
}

/// The atomic multi-write unit behind a save.
///
/// One commit performs, transactionally: the compare-and-swap on the
/// document's lock version, the write of the new document state, the
/// idempotent snapshot capture for the new version, and the audit record.
/// Any failure — including an audit failure — rolls the whole commit back;
/// there are no partial writes.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Insert a brand-new workflow, capture its initial snapshot, and record
    /// the audit entry, atomically.
    async fn commit_initial(
        &self,
        workflow: Workflow,
        actor: UserId,
    ) -> Result<SaveOutcome, StoreError>;

    /// Commit a validated candidate document.
    ///
    /// `expected` is the lock version the caller based its edit on. If the
    /// stored document has moved past it, the commit fails with
    /// [`StoreError::VersionConflict`] and the caller must reload and
    /// re-apply.
    async fn commit_save(
        &self,
        candidate: Workflow,
        expected: LockVersion,
        actor: UserId,
    ) -> Result<SaveOutcome, StoreError>;

    /// Soft-delete a workflow and record the audit entry, atomically.
    ///
    /// Returns the deleted document.
    async fn commit_delete(&self, id: WorkflowId, actor: UserId) -> Result<Workflow, StoreError>;
}
