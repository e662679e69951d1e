//! In-memory persistence backing the repository, snapshot, and audit traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tapestry_core::{LockVersion, ProjectId, UserId, WorkflowId};
use tapestry_workflow::Workflow;

use crate::audit::{AuditEntry, AuditSink, MemoryAuditSink};
use crate::error::StoreError;
use crate::repo::{Persistence, SaveOutcome, WorkflowRepo};
use crate::snapshot::{MemorySnapshotStore, Snapshot, SnapshotStore};

/// In-memory store implementing the full persistence surface.
///
/// Documents are sharded by id; the active-name uniqueness constraint is a
/// dedicated index keyed by `(project_id, name)`, mirroring a database
/// unique index rather than a lock around lookups.
pub struct MemoryStore {
    workflows: DashMap<WorkflowId, Workflow>,
    names: Mutex<HashMap<(ProjectId, String), WorkflowId>>,
    snapshots: MemorySnapshotStore,
    audit: Arc<dyn AuditSink>,
}

impl MemoryStore {
    /// Create a store with an in-memory audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::with_audit(Arc::new(MemoryAuditSink::new()))
    }

    /// Create a store writing audit records to the given sink.
    #[must_use]
    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            workflows: DashMap::new(),
            names: Mutex::new(HashMap::new()),
            snapshots: MemorySnapshotStore::new(),
            audit,
        }
    }

    /// The audit log.
    #[must_use]
    pub fn audit(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }

    /// Atomically claim a name for a workflow.
    fn claim_name(
        &self,
        project_id: ProjectId,
        name: &str,
        id: WorkflowId,
    ) -> Result<(), StoreError> {
        let mut names = self.names.lock();
        let key = (project_id, name.to_owned());
        match names.get(&key) {
            Some(&holder) if holder != id => Err(StoreError::NameTaken(name.to_owned())),
            _ => {
                names.insert(key, id);
                Ok(())
            }
        }
    }

    fn release_name(&self, project_id: ProjectId, name: &str) {
        self.names.lock().remove(&(project_id, name.to_owned()));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowRepo for MemoryStore {
    async fn insert(&self, workflow: Workflow) -> Result<(), StoreError> {
        self.claim_name(workflow.project_id, &workflow.name, workflow.id)?;
        self.workflows.insert(workflow.id, workflow);
        Ok(())
    }

    async fn find(&self, id: WorkflowId) -> Option<Workflow> {
        self.workflows
            .get(&id)
            .filter(|w| !w.is_deleted())
            .map(|w| w.clone())
    }

    async fn soft_delete(&self, id: WorkflowId) -> Result<Workflow, StoreError> {
        let mut entry = self
            .workflows
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if entry.is_deleted() {
            return Err(StoreError::NotFound(id));
        }
        entry.deleted_at = Some(Utc::now());
        entry.touch();
        let deleted = entry.clone();
        drop(entry);

        self.release_name(deleted.project_id, &deleted.name);
        Ok(deleted)
    }
}

impl SnapshotStore for MemoryStore {
    fn get_or_create_latest(&self, workflow: &Workflow) -> Snapshot {
        self.snapshots.get_or_create_latest(workflow)
    }

    fn get(&self, workflow_id: WorkflowId, lock_version: LockVersion) -> Option<Snapshot> {
        self.snapshots.get(workflow_id, lock_version)
    }

    fn versions(&self, workflow_id: WorkflowId) -> Vec<LockVersion> {
        self.snapshots.versions(workflow_id)
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn commit_initial(
        &self,
        workflow: Workflow,
        actor: UserId,
    ) -> Result<SaveOutcome, StoreError> {
        self.claim_name(workflow.project_id, &workflow.name, workflow.id)?;

        let (snapshot, created) = self.snapshots.get_or_create(&workflow);
        let record = AuditEntry::SnapshotCreated {
            actor,
            workflow_id: workflow.id,
            snapshot_id: snapshot.id,
            lock_version: snapshot.lock_version,
            logged_at: Utc::now(),
        };
        if let Err(e) = self.audit.record(record) {
            if created {
                self.snapshots.remove(workflow.id, workflow.lock_version);
            }
            self.release_name(workflow.project_id, &workflow.name);
            return Err(e);
        }

        tracing::info!(
            workflow_id = %workflow.id,
            lock_version = %workflow.lock_version,
            %actor,
            "workflow created"
        );
        self.workflows.insert(workflow.id, workflow.clone());
        Ok(SaveOutcome { workflow, snapshot })
    }

    async fn commit_save(
        &self,
        mut candidate: Workflow,
        expected: LockVersion,
        actor: UserId,
    ) -> Result<SaveOutcome, StoreError> {
        let id = candidate.id;
        let mut entry = self
            .workflows
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if entry.is_deleted() {
            return Err(StoreError::NotFound(id));
        }

        // Optimistic concurrency: the compare half of the compare-and-swap.
        if entry.lock_version != expected {
            return Err(StoreError::VersionConflict {
                expected,
                actual: entry.lock_version,
            });
        }

        // Fields the caller does not control.
        candidate.project_id = entry.project_id;
        candidate.inserted_at = entry.inserted_at;
        candidate.deleted_at = None;

        let renamed = candidate.name != entry.name;
        if renamed {
            self.claim_name(candidate.project_id, &candidate.name, id)?;
        }

        candidate.lock_version = expected.next();
        candidate.touch();

        let (snapshot, created) = self.snapshots.get_or_create(&candidate);

        let record = AuditEntry::SnapshotCreated {
            actor,
            workflow_id: id,
            snapshot_id: snapshot.id,
            lock_version: snapshot.lock_version,
            logged_at: Utc::now(),
        };
        if let Err(e) = self.audit.record(record) {
            // Audit and snapshot are consistency-linked: undo this commit's
            // writes so neither survives.
            if created {
                self.snapshots.remove(id, candidate.lock_version);
            }
            if renamed {
                self.release_name(candidate.project_id, &candidate.name);
            }
            return Err(e);
        }

        let old_name = entry.name.clone();
        *entry = candidate.clone();
        drop(entry);

        if renamed {
            self.release_name(candidate.project_id, &old_name);
        }

        tracing::info!(
            workflow_id = %id,
            lock_version = %candidate.lock_version,
            %actor,
            "workflow saved"
        );
        Ok(SaveOutcome {
            workflow: candidate,
            snapshot,
        })
    }

    async fn commit_delete(&self, id: WorkflowId, actor: UserId) -> Result<Workflow, StoreError> {
        let mut entry = self
            .workflows
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        if entry.is_deleted() {
            return Err(StoreError::NotFound(id));
        }

        let record = AuditEntry::WorkflowDeleted {
            actor,
            workflow_id: id,
            logged_at: Utc::now(),
        };
        self.audit.record(record)?;

        entry.deleted_at = Some(Utc::now());
        entry.touch();
        let deleted = entry.clone();
        drop(entry);

        self.release_name(deleted.project_id, &deleted.name);
        tracing::info!(workflow_id = %id, %actor, "workflow deleted");
        Ok(deleted)
    }
}
