//! Immutable point-in-time captures of workflow documents.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tapestry_core::{JobId, LockVersion, SnapshotId, WorkflowId};
use tapestry_workflow::{Edge, Job, Trigger, Workflow};

/// An immutable capture of a workflow at a specific lock version.
///
/// Snapshots are never mutated after creation. Runs reference them (by id)
/// for provenance but never own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable identifier for this capture.
    pub id: SnapshotId,
    /// The workflow this snapshot was taken from.
    pub workflow_id: WorkflowId,
    /// The workflow's name at capture time.
    pub name: String,
    /// The workflow's lock version at capture time.
    pub lock_version: LockVersion,
    /// The jobs as they existed at capture.
    pub jobs: Vec<Job>,
    /// The triggers as they existed at capture.
    pub triggers: Vec<Trigger>,
    /// The edges as they existed at capture.
    pub edges: Vec<Edge>,
    /// When the capture was made.
    pub inserted_at: DateTime<Utc>,
}

impl Snapshot {
    /// Capture the current state of a workflow.
    #[must_use]
    pub fn capture(workflow: &Workflow) -> Self {
        Self {
            id: SnapshotId::v4(),
            workflow_id: workflow.id,
            name: workflow.name.clone(),
            lock_version: workflow.lock_version,
            jobs: workflow.jobs.clone(),
            triggers: workflow.triggers.clone(),
            edges: workflow.edges.clone(),
            inserted_at: Utc::now(),
        }
    }

    /// Look up a job as it existed at capture time.
    #[must_use]
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }
}

/// Access to the immutable snapshot history of workflows.
pub trait SnapshotStore: Send + Sync {
    /// Get the snapshot for the workflow's current lock version, creating it
    /// if this version has not been captured yet.
    ///
    /// Idempotent per `(workflow_id, lock_version)`: concurrent callers for
    /// the same version all receive the same snapshot, enforced by the
    /// store's uniqueness key rather than a lock around the save path.
    fn get_or_create_latest(&self, workflow: &Workflow) -> Snapshot;

    /// Fetch the snapshot of a workflow at a specific version.
    fn get(&self, workflow_id: WorkflowId, lock_version: LockVersion) -> Option<Snapshot>;

    /// All captured versions of a workflow, ascending.
    fn versions(&self, workflow_id: WorkflowId) -> Vec<LockVersion>;
}

/// In-memory snapshot store keyed by `(workflow_id, lock_version)`.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<HashMap<(WorkflowId, u64), Snapshot>>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the snapshot for the workflow's current version,
    /// reporting whether this call created it.
    pub(crate) fn get_or_create(&self, workflow: &Workflow) -> (Snapshot, bool) {
        let mut inner = self.inner.lock();
        let key = (workflow.id, workflow.lock_version.value());
        match inner.get(&key) {
            Some(existing) => (existing.clone(), false),
            None => {
                let snapshot = Snapshot::capture(workflow);
                inner.insert(key, snapshot.clone());
                (snapshot, true)
            }
        }
    }

    /// Remove a capture. Only used to undo a snapshot created inside a save
    /// transaction that subsequently failed.
    pub(crate) fn remove(&self, workflow_id: WorkflowId, lock_version: LockVersion) {
        self.inner
            .lock()
            .remove(&(workflow_id, lock_version.value()));
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get_or_create_latest(&self, workflow: &Workflow) -> Snapshot {
        self.get_or_create(workflow).0
    }

    fn get(&self, workflow_id: WorkflowId, lock_version: LockVersion) -> Option<Snapshot> {
        self.inner
            .lock()
            .get(&(workflow_id, lock_version.value()))
            .cloned()
    }

    fn versions(&self, workflow_id: WorkflowId) -> Vec<LockVersion> {
        let mut versions: Vec<LockVersion> = self
            .inner
            .lock()
            .keys()
            .filter(|(id, _)| *id == workflow_id)
            .map(|&(_, v)| LockVersion::new(v))
            .collect();
        versions.sort_unstable();
        versions
    }
}
