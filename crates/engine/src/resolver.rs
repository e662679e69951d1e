//! Live-vs-snapshot version resolution.

use std::sync::Arc;

use tapestry_core::{JobId, LockVersion, WorkflowId};
use tapestry_store::{Snapshot, SnapshotStore};
use tapestry_workflow::Workflow;

use crate::error::EngineError;

/// What a session is looking at: the live document or a pinned snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    /// The current, mutable, latest-version state.
    Live {
        /// The live document's lock version at resolution time.
        lock_version: LockVersion,
    },
    /// An immutable capture of an older version. All mutations are refused.
    Pinned {
        /// The snapshot being rendered.
        snapshot: Snapshot,
        /// Set when the session was live and a save elsewhere re-pinned it,
        /// driving the "no longer on the latest version" notice.
        stale: bool,
    },
}

impl ViewMode {
    /// Returns `true` for the live document view.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }

    /// The version this view renders.
    #[must_use]
    pub fn lock_version(&self) -> LockVersion {
        match self {
            Self::Live { lock_version } => *lock_version,
            Self::Pinned { snapshot, .. } => snapshot.lock_version,
        }
    }
}

/// Decides whether a viewer sees the live document or a pinned snapshot, and
/// guards the switch back to latest.
pub struct VersionResolver {
    snapshots: Arc<dyn SnapshotStore>,
}

impl VersionResolver {
    /// Create a resolver over the given snapshot history.
    #[must_use]
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { snapshots }
    }

    /// Resolve a requested version against the live document.
    ///
    /// An absent version, or one equal to the document's current lock
    /// version, yields the live view (editable, subject to the presence lock
    /// and authorization). Any other version yields a pinned snapshot view,
    /// unconditionally read-only.
    pub fn resolve(
        &self,
        workflow: &Workflow,
        requested: Option<LockVersion>,
    ) -> Result<ViewMode, EngineError> {
        match requested {
            None => Ok(ViewMode::Live {
                lock_version: workflow.lock_version,
            }),
            Some(version) if version == workflow.lock_version => Ok(ViewMode::Live {
                lock_version: workflow.lock_version,
            }),
            Some(version) => self
                .snapshots
                .get(workflow.id, version)
                .map(|snapshot| ViewMode::Pinned {
                    snapshot,
                    stale: false,
                })
                .ok_or(EngineError::SnapshotNotFound {
                    workflow_id: workflow.id,
                    lock_version: version,
                }),
        }
    }

    /// Guard for switching a pinned session to the live document.
    ///
    /// Refused when the job the user is focused on no longer exists in the
    /// live document; the caller keeps its snapshot view.
    pub fn check_switch_to_latest(
        &self,
        live: &Workflow,
        focused_job: Option<JobId>,
    ) -> Result<(), EngineError> {
        if let Some(job_id) = focused_job
            && live.job(job_id).is_none()
        {
            return Err(EngineError::StaleReference { job_id });
        }
        Ok(())
    }

    /// The snapshot of a document's given version, for re-pinning a live
    /// session after a save elsewhere.
    #[must_use]
    pub fn snapshot_of(&self, workflow_id: WorkflowId, version: LockVersion) -> Option<Snapshot> {
        self.snapshots.get(workflow_id, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapestry_core::ProjectId;
    use tapestry_store::MemorySnapshotStore;
    use tapestry_workflow::{Job, WorkflowBuilder};

    fn workflow() -> Workflow {
        WorkflowBuilder::new(ProjectId::v4(), "wf")
            .add_job(Job::new(JobId::v4(), "a", "adaptor").with_body("fn(s => s)"))
            .build()
            .unwrap()
    }

    fn resolver_with(workflow: &Workflow) -> (Arc<MemorySnapshotStore>, VersionResolver) {
        let store = Arc::new(MemorySnapshotStore::new());
        store.get_or_create_latest(workflow);
        let resolver = VersionResolver::new(Arc::clone(&store) as Arc<dyn SnapshotStore>);
        (store, resolver)
    }

    #[test]
    fn absent_version_resolves_live() {
        let workflow = workflow();
        let (_store, resolver) = resolver_with(&workflow);

        let mode = resolver.resolve(&workflow, None).unwrap();
        assert_eq!(
            mode,
            ViewMode::Live {
                lock_version: workflow.lock_version
            }
        );
        assert!(mode.is_live());
    }

    #[test]
    fn current_version_resolves_live() {
        let workflow = workflow();
        let (_store, resolver) = resolver_with(&workflow);

        let mode = resolver
            .resolve(&workflow, Some(workflow.lock_version))
            .unwrap();
        assert!(mode.is_live());
    }

    #[test]
    fn older_version_resolves_pinned_snapshot() {
        let mut workflow = workflow();
        let (store, resolver) = resolver_with(&workflow);

        // The document moves on to version 2.
        workflow.lock_version = workflow.lock_version.next();
        store.get_or_create_latest(&workflow);

        let mode = resolver
            .resolve(&workflow, Some(LockVersion::INITIAL))
            .unwrap();
        match &mode {
            ViewMode::Pinned { snapshot, stale } => {
                assert_eq!(snapshot.lock_version, LockVersion::INITIAL);
                assert!(!stale);
            }
            other => panic!("expected pinned view, got {other:?}"),
        }
        assert!(!mode.is_live());
        assert_eq!(mode.lock_version(), LockVersion::INITIAL);
    }

    #[test]
    fn unknown_version_is_an_error() {
        let workflow = workflow();
        let (_store, resolver) = resolver_with(&workflow);

        let err = resolver
            .resolve(&workflow, Some(LockVersion::new(9)))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::SnapshotNotFound {
                workflow_id: workflow.id,
                lock_version: LockVersion::new(9),
            }
        );
    }

    #[test]
    fn switch_with_no_focus_is_allowed() {
        let workflow = workflow();
        let (_store, resolver) = resolver_with(&workflow);
        assert!(resolver.check_switch_to_latest(&workflow, None).is_ok());
    }

    #[test]
    fn switch_with_live_focus_is_allowed() {
        let workflow = workflow();
        let (_store, resolver) = resolver_with(&workflow);
        let job_id = workflow.jobs[0].id;
        assert!(
            resolver
                .check_switch_to_latest(&workflow, Some(job_id))
                .is_ok()
        );
    }

    #[test]
    fn switch_with_deleted_focus_is_refused() {
        let workflow = workflow();
        let (_store, resolver) = resolver_with(&workflow);
        let ghost = JobId::v4();
        let err = resolver
            .check_switch_to_latest(&workflow, Some(ghost))
            .unwrap_err();
        assert_eq!(err, EngineError::StaleReference { job_id: ghost });
    }
}
