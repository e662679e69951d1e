//! Edit sessions: one per connected viewer.
//!
//! A session holds a private, cheap-to-discard working copy of the document
//! plus a weak reference to the canonical state (id + lock version). It
//! never holds a pointer into live shared structures; on conflict the
//! working copy is discarded, never merged.

use std::sync::Arc;

use tapestry_core::{JobId, LockVersion, SessionId, UserId, WorkflowId};
use tapestry_eventbus::{EventSubscriber, WorkflowEvent};
use tapestry_presence::{LockState, PresenceTracker};
use tapestry_store::{SnapshotStore, WorkflowRepo};
use tapestry_workflow::{Patch, Workflow, apply_patch};

use crate::error::{EngineError, ViewOnlyReason};
use crate::resolver::ViewMode;

/// One viewer's editing session on a workflow document.
pub struct EditSession {
    session_id: SessionId,
    actor: UserId,
    workflow_id: WorkflowId,
    view: ViewMode,
    working_copy: Workflow,
    base_version: LockVersion,
    lock: LockState,
    deleted_notice: bool,
    subscriber: EventSubscriber,
    repo: Arc<dyn WorkflowRepo>,
    snapshots: Arc<dyn SnapshotStore>,
    presence: Arc<PresenceTracker>,
    closed: bool,
}

impl EditSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        session_id: SessionId,
        actor: UserId,
        workflow: Workflow,
        view: ViewMode,
        subscriber: EventSubscriber,
        repo: Arc<dyn WorkflowRepo>,
        snapshots: Arc<dyn SnapshotStore>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        let workflow_id = workflow.id;
        let base_version = workflow.lock_version;
        let lock = presence.compute_lock(workflow_id, actor);
        Self {
            session_id,
            actor,
            workflow_id,
            view,
            working_copy: workflow,
            base_version,
            lock,
            deleted_notice: false,
            subscriber,
            repo,
            snapshots,
            presence,
            closed: false,
        }
    }

    /// This session's connection id.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The user behind this session.
    #[must_use]
    pub fn actor(&self) -> UserId {
        self.actor
    }

    /// The document this session views.
    #[must_use]
    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// The live-vs-snapshot view this session renders.
    #[must_use]
    pub fn view(&self) -> &ViewMode {
        &self.view
    }

    /// The lock version this session's edits are based on.
    #[must_use]
    pub fn base_version(&self) -> LockVersion {
        self.base_version
    }

    /// The session's private working copy.
    #[must_use]
    pub fn working_copy(&self) -> &Workflow {
        &self.working_copy
    }

    /// The presence lock state as last observed.
    #[must_use]
    pub fn lock_state(&self) -> &LockState {
        &self.lock
    }

    /// Returns `true` when this session may currently edit: live view and
    /// an unlocked document. Saves are still independently re-checked.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.view.is_live() && self.lock.is_editable()
    }

    /// Returns `true` when the session was live and a save elsewhere
    /// re-pinned it to the version it was viewing.
    #[must_use]
    pub fn stale_notice(&self) -> bool {
        matches!(self.view, ViewMode::Pinned { stale: true, .. })
    }

    /// Returns `true` when the document was deleted while this session was
    /// viewing it.
    #[must_use]
    pub fn deleted_notice(&self) -> bool {
        self.deleted_notice
    }

    /// Apply a structural patch to the private working copy.
    ///
    /// Snapshot-pinned sessions refuse all mutations. The patch is applied
    /// all-or-nothing; validation errors leave the working copy untouched.
    /// This is the optimistic client-side application — the engine
    /// re-validates everything against the canonical state at save time.
    pub fn apply(&mut self, patch: &Patch) -> Result<(), EngineError> {
        if !self.view.is_live() {
            return Err(ViewOnlyReason::SnapshotPinned.into());
        }
        let next = apply_patch(&self.working_copy, patch).map_err(EngineError::Validation)?;
        self.working_copy = next;
        Ok(())
    }

    /// Drain pending document events and update the session's view.
    ///
    /// A `DocumentUpdated` with a newer version re-pins a live session to
    /// the snapshot of the version it was viewing, raising the stale notice.
    /// `PresenceChanged` recomputes the lock state.
    pub fn process_events(&mut self) {
        while let Some(event) = self.subscriber.try_recv() {
            match event {
                WorkflowEvent::DocumentUpdated { lock_version, .. } => {
                    if self.view.is_live()
                        && lock_version > self.base_version
                        && let Some(snapshot) =
                            self.snapshots.get(self.workflow_id, self.base_version)
                    {
                        tracing::debug!(
                            workflow_id = %self.workflow_id,
                            session_id = %self.session_id,
                            pinned_to = %self.base_version,
                            latest = %lock_version,
                            "session re-pinned to stale version"
                        );
                        self.view = ViewMode::Pinned {
                            snapshot,
                            stale: true,
                        };
                    }
                }
                WorkflowEvent::PresenceChanged { .. } => {
                    self.lock = self.presence.compute_lock(self.workflow_id, self.actor);
                }
                WorkflowEvent::WorkflowDeleted { .. } => {
                    self.deleted_notice = true;
                }
            }
        }
    }

    /// Switch a pinned session back to the live document.
    ///
    /// Refused with [`EngineError::StaleReference`] when `focused_job` no
    /// longer exists in the live document; the snapshot view is retained.
    pub async fn switch_to_latest(
        &mut self,
        focused_job: Option<JobId>,
    ) -> Result<(), EngineError> {
        let live = self
            .repo
            .find(self.workflow_id)
            .await
            .ok_or(EngineError::NotFound(self.workflow_id))?;

        if let Some(job_id) = focused_job
            && live.job(job_id).is_none()
        {
            return Err(EngineError::StaleReference { job_id });
        }

        self.adopt(live);
        Ok(())
    }

    /// Discard the working copy and re-read the canonical state.
    ///
    /// This is the recovery path after a [`EngineError::Conflict`]: the
    /// user's pending edit is dropped and must be re-applied against the
    /// refreshed document.
    pub async fn refresh(&mut self) -> Result<(), EngineError> {
        let live = self
            .repo
            .find(self.workflow_id)
            .await
            .ok_or(EngineError::NotFound(self.workflow_id))?;
        self.adopt(live);
        Ok(())
    }

    /// Report liveness to the presence tracker.
    pub fn heartbeat(&self) {
        self.presence.heartbeat(self.workflow_id, self.session_id);
    }

    /// Leave the document (graceful disconnect).
    pub fn close(&mut self) {
        if !self.closed {
            self.presence.leave(self.workflow_id, self.session_id);
            self.closed = true;
        }
    }

    pub(crate) fn adopt(&mut self, workflow: Workflow) {
        self.base_version = workflow.lock_version;
        self.view = ViewMode::Live {
            lock_version: workflow.lock_version,
        };
        self.working_copy = workflow;
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        // Dropping without close() is an unclean disconnect as far as the
        // caller is concerned, but the presence entry can still be released
        // directly instead of waiting for the reaper.
        self.close();
    }
}
