//! The mutation engine: the save pipeline and session lifecycle.

use std::sync::Arc;

use tapestry_core::{LockVersion, SessionId, UserId, WorkflowId};
use tapestry_eventbus::{EventBus, WorkflowEvent};
use tapestry_presence::{LockState, PresenceTracker};
use tapestry_store::{
    MemoryStore, Persistence, SaveOutcome, Snapshot, SnapshotStore, WorkflowRepo,
};
use tapestry_workflow::{Workflow, validate_workflow};

use crate::auth::{AllowAll, Authorizer, WorkflowAction};
use crate::error::{EngineError, ViewOnlyReason};
use crate::limiter::{Unlimited, UsageLimiter};
use crate::resolver::VersionResolver;
use crate::session::EditSession;

/// The collaboration engine.
///
/// Coordinates sessions, presence, versioning, and persistence for workflow
/// documents:
///
/// 1. Opening a session resolves live-vs-snapshot mode and joins presence
/// 2. Patches apply to the session's private working copy
/// 3. Saving runs the guarded pipeline: authorization, presence lock,
///    validation, usage limits, then the atomic commit
/// 4. A successful save broadcasts the new version so every other session
///    re-pins to the snapshot it was viewing
pub struct CollabEngine {
    repo: Arc<dyn WorkflowRepo>,
    persistence: Arc<dyn Persistence>,
    snapshots: Arc<dyn SnapshotStore>,
    bus: Arc<EventBus>,
    presence: Arc<PresenceTracker>,
    resolver: VersionResolver,
    authorizer: Arc<dyn Authorizer>,
    limiter: Arc<dyn UsageLimiter>,
}

impl CollabEngine {
    /// Create an engine over the given storage and messaging components,
    /// with a permit-everything authorizer and no usage limits.
    #[must_use]
    pub fn new(
        repo: Arc<dyn WorkflowRepo>,
        persistence: Arc<dyn Persistence>,
        snapshots: Arc<dyn SnapshotStore>,
        bus: Arc<EventBus>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        let resolver = VersionResolver::new(Arc::clone(&snapshots));
        Self {
            repo,
            persistence,
            snapshots,
            bus,
            presence,
            resolver,
            authorizer: Arc::new(AllowAll),
            limiter: Arc::new(Unlimited),
        }
    }

    /// Create a fully in-memory engine, returning the backing store for
    /// direct inspection (snapshots, audit log).
    #[must_use]
    pub fn in_memory() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(EventBus::new());
        let presence = Arc::new(PresenceTracker::new(Arc::clone(&bus)));
        let engine = Self::new(
            Arc::clone(&store) as Arc<dyn WorkflowRepo>,
            Arc::clone(&store) as Arc<dyn Persistence>,
            Arc::clone(&store) as Arc<dyn SnapshotStore>,
            bus,
            presence,
        );
        (engine, store)
    }

    /// Replace the authorization check.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Replace the usage limiter.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<dyn UsageLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// The event bus carrying document topics.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The presence tracker.
    #[must_use]
    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    /// The version resolver.
    #[must_use]
    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// Fetch the live document.
    pub async fn get_workflow(&self, id: WorkflowId) -> Result<Workflow, EngineError> {
        self.repo.find(id).await.ok_or(EngineError::NotFound(id))
    }

    /// Fetch the snapshot of a document at a specific version.
    pub fn get_snapshot(
        &self,
        workflow_id: WorkflowId,
        lock_version: LockVersion,
    ) -> Result<Snapshot, EngineError> {
        self.snapshots
            .get(workflow_id, lock_version)
            .ok_or(EngineError::SnapshotNotFound {
                workflow_id,
                lock_version,
            })
    }

    /// Create a new workflow document.
    ///
    /// The initial snapshot is captured and audited in the same transaction
    /// as the insert. Builders produce triggers disabled by default, so the
    /// usage limiter is consulted only if the caller enabled one up front.
    pub async fn create_workflow(
        &self,
        actor: UserId,
        workflow: Workflow,
    ) -> Result<Workflow, EngineError> {
        if !self
            .authorizer
            .allows(actor, WorkflowAction::Create, workflow.project_id)
        {
            return Err(EngineError::Unauthorized);
        }

        let errors = validate_workflow(&workflow);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        if workflow.has_enabled_trigger() {
            self.limiter
                .check_trigger_activation(workflow.project_id, workflow.id)
                .map_err(|denial| EngineError::Limit {
                    message: denial.message,
                })?;
        }

        let outcome = self.persistence.commit_initial(workflow, actor).await?;
        Ok(outcome.workflow)
    }

    /// Open a viewer session on a document.
    ///
    /// Resolves the requested version to a live or pinned view, subscribes
    /// to the document topic, and joins presence — which notifies every
    /// other session so lock banners recompute.
    pub async fn open_session(
        &self,
        actor: UserId,
        workflow_id: WorkflowId,
        requested: Option<LockVersion>,
    ) -> Result<EditSession, EngineError> {
        let workflow = self.get_workflow(workflow_id).await?;
        let view = self.resolver.resolve(&workflow, requested)?;

        let session_id = SessionId::v4();
        let subscriber = self.bus.subscribe(workflow_id);
        self.presence.join(workflow_id, session_id, actor);

        Ok(EditSession::new(
            session_id,
            actor,
            workflow,
            view,
            subscriber,
            Arc::clone(&self.repo),
            Arc::clone(&self.snapshots),
            Arc::clone(&self.presence),
        ))
    }

    /// Save a session's working copy as the document's next version.
    ///
    /// The pipeline, in order: authorization (fails closed), view mode
    /// (snapshot-pinned sessions cannot save), presence lock, full document
    /// re-validation, the usage limiter when the save newly activates a
    /// trigger, and finally the atomic commit (compare-and-swap + snapshot +
    /// audit). On success the new version is broadcast and the session is
    /// moved onto it.
    pub async fn save(&self, session: &mut EditSession) -> Result<SaveOutcome, EngineError> {
        let actor = session.actor();
        let candidate = session.working_copy().clone();

        if !self
            .authorizer
            .allows(actor, WorkflowAction::Edit, candidate.project_id)
        {
            return Err(EngineError::Unauthorized);
        }

        if !session.view().is_live() {
            return Err(ViewOnlyReason::SnapshotPinned.into());
        }

        match self.presence.compute_lock(session.workflow_id(), actor) {
            LockState::Unlocked => {}
            LockState::LockedByOther { user } => {
                return Err(ViewOnlyReason::LockedBy { user }.into());
            }
            LockState::SelfMultiSession { sessions } => {
                return Err(ViewOnlyReason::MultipleTabs { sessions }.into());
            }
        }

        let errors = validate_workflow(&candidate);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        let current = self.get_workflow(session.workflow_id()).await?;
        if newly_activates_trigger(&current, &candidate) {
            self.limiter
                .check_trigger_activation(candidate.project_id, candidate.id)
                .map_err(|denial| EngineError::Limit {
                    message: denial.message,
                })?;
        }

        let outcome = self
            .persistence
            .commit_save(candidate, session.base_version(), actor)
            .await?;

        self.bus.broadcast(WorkflowEvent::DocumentUpdated {
            workflow_id: outcome.workflow.id,
            lock_version: outcome.workflow.lock_version,
        });
        session.adopt(outcome.workflow.clone());

        Ok(outcome)
    }

    /// Soft-delete a workflow.
    ///
    /// Guarded by authorization and the presence lock, audited, and
    /// broadcast so viewing sessions learn the document is gone.
    pub async fn delete_workflow(
        &self,
        actor: UserId,
        workflow_id: WorkflowId,
    ) -> Result<Workflow, EngineError> {
        let current = self.get_workflow(workflow_id).await?;
        if !self
            .authorizer
            .allows(actor, WorkflowAction::Delete, current.project_id)
        {
            return Err(EngineError::Unauthorized);
        }

        match self.presence.compute_lock(workflow_id, actor) {
            LockState::Unlocked => {}
            LockState::LockedByOther { user } => {
                return Err(ViewOnlyReason::LockedBy { user }.into());
            }
            LockState::SelfMultiSession { sessions } => {
                return Err(ViewOnlyReason::MultipleTabs { sessions }.into());
            }
        }

        let deleted = self.persistence.commit_delete(workflow_id, actor).await?;
        self.bus.broadcast(WorkflowEvent::WorkflowDeleted {
            workflow_id,
            actor,
        });
        Ok(deleted)
    }
}

/// Does saving `candidate` over `current` newly activate a trigger?
///
/// True when a trigger is enabled in the candidate but was absent or
/// disabled in the persisted document. Only then is the usage limiter
/// consulted.
fn newly_activates_trigger(current: &Workflow, candidate: &Workflow) -> bool {
    candidate
        .triggers
        .iter()
        .filter(|t| t.enabled)
        .any(|t| !current.trigger(t.id).is_some_and(|cur| cur.enabled))
}
