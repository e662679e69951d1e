//! The per-document presence registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tapestry_core::{SessionId, UserId, WorkflowId};
use tapestry_eventbus::{EventBus, WorkflowEvent};
use tokio_util::sync::CancellationToken;

use crate::session::{LockState, PresenceSession};

/// Default liveness timeout for sessions that stop heartbeating.
const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Tracks which sessions are viewing each document and computes the
/// single-writer lock state.
///
/// The registry is sharded by document id ([`DashMap`]), so presence churn
/// on one document never contends with unrelated documents. Every
/// join/leave/eviction broadcasts [`WorkflowEvent::PresenceChanged`] on the
/// document's topic so all sessions recompute their editable state.
pub struct PresenceTracker {
    docs: DashMap<WorkflowId, Vec<PresenceSession>>,
    join_seq: AtomicU64,
    ttl: TimeDelta,
    bus: Arc<EventBus>,
}

impl PresenceTracker {
    /// Create a tracker with the default liveness timeout.
    #[must_use]
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_ttl(bus, DEFAULT_TTL)
    }

    /// Create a tracker with the given liveness timeout.
    #[must_use]
    pub fn with_ttl(bus: Arc<EventBus>, ttl: Duration) -> Self {
        Self {
            docs: DashMap::new(),
            join_seq: AtomicU64::new(0),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            bus,
        }
    }

    /// Register a session on a document.
    ///
    /// Joining is idempotent per `session_id`: a rejoin refreshes the
    /// liveness timestamp but keeps the original join sequence, so a
    /// reconnecting lock holder does not lose its place.
    pub fn join(
        &self,
        workflow_id: WorkflowId,
        session_id: SessionId,
        user_id: UserId,
    ) -> PresenceSession {
        let mut sessions = self.docs.entry(workflow_id).or_default();
        if let Some(existing) = sessions.iter_mut().find(|s| s.session_id == session_id) {
            existing.last_seen_at = Utc::now();
            return existing.clone();
        }

        let session = PresenceSession {
            session_id,
            user_id,
            workflow_id,
            join_seq: self.join_seq.fetch_add(1, Ordering::Relaxed),
            last_seen_at: Utc::now(),
        };
        sessions.push(session.clone());
        drop(sessions);

        tracing::debug!(%workflow_id, %session_id, %user_id, "session joined");
        self.bus
            .broadcast(WorkflowEvent::PresenceChanged { workflow_id });
        session
    }

    /// Remove a session from a document (graceful disconnect).
    ///
    /// Returns `true` if the session was present.
    pub fn leave(&self, workflow_id: WorkflowId, session_id: SessionId) -> bool {
        let removed = match self.docs.get_mut(&workflow_id) {
            Some(mut sessions) => {
                let before = sessions.len();
                sessions.retain(|s| s.session_id != session_id);
                before != sessions.len()
            }
            None => false,
        };

        if removed {
            tracing::debug!(%workflow_id, %session_id, "session left");
            self.bus
                .broadcast(WorkflowEvent::PresenceChanged { workflow_id });
        }
        removed
    }

    /// Refresh a session's liveness timestamp.
    ///
    /// Returns `false` if the session is unknown (e.g. already evicted); the
    /// caller should rejoin.
    pub fn heartbeat(&self, workflow_id: WorkflowId, session_id: SessionId) -> bool {
        let Some(mut sessions) = self.docs.get_mut(&workflow_id) else {
            return false;
        };
        match sessions.iter_mut().find(|s| s.session_id == session_id) {
            Some(session) => {
                session.last_seen_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// All sessions currently on a document, in join order.
    #[must_use]
    pub fn sessions(&self, workflow_id: WorkflowId) -> Vec<PresenceSession> {
        let mut sessions = self
            .docs
            .get(&workflow_id)
            .map(|s| s.clone())
            .unwrap_or_default();
        sessions.sort_by_key(|s| s.join_seq);
        sessions
    }

    /// Compute the lock state of a document from one user's perspective.
    ///
    /// The session with the lowest join sequence holds editability. The
    /// holder is blocked by their own extra tabs; everyone else is locked by
    /// the holder. Presence anywhere in the document counts: the lock is
    /// per-document, not per-node.
    #[must_use]
    pub fn compute_lock(&self, workflow_id: WorkflowId, user: UserId) -> LockState {
        let sessions = self.sessions(workflow_id);
        let Some(holder) = sessions.first() else {
            return LockState::Unlocked;
        };

        if holder.user_id != user {
            return LockState::LockedByOther {
                user: holder.user_id,
            };
        }

        let own = sessions.iter().filter(|s| s.user_id == user).count();
        if own > 1 {
            LockState::SelfMultiSession { sessions: own }
        } else {
            LockState::Unlocked
        }
    }

    /// Evict sessions whose last heartbeat is older than the liveness
    /// timeout, so an unclean disconnect cannot hold the lock forever.
    ///
    /// Returns the evicted sessions.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> Vec<PresenceSession> {
        let mut evicted = Vec::new();

        for mut entry in self.docs.iter_mut() {
            let ttl = self.ttl;
            let before = entry.len();
            let (stale, live): (Vec<_>, Vec<_>) = entry
                .drain(..)
                .partition(|s| now.signed_duration_since(s.last_seen_at) > ttl);
            *entry.value_mut() = live;
            if entry.len() != before {
                evicted.extend(stale);
            }
        }

        let mut affected: Vec<WorkflowId> = evicted.iter().map(|s| s.workflow_id).collect();
        affected.dedup();
        for workflow_id in affected {
            tracing::debug!(%workflow_id, "evicted stale sessions");
            self.bus
                .broadcast(WorkflowEvent::PresenceChanged { workflow_id });
        }
        self.docs.retain(|_, sessions| !sessions.is_empty());

        evicted
    }

    /// Run the eviction loop until cancelled.
    ///
    /// Checks for stale sessions every `period`. Intended to be spawned as a
    /// background task alongside the engine.
    pub async fn run_reaper(self: Arc<Self>, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = self.evict_stale(Utc::now());
                    if !evicted.is_empty() {
                        tracing::info!(count = evicted.len(), "presence reaper evicted sessions");
                    }
                }
            }
        }
    }
}
