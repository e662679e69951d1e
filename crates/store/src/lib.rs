#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tapestry Store
//!
//! Persistence for the Tapestry collaboration engine: the canonical workflow
//! repository, immutable snapshot history, and the audit log, bound together
//! by an atomic save transaction.
//!
//! This crate provides:
//! - [`WorkflowRepo`] — canonical document storage with active-name
//!   uniqueness and soft deletes
//! - [`Snapshot`] and [`SnapshotStore`] — immutable captures, created
//!   exactly once per `(workflow_id, lock_version)`
//! - [`AuditEntry`] and [`AuditSink`] — the append-only versioning log
//! - [`Persistence`] — the atomic commit unit: document compare-and-swap +
//!   snapshot + audit record, all-or-nothing
//! - [`MemoryStore`] — the in-memory implementation of all of the above
//!
//! Successful saves on one document are linearized by the lock-version
//! compare-and-swap; a stale save is rejected with
//! [`StoreError::VersionConflict`], never merged.

pub mod audit;
pub mod error;
pub mod memory;
pub mod repo;
pub mod snapshot;

pub use audit::{AuditEntry, AuditSink, MemoryAuditSink};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use repo::{Persistence, SaveOutcome, WorkflowRepo};
pub use snapshot::{MemorySnapshotStore, Snapshot, SnapshotStore};
