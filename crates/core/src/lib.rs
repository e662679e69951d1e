#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tapestry Core
//!
//! Core identifier and versioning types for the Tapestry collaboration
//! engine. This crate provides the fundamental building blocks used by all
//! other Tapestry crates.
//!
//! ## Key Components
//!
//! - **Identifiers**: WorkflowId, JobId, TriggerId, EdgeId, SnapshotId,
//!   UserId, SessionId, ProjectId, CredentialId, WebhookAuthMethodId
//! - **Versioning**: [`LockVersion`], the monotonic optimistic-concurrency
//!   counter attached to every workflow document

pub mod id;
pub mod version;

pub use id::*;
pub use version::LockVersion;

/// Common prelude for Tapestry crates.
pub mod prelude {
    pub use super::{
        CredentialId, EdgeId, JobId, LockVersion, ProjectId, SessionId, SnapshotId, TriggerId,
        UserId, UuidParseError, WebhookAuthMethodId, WorkflowId,
    };
}
