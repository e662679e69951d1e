//! Unique identifiers for Tapestry entities.
//!
//! This module provides strongly-typed UUID identifiers for the entities of
//! the collaboration engine using [`domain-key`](https://crates.io/crates/domain-key)
//! `Uuid<D>` wrappers. Each identifier type is parameterized by a unique
//! domain marker, providing compile-time type safety that prevents mixing
//! different ID types.
//!
//! All ID types are `Copy` (16 bytes, stack-allocated) and support:
//! - `v4()` for random UUID generation
//! - `nil()` for zero-valued default
//! - `parse(&str)` for string parsing
//! - Full serde support (serializes as UUID string)
//! - `Display`, `FromStr`, `Eq`, `Ord`, `Hash`

use domain_key::define_uuid;

// Re-export for downstream parse error handling
pub use domain_key::UuidParseError;

// Entity identifiers — UUID-based, Copy, 16 bytes each
define_uuid!(pub WorkflowIdDomain => WorkflowId);
define_uuid!(pub ProjectIdDomain => ProjectId);
define_uuid!(pub JobIdDomain => JobId);
define_uuid!(pub TriggerIdDomain => TriggerId);
define_uuid!(pub EdgeIdDomain => EdgeId);
define_uuid!(pub SnapshotIdDomain => SnapshotId);
define_uuid!(pub UserIdDomain => UserId);
define_uuid!(pub SessionIdDomain => SessionId);
define_uuid!(pub CredentialIdDomain => CredentialId);
define_uuid!(pub WebhookAuthMethodIdDomain => WebhookAuthMethodId);
