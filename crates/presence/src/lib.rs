#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tapestry Presence
//!
//! Per-document presence tracking for the Tapestry collaboration engine.
//!
//! This crate provides:
//! - [`PresenceSession`] — one connected viewer (browser tab) on a document
//! - [`PresenceTracker`] — sharded registry with join/leave/heartbeat
//!   lifecycle and TTL eviction of unclean disconnects
//! - [`LockState`] — the presence-based single-writer lock, computed from
//!   join order
//!
//! Presence is advisory and eventually consistent: it drives the editable
//! state shown to sessions, while saves remain independently guarded by the
//! persistence layer's optimistic concurrency check.

pub mod session;
pub mod tracker;

pub use session::{LockState, PresenceSession};
pub use tracker::PresenceTracker;
