#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tapestry Eventbus
//!
//! Typed event distribution for the Tapestry collaboration engine.
//!
//! This crate provides:
//! - [`WorkflowEvent`] — the tagged union of collaboration lifecycle events
//! - [`EventBus`] — per-document broadcast topics with fire-and-forget
//!   delivery
//! - [`EventSubscriber`] — lag-tolerant subscription handle
//!
//! Events are **projections**, not the source of truth. The canonical
//! persisted document is authoritative; a session that misses an event
//! re-reads it.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventSubscriber};
pub use event::WorkflowEvent;
