#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tapestry Engine
//!
//! The collaborative mutation engine: version resolution, edit sessions, and
//! the guarded save pipeline for workflow documents.
//!
//! This crate ties the Tapestry components together:
//!
//! - [`CollabEngine`] — opens sessions, runs the save pipeline
//!   (authorization → presence lock → validation → usage limits → atomic
//!   commit), and broadcasts version changes
//! - [`EditSession`] — one viewer's private working copy and view state
//! - [`VersionResolver`] and [`ViewMode`] — live-vs-snapshot pinning rules
//! - [`Authorizer`] and [`UsageLimiter`] — boundary traits consumed by the
//!   pipeline (implementations live outside the core)
//! - [`EngineError`] — the recoverable error taxonomy surfaced to sessions

pub mod auth;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod resolver;
pub mod session;

pub use auth::{AllowAll, Authorizer, WorkflowAction};
pub use engine::CollabEngine;
pub use error::{EngineError, ViewOnlyReason};
pub use limiter::{LimitDenial, Unlimited, UsageLimiter};
pub use resolver::{VersionResolver, ViewMode};
pub use session::EditSession;
