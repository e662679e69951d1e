//! The usage-limiter boundary.
//!
//! Consulted only when a save would newly activate a trigger — enabling a
//! previously disabled one, or creating one already enabled. A denial aborts
//! the entire save, not just the activation, and its message is surfaced to
//! the user verbatim.

use tapestry_core::{ProjectId, WorkflowId};

/// A limiter denial with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitDenial {
    /// The message to surface verbatim.
    pub message: String,
}

impl LimitDenial {
    /// Create a denial with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External usage limits on trigger activation.
pub trait UsageLimiter: Send + Sync {
    /// Decide whether the project may activate a trigger on this workflow.
    fn check_trigger_activation(
        &self,
        project_id: ProjectId,
        workflow_id: WorkflowId,
    ) -> Result<(), LimitDenial>;
}

/// A limiter that never denies anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl UsageLimiter for Unlimited {
    fn check_trigger_activation(
        &self,
        _project_id: ProjectId,
        _workflow_id: WorkflowId,
    ) -> Result<(), LimitDenial> {
        Ok(())
    }
}
