//! Edge types linking triggers and jobs.

use serde::{Deserialize, Serialize};
use tapestry_core::{EdgeId, JobId, TriggerId};

/// A directed edge from a trigger or job to a target job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge identifier within this workflow.
    pub id: EdgeId,
    /// Source node (a trigger for the entry edge, a job otherwise).
    pub source: EdgeSource,
    /// Target job.
    pub target: JobId,
    /// When the edge should be traversed.
    #[serde(default)]
    pub condition: EdgeCondition,
    /// Whether the edge is active.
    pub enabled: bool,
}

impl Edge {
    /// Create an enabled, unconditional job-to-job edge.
    #[must_use]
    pub fn new(id: EdgeId, from_job: JobId, to_job: JobId) -> Self {
        Self {
            id,
            source: EdgeSource::Job { id: from_job },
            target: to_job,
            condition: EdgeCondition::Always,
            enabled: true,
        }
    }

    /// Create the entry edge from a trigger to the first job.
    #[must_use]
    pub fn from_trigger(id: EdgeId, trigger: TriggerId, to_job: JobId) -> Self {
        Self {
            id,
            source: EdgeSource::Trigger { id: trigger },
            target: to_job,
            condition: EdgeCondition::Always,
            enabled: true,
        }
    }

    /// Set the edge condition.
    #[must_use]
    pub fn with_condition(mut self, condition: EdgeCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Set the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns `true` if this is the trigger entry edge.
    #[must_use]
    pub fn is_entry(&self) -> bool {
        matches!(self.source, EdgeSource::Trigger { .. })
    }

    /// The source job, if the source is a job.
    #[must_use]
    pub fn source_job(&self) -> Option<JobId> {
        match self.source {
            EdgeSource::Job { id } => Some(id),
            EdgeSource::Trigger { .. } => None,
        }
    }

    /// Returns `true` if this edge forms a job-to-job self-loop.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source_job() == Some(self.target)
    }
}

/// The source end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeSource {
    /// The edge starts at a trigger (the entry edge).
    Trigger {
        /// The source trigger.
        id: TriggerId,
    },
    /// The edge starts at a job.
    Job {
        /// The source job.
        id: JobId,
    },
}

/// Condition that determines whether an edge is traversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeCondition {
    /// Always traverse this edge.
    #[default]
    Always,
    /// Traverse when the upstream job succeeded.
    OnJobSuccess,
    /// Traverse when the upstream job failed.
    OnJobFailure,
    /// Evaluate a javascript expression against the run state.
    JsExpression {
        /// Short label shown on the canvas.
        label: String,
        /// The expression to evaluate.
        expression: String,
    },
}
