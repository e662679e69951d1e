//! Structural patches: ordered edit operations applied all-or-nothing.
//!
//! A patch is the canonical representation of an edit session's pending
//! changes. The server never trusts a client-applied result; it re-applies
//! the operations against its own copy and re-validates every invariant
//! before anything is persisted.

use serde::{Deserialize, Serialize};
use tapestry_core::{CredentialId, EdgeId, JobId, TriggerId};

use crate::document::Workflow;
use crate::edge::{Edge, EdgeCondition};
use crate::error::WorkflowError;
use crate::job::Job;
use crate::trigger::{Trigger, TriggerKind};
use crate::validate::validate_workflow;

/// A single structural edit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// Add a new job.
    AddJob {
        /// The job to add.
        job: Job,
    },
    /// Modify an existing job. `None` fields are left unchanged.
    UpdateJob {
        /// The job to modify.
        id: JobId,
        /// New name, if changing.
        #[serde(default)]
        name: Option<String>,
        /// New body, if changing.
        #[serde(default)]
        body: Option<String>,
        /// New adaptor, if changing.
        #[serde(default)]
        adaptor: Option<String>,
    },
    /// Set or clear a job's credential reference.
    SetJobCredential {
        /// The job to modify.
        id: JobId,
        /// The credential to attach, or `None` to detach.
        credential_id: Option<CredentialId>,
    },
    /// Remove a job. Refused while the job has downstream jobs or is the
    /// first step; incoming edges are removed with it.
    RemoveJob {
        /// The job to remove.
        id: JobId,
    },
    /// Add a new trigger.
    AddTrigger {
        /// The trigger to add.
        trigger: Trigger,
    },
    /// Modify an existing trigger. `None` fields are left unchanged.
    UpdateTrigger {
        /// The trigger to modify.
        id: TriggerId,
        /// New enabled flag, if changing.
        #[serde(default)]
        enabled: Option<bool>,
        /// New kind, if changing.
        #[serde(default)]
        kind: Option<TriggerKind>,
    },
    /// Add a new edge.
    AddEdge {
        /// The edge to add.
        edge: Edge,
    },
    /// Modify an existing edge. `None` fields are left unchanged.
    UpdateEdge {
        /// The edge to modify.
        id: EdgeId,
        /// New condition, if changing.
        #[serde(default)]
        condition: Option<EdgeCondition>,
        /// New enabled flag, if changing.
        #[serde(default)]
        enabled: Option<bool>,
    },
    /// Remove an edge. The trigger entry edge is never removable.
    RemoveEdge {
        /// The edge to remove.
        id: EdgeId,
    },
    /// Rename the workflow.
    RenameWorkflow {
        /// The new name.
        name: String,
    },
    /// Set or clear the parallel-run cap.
    SetConcurrency {
        /// The new cap, or `None` for unlimited.
        concurrency: Option<u32>,
    },
    /// Toggle job log capture.
    SetJobLogs {
        /// Whether job logs are captured.
        enabled: bool,
    },
}

/// An ordered sequence of edit operations applied as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// The operations, applied in order.
    pub ops: Vec<PatchOp>,
}

impl Patch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a patch with a single operation.
    #[must_use]
    pub fn single(op: PatchOp) -> Self {
        Self { ops: vec![op] }
    }

    /// Append an operation.
    #[must_use]
    pub fn with(mut self, op: PatchOp) -> Self {
        self.ops.push(op);
        self
    }
}

/// Apply a patch to a document, all-or-nothing.
///
/// Each operation is applied in order to a working copy; if any operation
/// fails its structural guard, or the patched document fails validation, the
/// whole patch is rejected and the original document is untouched. The
/// returned document keeps the input's `lock_version` — versions advance only
/// on a successful persisted save.
pub fn apply_patch(workflow: &Workflow, patch: &Patch) -> Result<Workflow, Vec<WorkflowError>> {
    let mut next = workflow.clone();
    for op in &patch.ops {
        apply_op(&mut next, op).map_err(|e| vec![e])?;
    }
    let errors = validate_workflow(&next);
    if !errors.is_empty() {
        return Err(errors);
    }
    next.touch();
    Ok(next)
}

fn apply_op(workflow: &mut Workflow, op: &PatchOp) -> Result<(), WorkflowError> {
    match op {
        PatchOp::AddJob { job } => {
            if workflow.job(job.id).is_some() {
                return Err(WorkflowError::DuplicateJobId(job.id));
            }
            workflow.jobs.push(job.clone());
        }
        PatchOp::UpdateJob {
            id,
            name,
            body,
            adaptor,
        } => {
            let job = workflow
                .job_mut(*id)
                .ok_or(WorkflowError::JobNotFound(*id))?;
            if let Some(name) = name {
                job.name.clone_from(name);
            }
            if let Some(body) = body {
                job.body.clone_from(body);
            }
            if let Some(adaptor) = adaptor {
                job.adaptor.clone_from(adaptor);
            }
        }
        PatchOp::SetJobCredential { id, credential_id } => {
            let job = workflow
                .job_mut(*id)
                .ok_or(WorkflowError::JobNotFound(*id))?;
            job.credential_id = *credential_id;
        }
        PatchOp::RemoveJob { id } => {
            if workflow.job(*id).is_none() {
                return Err(WorkflowError::JobNotFound(*id));
            }
            // Descendants are checked before the first-step rule; each
            // violation carries its own user-facing message.
            if workflow.has_descendants(*id) {
                return Err(WorkflowError::DeleteDescendantsFirst(*id));
            }
            if workflow.first_job() == Some(*id) {
                return Err(WorkflowError::DeleteFirstStepForbidden(*id));
            }
            workflow.jobs.retain(|j| j.id != *id);
            workflow.edges.retain(|e| e.target != *id);
        }
        PatchOp::AddTrigger { trigger } => {
            if workflow.trigger(trigger.id).is_some() {
                return Err(WorkflowError::DuplicateTriggerId(trigger.id));
            }
            workflow.triggers.push(trigger.clone());
        }
        PatchOp::UpdateTrigger { id, enabled, kind } => {
            let trigger = workflow
                .trigger_mut(*id)
                .ok_or(WorkflowError::TriggerNotFound(*id))?;
            if let Some(enabled) = enabled {
                trigger.enabled = *enabled;
            }
            if let Some(kind) = kind {
                trigger.kind = kind.clone();
            }
        }
        PatchOp::AddEdge { edge } => {
            if workflow.edge(edge.id).is_some() {
                return Err(WorkflowError::DuplicateEdgeId(edge.id));
            }
            workflow.edges.push(edge.clone());
        }
        PatchOp::UpdateEdge {
            id,
            condition,
            enabled,
        } => {
            let edge = workflow
                .edge_mut(*id)
                .ok_or(WorkflowError::EdgeNotFound(*id))?;
            if let Some(condition) = condition {
                edge.condition = condition.clone();
            }
            if let Some(enabled) = enabled {
                edge.enabled = *enabled;
            }
        }
        PatchOp::RemoveEdge { id } => {
            let edge = workflow.edge(*id).ok_or(WorkflowError::EdgeNotFound(*id))?;
            if edge.is_entry() {
                return Err(WorkflowError::DeleteEntryEdgeForbidden(*id));
            }
            workflow.edges.retain(|e| e.id != *id);
        }
        PatchOp::RenameWorkflow { name } => {
            workflow.name.clone_from(name);
        }
        PatchOp::SetConcurrency { concurrency } => {
            workflow.concurrency = *concurrency;
        }
        PatchOp::SetJobLogs { enabled } => {
            workflow.enable_job_logs = *enabled;
        }
    }
    Ok(())
}
