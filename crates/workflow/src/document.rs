//! The workflow document: the mutable aggregate root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapestry_core::{EdgeId, JobId, LockVersion, ProjectId, TriggerId, WorkflowId};

use crate::edge::Edge;
use crate::job::Job;
use crate::trigger::Trigger;

/// A complete workflow document: jobs, triggers, edges, and settings.
///
/// The workflow exclusively owns its jobs, triggers, and edges by value;
/// nothing outside the aggregate holds a pointer into it. Sessions that need
/// to refer back to a document keep only its id and lock version and look the
/// canonical state up on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier for this workflow.
    pub id: WorkflowId,
    /// The project this workflow belongs to. Names are unique among active
    /// workflows within one project.
    pub project_id: ProjectId,
    /// Human-readable name.
    pub name: String,
    /// Optimistic-concurrency counter, incremented exactly once per
    /// successful save.
    pub lock_version: LockVersion,
    /// Soft-delete marker. A deleted workflow is excluded from lookups and
    /// frees its name for reuse.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Whether run logs are captured for this workflow's jobs.
    pub enable_job_logs: bool,
    /// Optional cap on parallel runs. Must be positive when set.
    #[serde(default)]
    pub concurrency: Option<u32>,
    /// The executable steps of this workflow.
    pub jobs: Vec<Job>,
    /// The entry nodes of this workflow.
    pub triggers: Vec<Trigger>,
    /// Directed connections between triggers and jobs.
    pub edges: Vec<Edge>,
    /// When this workflow was first created.
    pub inserted_at: DateTime<Utc>,
    /// When this workflow was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Look up a job by id.
    #[must_use]
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Look up a job by id, mutably.
    pub fn job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Look up a trigger by id.
    #[must_use]
    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.id == id)
    }

    /// Look up a trigger by id, mutably.
    pub fn trigger_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.iter_mut().find(|t| t.id == id)
    }

    /// Look up an edge by id.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Look up an edge by id, mutably.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    /// All edges whose source is a trigger. A valid document has exactly one.
    #[must_use]
    pub fn entry_edges(&self) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.is_entry()).collect()
    }

    /// The trigger entry edge, when the document has exactly one.
    #[must_use]
    pub fn entry_edge(&self) -> Option<&Edge> {
        match self.entry_edges().as_slice() {
            [edge] => Some(edge),
            _ => None,
        }
    }

    /// The first job of the workflow: the target of the entry edge.
    #[must_use]
    pub fn first_job(&self) -> Option<JobId> {
        self.entry_edge().map(|e| e.target)
    }

    /// Job-to-job edges leaving the given job.
    #[must_use]
    pub fn edges_from(&self, job_id: JobId) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.source_job() == Some(job_id))
            .collect()
    }

    /// Edges targeting the given job (including the entry edge).
    #[must_use]
    pub fn edges_to(&self, job_id: JobId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target == job_id).collect()
    }

    /// Jobs directly downstream of the given job.
    #[must_use]
    pub fn descendants(&self, job_id: JobId) -> Vec<JobId> {
        self.edges_from(job_id).iter().map(|e| e.target).collect()
    }

    /// Returns `true` if the job has at least one downstream job.
    #[must_use]
    pub fn has_descendants(&self, job_id: JobId) -> bool {
        self.edges
            .iter()
            .any(|e| e.source_job() == Some(job_id))
    }

    /// Returns `true` if this workflow has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if any trigger is enabled.
    #[must_use]
    pub fn has_enabled_trigger(&self) -> bool {
        self.triggers.iter().any(|t| t.enabled)
    }

    /// Record a modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;

    fn two_step_workflow() -> (Workflow, JobId, JobId) {
        let a = JobId::v4();
        let b = JobId::v4();
        let workflow = WorkflowBuilder::new(ProjectId::v4(), "two steps")
            .add_job(Job::new(a, "a", "adaptor").with_body("fn(s => s)"))
            .add_job(Job::new(b, "b", "adaptor").with_body("fn(s => s)"))
            .connect(a, b)
            .build()
            .unwrap();
        (workflow, a, b)
    }

    #[test]
    fn lookup_by_id() {
        let (workflow, a, _b) = two_step_workflow();
        assert_eq!(workflow.job(a).unwrap().id, a);
        assert!(workflow.job(JobId::v4()).is_none());
        assert!(workflow.edge(EdgeId::v4()).is_none());
    }

    #[test]
    fn entry_edge_and_first_job() {
        let (workflow, a, _b) = two_step_workflow();
        let entry = workflow.entry_edge().unwrap();
        assert!(entry.is_entry());
        assert_eq!(workflow.first_job(), Some(a));
    }

    #[test]
    fn descendants_follow_job_edges_only() {
        let (workflow, a, b) = two_step_workflow();
        assert_eq!(workflow.descendants(a), vec![b]);
        assert!(workflow.descendants(b).is_empty());
        assert!(workflow.has_descendants(a));
        assert!(!workflow.has_descendants(b));
    }

    #[test]
    fn edges_to_includes_entry_edge() {
        let (workflow, a, b) = two_step_workflow();
        // a is targeted by the entry edge, b by the a->b edge
        assert_eq!(workflow.edges_to(a).len(), 1);
        assert!(workflow.edges_to(a)[0].is_entry());
        assert_eq!(workflow.edges_to(b).len(), 1);
    }

    #[test]
    fn soft_delete_marker() {
        let (mut workflow, _a, _b) = two_step_workflow();
        assert!(!workflow.is_deleted());
        workflow.deleted_at = Some(Utc::now());
        assert!(workflow.is_deleted());
    }

    #[test]
    fn has_enabled_trigger_reflects_flags() {
        let (mut workflow, _a, _b) = two_step_workflow();
        assert!(!workflow.has_enabled_trigger());
        workflow.triggers[0].enabled = true;
        assert!(workflow.has_enabled_trigger());
    }

    #[test]
    fn workflow_serde_roundtrip() {
        let (workflow, _a, _b) = two_step_workflow();
        let json = serde_json::to_string(&workflow).unwrap();
        let back: Workflow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, workflow);
    }
}
