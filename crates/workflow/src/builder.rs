//! Fluent builder for constructing and validating workflow documents.

use chrono::Utc;
use tapestry_core::{EdgeId, JobId, LockVersion, ProjectId, TriggerId, WorkflowId};

use crate::document::Workflow;
use crate::edge::{Edge, EdgeCondition};
use crate::error::WorkflowError;
use crate::job::Job;
use crate::trigger::{Trigger, TriggerKind};
use crate::validate::validate_workflow;

/// A builder that accumulates jobs, triggers, and edges, then validates and
/// produces a [`Workflow`] at [`LockVersion::INITIAL`].
///
/// If no trigger is declared, a disabled webhook trigger is added; if no
/// entry edge is declared, the first trigger is wired to the first job. New
/// documents therefore always satisfy the entry-edge invariant, and their
/// triggers start disabled so no usage limit is consumed until a user
/// deliberately activates one.
pub struct WorkflowBuilder {
    id: WorkflowId,
    project_id: ProjectId,
    name: String,
    jobs: Vec<Job>,
    triggers: Vec<Trigger>,
    edges: Vec<Edge>,
    enable_job_logs: bool,
    concurrency: Option<u32>,
}

impl WorkflowBuilder {
    /// Start building a workflow in the given project.
    #[must_use]
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::v4(),
            project_id,
            name: name.into(),
            jobs: Vec::new(),
            triggers: Vec::new(),
            edges: Vec::new(),
            enable_job_logs: true,
            concurrency: None,
        }
    }

    /// Override the auto-generated workflow ID.
    #[must_use]
    pub fn id(mut self, id: WorkflowId) -> Self {
        self.id = id;
        self
    }

    /// Add a job to the workflow.
    #[must_use]
    pub fn add_job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// Add a trigger of the given kind (disabled).
    #[must_use]
    pub fn trigger(mut self, kind: TriggerKind) -> Self {
        self.triggers.push(Trigger::new(TriggerId::v4(), kind));
        self
    }

    /// Declare the entry edge from the first trigger to the given job.
    #[must_use]
    pub fn entry(mut self, to_job: JobId) -> Self {
        let trigger_id = match self.triggers.first() {
            Some(t) => t.id,
            None => {
                let trigger = Trigger::webhook(TriggerId::v4());
                let id = trigger.id;
                self.triggers.push(trigger);
                id
            }
        };
        self.edges
            .push(Edge::from_trigger(EdgeId::v4(), trigger_id, to_job));
        self
    }

    /// Add an unconditional edge between two jobs.
    #[must_use]
    pub fn connect(mut self, from: JobId, to: JobId) -> Self {
        self.edges.push(Edge::new(EdgeId::v4(), from, to));
        self
    }

    /// Add a conditional edge between two jobs.
    #[must_use]
    pub fn connect_with_condition(
        mut self,
        from: JobId,
        to: JobId,
        condition: EdgeCondition,
    ) -> Self {
        self.edges
            .push(Edge::new(EdgeId::v4(), from, to).with_condition(condition));
        self
    }

    /// Set whether job logs are captured.
    #[must_use]
    pub fn enable_job_logs(mut self, enabled: bool) -> Self {
        self.enable_job_logs = enabled;
        self
    }

    /// Cap the number of parallel runs.
    #[must_use]
    pub fn concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Consume the builder, validate the document, and return it.
    ///
    /// Validation covers the full invariant set; the first violation is
    /// returned. Use [`validate_workflow`] on the built document to collect
    /// every error at once.
    pub fn build(mut self) -> Result<Workflow, WorkflowError> {
        if self.triggers.is_empty() {
            self.triggers.push(Trigger::webhook(TriggerId::v4()));
        }
        if !self.edges.iter().any(Edge::is_entry)
            && let Some(first_job) = self.jobs.first()
        {
            self.edges.push(Edge::from_trigger(
                EdgeId::v4(),
                self.triggers[0].id,
                first_job.id,
            ));
        }

        let now = Utc::now();
        let workflow = Workflow {
            id: self.id,
            project_id: self.project_id,
            name: self.name,
            lock_version: LockVersion::INITIAL,
            deleted_at: None,
            enable_job_logs: self.enable_job_logs,
            concurrency: self.concurrency,
            jobs: self.jobs,
            triggers: self.triggers,
            edges: self.edges,
            inserted_at: now,
            updated_at: now,
        };

        match validate_workflow(&workflow).into_iter().next() {
            Some(error) => Err(error),
            None => Ok(workflow),
        }
    }
}
