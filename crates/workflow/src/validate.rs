//! Comprehensive document validation that collects all errors.

use std::collections::HashSet;

use crate::document::Workflow;
use crate::error::WorkflowError;
use crate::graph::WorkflowGraph;

/// Validate a workflow document comprehensively.
///
/// Unlike [`WorkflowBuilder::build`](crate::WorkflowBuilder::build), which
/// stops at the first error, this function collects every issue it can find
/// so they can all be surfaced at once. A document for which this returns an
/// empty vector upholds every structural invariant and is safe to persist.
#[must_use]
pub fn validate_workflow(workflow: &Workflow) -> Vec<WorkflowError> {
    let mut errors = Vec::new();

    // 1. Check name
    if workflow.name.trim().is_empty() {
        errors.push(WorkflowError::BlankWorkflowName);
    }

    // 2. Check settings
    if workflow.concurrency == Some(0) {
        errors.push(WorkflowError::InvalidConcurrency(0));
    }

    // 3. Check job count
    if workflow.jobs.is_empty() {
        errors.push(WorkflowError::NoJobs);
        return errors; // Cannot check further without jobs
    }

    // 4. Check duplicate ids
    let mut job_ids = HashSet::new();
    for job in &workflow.jobs {
        if !job_ids.insert(job.id) {
            errors.push(WorkflowError::DuplicateJobId(job.id));
        }
        if job.has_blank_name() {
            errors.push(WorkflowError::BlankJobName(job.id));
        }
    }
    let mut trigger_ids = HashSet::new();
    for trigger in &workflow.triggers {
        if !trigger_ids.insert(trigger.id) {
            errors.push(WorkflowError::DuplicateTriggerId(trigger.id));
        }
    }
    let mut edge_ids = HashSet::new();
    for edge in &workflow.edges {
        if !edge_ids.insert(edge.id) {
            errors.push(WorkflowError::DuplicateEdgeId(edge.id));
        }
    }

    // 5. Check the entry edge invariant: exactly one trigger-sourced edge,
    //    referencing a known trigger.
    let entry_edges = workflow.entry_edges();
    match entry_edges.len() {
        0 => errors.push(WorkflowError::NoEntryEdge),
        1 => (),
        _ => errors.push(WorkflowError::MultipleEntryEdges),
    }
    for edge in &entry_edges {
        if let crate::edge::EdgeSource::Trigger { id } = edge.source
            && !trigger_ids.contains(&id)
        {
            errors.push(WorkflowError::UnknownTrigger(id));
        }
    }

    // 6. Check graph structure: cycles, connectivity, and reachable bodies
    match WorkflowGraph::from_workflow(workflow) {
        Ok(graph) => {
            if graph.has_cycle() {
                errors.push(WorkflowError::CycleDetected);
            }
            for job_id in graph.disconnected_from_entry() {
                errors.push(WorkflowError::DisconnectedJob(job_id));
            }
            let reachable = graph.reachable_from_entry();
            for job in &workflow.jobs {
                if reachable.contains(&job.id) && job.has_blank_body() {
                    errors.push(WorkflowError::BlankJobBody(job.id));
                }
            }
        }
        Err(e) => errors.push(e),
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;
    use crate::edge::Edge;
    use crate::job::Job;
    use crate::trigger::Trigger;
    use tapestry_core::{EdgeId, JobId, ProjectId, TriggerId};

    fn job(id: JobId) -> Job {
        Job::new(id, "n", "adaptor").with_body("fn(s => s)")
    }

    fn valid_workflow() -> (Workflow, JobId, JobId) {
        let a = JobId::v4();
        let b = JobId::v4();
        let workflow = WorkflowBuilder::new(ProjectId::v4(), "ok")
            .add_job(job(a))
            .add_job(job(b))
            .connect(a, b)
            .build()
            .unwrap();
        (workflow, a, b)
    }

    #[test]
    fn valid_workflow_returns_empty() {
        let (workflow, ..) = valid_workflow();
        let errors = validate_workflow(&workflow);
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn detects_blank_name() {
        let (mut workflow, ..) = valid_workflow();
        workflow.name = "   ".into();
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::BlankWorkflowName));
    }

    #[test]
    fn detects_no_jobs() {
        let (mut workflow, ..) = valid_workflow();
        workflow.jobs.clear();
        workflow.edges.clear();
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::NoJobs));
    }

    #[test]
    fn detects_zero_concurrency() {
        let (mut workflow, ..) = valid_workflow();
        workflow.concurrency = Some(0);
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::InvalidConcurrency(0)));
    }

    #[test]
    fn positive_concurrency_is_fine() {
        let (mut workflow, ..) = valid_workflow();
        workflow.concurrency = Some(3);
        assert!(validate_workflow(&workflow).is_empty());
    }

    #[test]
    fn detects_blank_job_name() {
        let (mut workflow, a, _) = valid_workflow();
        workflow.job_mut(a).unwrap().name = String::new();
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::BlankJobName(a)));
    }

    #[test]
    fn detects_blank_body_on_reachable_job() {
        let (mut workflow, _, b) = valid_workflow();
        workflow.job_mut(b).unwrap().body = String::new();
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::BlankJobBody(b)));
    }

    #[test]
    fn blank_body_on_unreachable_feeder_is_allowed() {
        // feeder -> b is connected but never runs from the trigger, so a
        // blank body does not block saving.
        let (mut workflow, _, b) = valid_workflow();
        let feeder = JobId::v4();
        workflow.jobs.push(Job::new(feeder, "feeder", "adaptor"));
        workflow.edges.push(Edge::new(EdgeId::v4(), feeder, b));
        let errors = validate_workflow(&workflow);
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn detects_duplicate_job_id() {
        let (mut workflow, a, _) = valid_workflow();
        let dup = workflow.job(a).unwrap().clone();
        workflow.jobs.push(dup);
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::DuplicateJobId(a)));
    }

    #[test]
    fn detects_missing_entry_edge() {
        let (mut workflow, ..) = valid_workflow();
        workflow.edges.retain(|e| !e.is_entry());
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::NoEntryEdge));
    }

    #[test]
    fn detects_multiple_entry_edges() {
        let (mut workflow, a, _) = valid_workflow();
        let second = Trigger::webhook(TriggerId::v4());
        workflow
            .edges
            .push(Edge::from_trigger(EdgeId::v4(), second.id, a));
        workflow.triggers.push(second);
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::MultipleEntryEdges));
    }

    #[test]
    fn detects_entry_edge_with_unknown_trigger() {
        let (mut workflow, ..) = valid_workflow();
        let ghost = TriggerId::v4();
        workflow.edges.retain(|e| !e.is_entry());
        let first = workflow.jobs[0].id;
        workflow
            .edges
            .push(Edge::from_trigger(EdgeId::v4(), ghost, first));
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::UnknownTrigger(ghost)));
    }

    #[test]
    fn detects_cycle() {
        let (mut workflow, a, b) = valid_workflow();
        workflow.edges.push(Edge::new(EdgeId::v4(), b, a));
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::CycleDetected));
    }

    #[test]
    fn detects_disconnected_job() {
        let (mut workflow, ..) = valid_workflow();
        let island = JobId::v4();
        workflow.jobs.push(job(island));
        let errors = validate_workflow(&workflow);
        assert!(errors.contains(&WorkflowError::DisconnectedJob(island)));
    }

    #[test]
    fn collects_multiple_errors() {
        let (mut workflow, a, _) = valid_workflow();
        workflow.name = String::new();
        workflow.concurrency = Some(0);
        workflow.job_mut(a).unwrap().name = String::new();
        let errors = validate_workflow(&workflow);
        assert!(errors.len() >= 3, "expected >= 3 errors, got: {errors:?}");
    }
}
