//! DAG view of a workflow document built on `petgraph`.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tapestry_core::{EdgeId, JobId};

use crate::document::Workflow;
use crate::error::WorkflowError;

/// The job-to-job dependency graph of a workflow.
///
/// Trigger edges are not part of the graph; the entry job is tracked
/// separately so reachability and connectivity can be computed from it.
#[derive(Debug)]
pub struct WorkflowGraph {
    graph: DiGraph<JobId, EdgeId>,
    index_map: HashMap<JobId, NodeIndex>,
    entry: Option<JobId>,
}

impl WorkflowGraph {
    /// Build a [`WorkflowGraph`] from a workflow document.
    ///
    /// Returns an error if an edge references an unknown job or forms a
    /// self-loop.
    pub fn from_workflow(workflow: &Workflow) -> Result<Self, WorkflowError> {
        let mut graph = DiGraph::new();
        let mut index_map = HashMap::new();

        for job in &workflow.jobs {
            let idx = graph.add_node(job.id);
            index_map.insert(job.id, idx);
        }

        for edge in &workflow.edges {
            let Some(from_job) = edge.source_job() else {
                // Trigger edges carry the entry job, not a graph edge.
                if !index_map.contains_key(&edge.target) {
                    return Err(WorkflowError::UnknownJob(edge.target));
                }
                continue;
            };
            let from_idx = index_map
                .get(&from_job)
                .ok_or(WorkflowError::UnknownJob(from_job))?;
            let to_idx = index_map
                .get(&edge.target)
                .ok_or(WorkflowError::UnknownJob(edge.target))?;
            if edge.is_self_loop() {
                return Err(WorkflowError::SelfLoop(from_job));
            }
            graph.add_edge(*from_idx, *to_idx, edge.id);
        }

        Ok(Self {
            graph,
            index_map,
            entry: workflow.first_job(),
        })
    }

    /// Returns `true` if the graph contains at least one cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// The entry job (target of the trigger edge), if the document has one.
    #[must_use]
    pub fn entry(&self) -> Option<JobId> {
        self.entry
    }

    /// Jobs reachable from the entry job by following edges forward.
    ///
    /// These are the jobs a run started by the trigger can execute, and the
    /// jobs whose bodies must not be blank. The entry job itself is included.
    #[must_use]
    pub fn reachable_from_entry(&self) -> HashSet<JobId> {
        let Some(entry) = self.entry else {
            return HashSet::new();
        };
        let Some(&start) = self.index_map.get(&entry) else {
            return HashSet::new();
        };

        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if !seen.insert(self.graph[idx]) {
                continue;
            }
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                stack.push(next);
            }
        }
        seen
    }

    /// Jobs not connected to the entry job even when edge direction is
    /// ignored.
    ///
    /// A job may feed into the flow without being downstream of the entry, so
    /// connectivity is checked on the undirected graph; strictly orphaned
    /// islands are the violation.
    #[must_use]
    pub fn disconnected_from_entry(&self) -> Vec<JobId> {
        let Some(entry) = self.entry else {
            return Vec::new();
        };
        let Some(&start) = self.index_map.get(&entry) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            for next in self.graph.neighbors_undirected(idx) {
                stack.push(next);
            }
        }

        let mut disconnected: Vec<JobId> = self
            .graph
            .node_indices()
            .filter(|idx| !seen.contains(idx))
            .map(|idx| self.graph[idx])
            .collect();
        disconnected.sort_unstable();
        disconnected
    }

    /// Jobs directly downstream of the given job.
    #[must_use]
    pub fn successors(&self, id: JobId) -> Vec<JobId> {
        if let Some(&idx) = self.index_map.get(&id) {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .map(|i| self.graph[i])
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Jobs directly upstream of the given job.
    #[must_use]
    pub fn predecessors(&self, id: JobId) -> Vec<JobId> {
        if let Some(&idx) = self.index_map.get(&id) {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|i| self.graph[i])
                .collect()
        } else {
            Vec::new()
        }
    }

    /// The ids of the edges leaving the given job.
    #[must_use]
    pub fn outgoing_edge_ids(&self, id: JobId) -> Vec<EdgeId> {
        let Some(&idx) = self.index_map.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| *e.weight())
            .collect()
    }

    /// Number of jobs in the graph.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of job-to-job edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
