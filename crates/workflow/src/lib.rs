#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Tapestry Workflow
//!
//! The workflow document model for the Tapestry collaboration engine.
//!
//! This crate provides the types for a DAG-shaped workflow document — jobs
//! connected by conditional edges, entered through a trigger — together with
//! the structural edit and validation machinery the mutation engine builds
//! on. It includes:
//!
//! - [`Workflow`], the mutable aggregate root owning its nodes and edges
//! - [`Job`], [`Trigger`], and [`Edge`] with [`EdgeCondition`]
//! - [`WorkflowGraph`] (a `petgraph` wrapper) for cycle, reachability, and
//!   connectivity checks
//! - [`Patch`]/[`PatchOp`] and [`apply_patch`] for all-or-nothing structural
//!   edits
//! - [`WorkflowBuilder`] for fluent, validated construction
//! - [`validate_workflow`] for comprehensive multi-error validation

pub mod builder;
pub mod document;
pub mod edge;
pub mod error;
pub mod graph;
pub mod job;
pub mod patch;
pub mod trigger;
pub mod validate;

pub use builder::WorkflowBuilder;
pub use document::Workflow;
pub use edge::{Edge, EdgeCondition, EdgeSource};
pub use error::WorkflowError;
pub use graph::WorkflowGraph;
pub use job::Job;
pub use patch::{Patch, PatchOp, apply_patch};
pub use trigger::{Trigger, TriggerKind};
pub use validate::validate_workflow;
