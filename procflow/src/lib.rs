//! # Procflow
//!
//! A small graph-based request-processing pipeline engine.
//!
//! Procflow threads a shared [`State`](state::State) record through a
//! directed graph of named stages:
//!
//! - **Stage-based execution**: each stage consumes a read-only state
//!   snapshot and returns a partial update (a [`Fragment`](state::Fragment))
//! - **Single merge point**: the executor owns the shallow merge of each
//!   fragment into the running state
//! - **Build-time validation**: duplicate nodes, unknown edge endpoints,
//!   cycles and unreachable nodes are all rejected before anything runs
//! - **Execution trace**: every run records which stages ran and what they
//!   produced, in order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use procflow::prelude::*;
//!
//! let mut graph = GraphDefinition::new();
//! graph.add_node("parse", Arc::new(ParseStage::new()))?;
//! graph.add_edge(ENTRY, "parse")?;
//! graph.add_edge("parse", EXIT)?;
//!
//! let pipeline = CompiledPipeline::compile(&graph)?;
//! let final_state = pipeline.invoke(&initial_state).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod graph;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::WorkflowConfig;
    pub use crate::errors::{ConfigError, GraphError, PipelineError};
    pub use crate::graph::{FnRouter, GraphDefinition, Router, ENTRY, EXIT};
    pub use crate::pipeline::CompiledPipeline;
    pub use crate::stage::{FnStage, NoOpStage, Stage};
    pub use crate::stages::{
        procurement_graph, ApprovalStage, IntakeStage, SupplierStage,
    };
    pub use crate::state::{Fragment, State, TraceEntry};
}
