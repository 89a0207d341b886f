//! Pipeline compilation and execution.
//!
//! This module provides:
//! - Compilation of a validated [`crate::graph::GraphDefinition`] into an
//!   immutable execution plan
//! - The executor that walks the plan, merges stage fragments and records
//!   the trace

mod compile;
mod executor;

#[cfg(test)]
mod integration_tests;

pub use compile::CompiledPipeline;
