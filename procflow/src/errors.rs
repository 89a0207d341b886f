//! Error types for the procflow engine.
//!
//! Build-time problems (duplicate nodes, unknown edge endpoints, cycles,
//! unreachable nodes) are reported as [`GraphError`] and are always fatal to
//! the build. Run-time stage failures surface as
//! [`PipelineError::StageExecution`] and abort the run; the executor never
//! swallows an error to produce a degraded state.

use thiserror::Error;

/// Errors raised while building, validating or compiling a graph definition.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node name is already registered or is a reserved sentinel.
    #[error("cannot register node '{name}': {reason}")]
    DuplicateNode {
        /// The offending node name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// An edge endpoint was never registered via `add_node`.
    #[error("unknown node '{name}' referenced by an edge")]
    UnknownNode {
        /// The unregistered node name.
        name: String,
    },

    /// The edge set contains a cycle.
    #[error("cycle detected in graph: {}", path.join(" -> "))]
    Cycle {
        /// The path of nodes forming the cycle, ending where it started.
        path: Vec<String>,
    },

    /// A registered node is not on any ENTRY -> EXIT path.
    #[error("unreachable node '{node}': {reason}")]
    UnreachableNode {
        /// The node outside the reachable region.
        node: String,
        /// Which direction of reachability failed.
        reason: String,
    },

    /// A node has more than one unconditional outgoing edge.
    ///
    /// The static plan cannot pick between fixed successors; branching is
    /// expressed with a conditional edge instead.
    #[error("node '{node}' has multiple unconditional outgoing edges; use a conditional edge to branch")]
    AmbiguousSuccessor {
        /// The node with the ambiguous fan-out.
        node: String,
    },
}

/// Errors raised while compiling or invoking a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Graph validation or compilation failed.
    #[error(transparent)]
    Build(#[from] GraphError),

    /// A stage failed during execution.
    ///
    /// The run is aborted; no final state is returned. Prior fragments are
    /// not rolled back, the run as a whole is reported failed.
    #[error("stage '{stage}' failed: {source}")]
    StageExecution {
        /// The node name of the failing stage.
        stage: String,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// The executor reached a state the compiled plan does not cover.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Returns the name of the failing stage, if this is a stage failure.
    #[must_use]
    pub fn failing_stage(&self) -> Option<&str> {
        match self {
            Self::StageExecution { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Errors raised while loading a workflow configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for [`crate::config::WorkflowConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_renders_path() {
        let err = GraphError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn stage_execution_names_stage() {
        let err = PipelineError::StageExecution {
            stage: "intake".into(),
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.failing_stage(), Some("intake"));
        assert!(err.to_string().contains("intake"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn build_error_converts() {
        let err: PipelineError = GraphError::UnknownNode { name: "x".into() }.into();
        assert!(matches!(err, PipelineError::Build(_)));
        assert_eq!(err.failing_stage(), None);
    }
}
