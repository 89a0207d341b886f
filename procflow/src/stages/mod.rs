//! The procurement workflow stages.
//!
//! Three stages consumed through the uniform [`crate::stage::Stage`]
//! contract: intake parses the free-form request, supplier resolves a
//! preferred vendor, approval applies the quantity policy. Each stage
//! extends the user-level `logs` field by returning the full updated
//! sequence; the engine's own audit trail is the trace.

mod approval;
mod intake;
mod supplier;

pub use approval::ApprovalStage;
pub use intake::IntakeStage;
pub use supplier::{SupplierStage, UNKNOWN_SUPPLIER};

use crate::config::WorkflowConfig;
use crate::errors::GraphError;
use crate::graph::{GraphDefinition, ENTRY, EXIT};
use std::sync::Arc;

/// Reduces a word to its singular form.
///
/// Documented heuristic: strip a trailing "s" unless the word ends in "ss"
/// ("glass" stays "glass"). Irregular plurals are out of scope; do not
/// extend this without product input.
pub(crate) fn singularize(word: &str) -> String {
    if word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Builds the canonical procurement graph:
/// ENTRY -> intake -> supplier -> approval -> EXIT.
///
/// # Errors
///
/// Returns [`GraphError`] if the wiring is invalid; with the fixed node
/// names used here that indicates a bug in this function.
pub fn procurement_graph(config: &WorkflowConfig) -> Result<GraphDefinition, GraphError> {
    let mut graph = GraphDefinition::new();
    graph.add_node("intake", Arc::new(IntakeStage::new()))?;
    graph.add_node("supplier", Arc::new(SupplierStage::new(config)))?;
    graph.add_node("approval", Arc::new(ApprovalStage::new(config)))?;

    graph.add_edge(ENTRY, "intake")?;
    graph.add_edge("intake", "supplier")?;
    graph.add_edge("supplier", "approval")?;
    graph.add_edge("approval", EXIT)?;

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularize_heuristic() {
        assert_eq!(singularize("laptops"), "laptop");
        assert_eq!(singularize("chair"), "chair");
        assert_eq!(singularize("glass"), "glass");
    }

    #[test]
    fn procurement_graph_is_a_valid_linear_chain() {
        let graph = procurement_graph(&WorkflowConfig::default()).unwrap();
        assert!(graph.validate().is_ok());
        assert_eq!(graph.node_names(), &["intake", "supplier", "approval"]);
    }
}
