//! Compilation of a graph definition into an immutable execution plan.

use crate::errors::GraphError;
use crate::graph::{EdgeTarget, GraphDefinition, Router, ENTRY, EXIT};
use crate::stage::Stage;
use std::collections::HashMap;
use std::sync::Arc;

/// The planned successor of a node.
#[derive(Debug, Clone)]
pub(crate) enum Successor {
    /// A fixed next node.
    Fixed(String),
    /// A next node chosen at run time from the declared targets.
    Routed {
        router: Arc<dyn Router>,
        targets: Vec<String>,
    },
}

/// A validated, reusable execution plan.
///
/// Compilation is pure: a compiled pipeline holds no mutable shared state
/// and may be invoked concurrently from independent call sites; each
/// [`invoke`](CompiledPipeline::invoke) allocates its own state chain.
#[derive(Debug)]
pub struct CompiledPipeline {
    nodes: HashMap<String, Arc<dyn Stage>>,
    successors: HashMap<String, Successor>,
    static_order: Option<Vec<String>>,
}

impl CompiledPipeline {
    /// Validates `graph` and derives the execution plan.
    ///
    /// # Errors
    ///
    /// Returns any [`GraphError`] from [`GraphDefinition::validate`], plus
    /// [`GraphError::AmbiguousSuccessor`] for a node with more than one
    /// unconditional outgoing edge and [`GraphError::UnreachableNode`] when
    /// ENTRY has no outgoing edge at all.
    pub fn compile(graph: &GraphDefinition) -> Result<Self, GraphError> {
        graph.validate()?;

        let mut successors: HashMap<String, Successor> = HashMap::new();
        for edge in graph.edges() {
            let successor = match &edge.target {
                EdgeTarget::Fixed(to) => Successor::Fixed(to.clone()),
                EdgeTarget::Conditional { router, targets } => Successor::Routed {
                    router: router.clone(),
                    targets: targets.clone(),
                },
            };
            if successors.insert(edge.from.clone(), successor).is_some() {
                return Err(GraphError::AmbiguousSuccessor {
                    node: edge.from.clone(),
                });
            }
        }

        if !successors.contains_key(ENTRY) {
            return Err(GraphError::UnreachableNode {
                node: ENTRY.to_string(),
                reason: "no outgoing edge".to_string(),
            });
        }

        let static_order = static_order(&successors);

        Ok(Self {
            nodes: graph.nodes().clone(),
            successors,
            static_order,
        })
    }

    /// Returns the number of stages in the plan.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the ENTRY-to-EXIT node order when the plan has no routed
    /// edges, or `None` for a branching plan.
    #[must_use]
    pub fn execution_order(&self) -> Option<&[String]> {
        self.static_order.as_deref()
    }

    pub(crate) fn stage(&self, name: &str) -> Option<&Arc<dyn Stage>> {
        self.nodes.get(name)
    }

    pub(crate) fn successor(&self, name: &str) -> Option<&Successor> {
        self.successors.get(name)
    }
}

/// Follows fixed successors from ENTRY; bails on the first routed edge.
fn static_order(successors: &HashMap<String, Successor>) -> Option<Vec<String>> {
    let mut order = Vec::new();
    let mut current = ENTRY.to_string();
    loop {
        match successors.get(&current)? {
            Successor::Fixed(next) if next == EXIT => return Some(order),
            Successor::Fixed(next) => {
                order.push(next.clone());
                current = next.clone();
            }
            Successor::Routed { .. } => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FnRouter;
    use crate::stage::NoOpStage;
    use crate::state::State;

    fn noop(name: &str) -> Arc<dyn Stage> {
        Arc::new(NoOpStage::new(name))
    }

    fn linear_chain(names: &[&str]) -> GraphDefinition {
        let mut graph = GraphDefinition::new();
        for name in names {
            graph.add_node(*name, noop(name)).unwrap();
        }
        let mut prev = ENTRY;
        for name in names {
            graph.add_edge(prev, name).unwrap();
            prev = name;
        }
        graph.add_edge(prev, EXIT).unwrap();
        graph
    }

    #[test]
    fn compile_computes_linear_order() {
        let graph = linear_chain(&["a", "b", "c"]);
        let pipeline = CompiledPipeline::compile(&graph).unwrap();

        assert_eq!(pipeline.stage_count(), 3);
        let order: Vec<&str> = pipeline
            .execution_order()
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn compile_rejects_cyclic_graph() {
        let mut graph = GraphDefinition::new();
        graph.add_node("a", noop("a")).unwrap();
        graph.add_node("b", noop("b")).unwrap();
        graph.add_edge(ENTRY, "a").unwrap();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("b", "a").unwrap();
        graph.add_edge("b", EXIT).unwrap();

        assert!(matches!(
            CompiledPipeline::compile(&graph),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn compile_rejects_empty_graph() {
        let graph = GraphDefinition::new();
        let err = CompiledPipeline::compile(&graph).unwrap_err();
        assert!(matches!(err, GraphError::UnreachableNode { ref node, .. } if node == ENTRY));
    }

    #[test]
    fn compile_rejects_multiple_unconditional_successors() {
        let mut graph = GraphDefinition::new();
        graph.add_node("a", noop("a")).unwrap();
        graph.add_node("b", noop("b")).unwrap();
        graph.add_node("c", noop("c")).unwrap();
        graph.add_edge(ENTRY, "a").unwrap();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("a", "c").unwrap();
        graph.add_edge("b", EXIT).unwrap();
        graph.add_edge("c", EXIT).unwrap();

        let err = CompiledPipeline::compile(&graph).unwrap_err();
        assert!(matches!(err, GraphError::AmbiguousSuccessor { ref node } if node == "a"));
    }

    #[test]
    fn routed_plan_has_no_static_order() {
        let mut graph = GraphDefinition::new();
        graph.add_node("a", noop("a")).unwrap();
        graph.add_node("b", noop("b")).unwrap();
        graph.add_node("c", noop("c")).unwrap();
        graph.add_edge(ENTRY, "a").unwrap();
        let router = Arc::new(FnRouter::new(|_: &State| "b".to_string()));
        graph.add_conditional_edge("a", router, &["b", "c"]).unwrap();
        graph.add_edge("b", EXIT).unwrap();
        graph.add_edge("c", EXIT).unwrap();

        let pipeline = CompiledPipeline::compile(&graph).unwrap();
        assert!(pipeline.execution_order().is_none());
    }
}
