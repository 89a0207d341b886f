//! Graph definition and build-time validation.
//!
//! A [`GraphDefinition`] registers named stages as nodes and records directed
//! edges between them, including the two reserved sentinels [`ENTRY`] and
//! [`EXIT`] that carry no stage. The definition is mutable during the build
//! phase only; [`crate::pipeline::CompiledPipeline::compile`] validates it
//! and freezes an execution plan.
//!
//! The edge model is a general directed graph: a node may have several
//! outgoing edges, and an edge target may be chosen dynamically by a
//! [`Router`] consulted with the current state. The present procurement
//! topology is a fixed linear chain; the generality is an extension point,
//! not an observed requirement.

use crate::errors::GraphError;
use crate::stage::Stage;
use crate::state::State;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::sync::Arc;

/// Reserved sentinel marking where a run begins. Carries no stage.
pub const ENTRY: &str = "__entry__";

/// Reserved sentinel marking where a run ends. Carries no stage.
pub const EXIT: &str = "__exit__";

/// Returns `true` for the reserved sentinel names.
#[must_use]
pub fn is_sentinel(name: &str) -> bool {
    name == ENTRY || name == EXIT
}

/// Selects the next node for a conditional edge, given the current state.
///
/// Routers are consulted after the originating node's fragment has been
/// merged, so the decision sees that node's output. The chosen name must be
/// one of the targets declared when the edge was added.
pub trait Router: Send + Sync + Debug {
    /// Returns the name of the node to advance to.
    fn route(&self, state: &State) -> String;
}

/// A simple function-based router.
pub struct FnRouter<F>
where
    F: Fn(&State) -> String + Send + Sync,
{
    func: F,
}

impl<F> FnRouter<F>
where
    F: Fn(&State) -> String + Send + Sync,
{
    /// Creates a new function-based router.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnRouter<F>
where
    F: Fn(&State) -> String + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRouter").finish()
    }
}

impl<F> Router for FnRouter<F>
where
    F: Fn(&State) -> String + Send + Sync,
{
    fn route(&self, state: &State) -> String {
        (self.func)(state)
    }
}

/// The target side of a directed edge.
#[derive(Debug, Clone)]
pub(crate) enum EdgeTarget {
    /// A fixed successor node.
    Fixed(String),
    /// A successor chosen at run time from a declared target set.
    Conditional {
        router: Arc<dyn Router>,
        targets: Vec<String>,
    },
}

/// A directed edge recorded during the build phase.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    pub from: String,
    pub target: EdgeTarget,
}

/// The declared set of nodes and edges before validation and compilation.
#[derive(Debug, Default)]
pub struct GraphDefinition {
    nodes: HashMap<String, Arc<dyn Stage>>,
    node_order: Vec<String>,
    edges: Vec<Edge>,
}

impl GraphDefinition {
    /// Creates an empty graph definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage under a unique node name.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNode`] if the name is already
    /// registered or is a reserved sentinel.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        stage: Arc<dyn Stage>,
    ) -> Result<(), GraphError> {
        let name = name.into();
        if is_sentinel(&name) {
            return Err(GraphError::DuplicateNode {
                name,
                reason: "the name is a reserved sentinel".to_string(),
            });
        }
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode {
                name,
                reason: "a node with this name is already registered".to_string(),
            });
        }
        self.node_order.push(name.clone());
        self.nodes.insert(name, stage);
        Ok(())
    }

    /// Records a directed edge between two nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either endpoint (other than a
    /// sentinel) was not registered via [`Self::add_node`].
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        self.check_endpoint(from)?;
        self.check_endpoint(to)?;
        self.edges.push(Edge {
            from: from.to_string(),
            target: EdgeTarget::Fixed(to.to_string()),
        });
        Ok(())
    }

    /// Records a conditional edge whose target is chosen by `router` at run
    /// time, from the declared `targets`.
    ///
    /// Not exercised by the linear procurement chain; this is the branching
    /// extension point.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the source or any declared
    /// target (other than a sentinel) is unregistered.
    pub fn add_conditional_edge(
        &mut self,
        from: &str,
        router: Arc<dyn Router>,
        targets: &[&str],
    ) -> Result<(), GraphError> {
        self.check_endpoint(from)?;
        for target in targets {
            self.check_endpoint(target)?;
        }
        self.edges.push(Edge {
            from: from.to_string(),
            target: EdgeTarget::Conditional {
                router,
                targets: targets.iter().map(|s| (*s).to_string()).collect(),
            },
        });
        Ok(())
    }

    /// Validates the graph: the edge set must be acyclic, every registered
    /// node must be reachable from ENTRY, and every registered node must be
    /// able to reach EXIT.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Cycle`] or [`GraphError::UnreachableNode`].
    pub fn validate(&self) -> Result<(), GraphError> {
        let adjacency = self.adjacency();
        self.detect_cycles(&adjacency)?;

        let from_entry = reachable_from(ENTRY, &adjacency);
        for name in &self.node_order {
            if !from_entry.contains(name.as_str()) {
                return Err(GraphError::UnreachableNode {
                    node: name.clone(),
                    reason: "not reachable from ENTRY".to_string(),
                });
            }
        }

        let reverse = reverse_adjacency(&adjacency);
        let to_exit = reachable_from(EXIT, &reverse);
        for name in &self.node_order {
            if !to_exit.contains(name.as_str()) {
                return Err(GraphError::UnreachableNode {
                    node: name.clone(),
                    reason: "cannot reach EXIT".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Returns the stage registered under `name`, if any.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Arc<dyn Stage>> {
        self.nodes.get(name)
    }

    /// Returns `true` if a node named `name` is registered.
    #[must_use]
    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the registered node names in insertion order.
    #[must_use]
    pub fn node_names(&self) -> &[String] {
        &self.node_order
    }

    pub(crate) fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn nodes(&self) -> &HashMap<String, Arc<dyn Stage>> {
        &self.nodes
    }

    fn check_endpoint(&self, name: &str) -> Result<(), GraphError> {
        if is_sentinel(name) || self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode {
                name: name.to_string(),
            })
        }
    }

    /// Successor lists keyed by node, with conditional edges expanded to
    /// every declared target.
    fn adjacency(&self) -> HashMap<&str, Vec<&str>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            let successors = adjacency.entry(edge.from.as_str()).or_default();
            match &edge.target {
                EdgeTarget::Fixed(to) => successors.push(to.as_str()),
                EdgeTarget::Conditional { targets, .. } => {
                    successors.extend(targets.iter().map(String::as_str));
                }
            }
        }
        adjacency
    }

    fn detect_cycles(&self, adjacency: &HashMap<&str, Vec<&str>>) -> Result<(), GraphError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        let mut roots: Vec<&str> = vec![ENTRY];
        roots.extend(self.node_order.iter().map(String::as_str));

        for root in roots {
            if !visited.contains(root) {
                if let Some(cycle) =
                    dfs_cycle(root, adjacency, &mut visited, &mut rec_stack, &mut path)
                {
                    return Err(GraphError::Cycle { path: cycle });
                }
            }
        }
        Ok(())
    }
}

fn dfs_cycle(
    node: &str,
    adjacency: &HashMap<&str, Vec<&str>>,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(successors) = adjacency.get(node) {
        for &next in successors {
            if !visited.contains(next) {
                if let Some(cycle) = dfs_cycle(next, adjacency, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(next) {
                let cycle_start = path.iter().position(|n| n == next)?;
                let mut cycle: Vec<String> = path[cycle_start..].to_vec();
                cycle.push(next.to_string());
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(node);
    None
}

fn reachable_from<'a>(start: &'a str, adjacency: &HashMap<&'a str, Vec<&'a str>>) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    seen.insert(start);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        if let Some(successors) = adjacency.get(node) {
            for &next in successors {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    seen
}

fn reverse_adjacency<'a>(adjacency: &HashMap<&'a str, Vec<&'a str>>) -> HashMap<&'a str, Vec<&'a str>> {
    let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
    for (&from, successors) in adjacency {
        for &to in successors {
            reverse.entry(to).or_default().push(from);
        }
    }
    reverse
}
