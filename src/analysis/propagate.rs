use super::{Interpreter, NodeStackProperty, StackMetrics, StateSet};
use crate::bytecode::{LocalNames, MethodBody};
use crate::graph::{remove_back_edges, BackEdgeFinder, ControlFlowGraph, Edge, Node, NodeId};
use crate::{Error, Settings};
use log::{debug, trace, warn};

/// Result of analyzing one method
#[derive(Clone, Debug)]
pub struct StackAnalysis {
    /// Indexed by node
    properties: Vec<Option<NodeStackProperty>>,

    /// Loop-closing edges that were taken out of the graph before propagation
    back_edges: Vec<Edge>,

    metrics: StackMetrics,

    /// Names registered for handler locals without debug information
    synthetic_locals: usize,
}

impl StackAnalysis {
    /// Analyze a method whose graph may still contain loops
    ///
    /// The back edges found by `finder` are removed from `graph` first (and kept in the result
    /// for the loop report).
    pub fn analyze<F>(
        method: &MethodBody,
        graph: &mut ControlFlowGraph,
        finder: &F,
        settings: &Settings,
    ) -> Result<StackAnalysis, Error>
    where
        F: BackEdgeFinder + ?Sized,
    {
        graph.validate(method)?;
        let back_edges = remove_back_edges(graph, finder);
        let mut analysis = StackAnalysis::analyze_acyclic(method, graph, settings)?;
        analysis.back_edges = back_edges;
        Ok(analysis)
    }

    /// Analyze a method whose graph has no loops (or has had its back edges removed already)
    pub fn analyze_acyclic(
        method: &MethodBody,
        graph: &ControlFlowGraph,
        settings: &Settings,
    ) -> Result<StackAnalysis, Error> {
        graph.validate(method)?;
        let mut propagator = Propagator::new(method, graph, settings);
        propagator.run();

        let metrics = propagator.metrics;
        debug!(
            "analyzed {}/{} nodes ({} errored), max stack size {}",
            metrics.analyzed_nodes,
            graph.node_count(),
            metrics.errored_nodes,
            metrics.max_stack_size
        );
        Ok(StackAnalysis {
            properties: propagator.properties,
            back_edges: vec![],
            metrics,
            synthetic_locals: propagator.names.synthetic_count(),
        })
    }

    /// Stack property of a node (`None` if the node was never reached)
    pub fn property(&self, node: NodeId) -> Option<&NodeStackProperty> {
        self.properties.get(node.index()).and_then(Option::as_ref)
    }

    /// All analyzed nodes, in node order
    pub fn properties(&self) -> impl Iterator<Item = (NodeId, &NodeStackProperty)> {
        self.properties
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (NodeId::new(i), p)))
    }

    pub fn back_edges(&self) -> &[Edge] {
        &self.back_edges
    }

    pub fn metrics(&self) -> &StackMetrics {
        &self.metrics
    }

    /// Maximum stack size over the whole method, in words
    pub fn max_stack_size(&self) -> usize {
        self.metrics.max_stack_size
    }

    pub fn synthetic_locals(&self) -> usize {
        self.synthetic_locals
    }
}

/// Worklist walk over an acyclic graph
///
/// Visited flags live here rather than on the graph, so the graph is never mutated.
pub(super) struct Propagator<'a> {
    pub(super) method: &'a MethodBody,
    pub(super) graph: &'a ControlFlowGraph,
    pub(super) settings: &'a Settings,
    pub(super) names: LocalNames<'a>,
    pub(super) properties: Vec<Option<NodeStackProperty>>,
    node_visited: Vec<bool>,
    edge_visited: Vec<bool>,
    metrics: StackMetrics,
}

impl<'a> Propagator<'a> {
    fn new(method: &'a MethodBody, graph: &'a ControlFlowGraph, settings: &'a Settings) -> Self {
        let edge_slots = graph
            .edges()
            .map(|(id, _)| id.index() + 1)
            .max()
            .unwrap_or(0);
        Propagator {
            method,
            graph,
            settings,
            names: LocalNames::new(&method.local_variables),
            properties: vec![None; graph.node_count()],
            node_visited: vec![false; graph.node_count()],
            edge_visited: vec![false; edge_slots],
            metrics: StackMetrics::default(),
        }
    }

    fn is_ready(&self, node: &Node) -> bool {
        node.incoming()
            .iter()
            .all(|edge| self.edge_visited[edge.index()])
    }

    fn run(&mut self) {
        let graph = self.graph;
        let mut worklist: Vec<NodeId> = graph.roots();
        worklist.reverse();

        while let Some(id) = worklist.pop() {
            let node = match graph.node(id) {
                Some(node) => node,
                None => continue,
            };
            if self.node_visited[id.index()] || !self.is_ready(node) {
                continue;
            }

            let property = self.process(id, node);
            self.node_visited[id.index()] = true;
            self.metrics.record(&property);

            if let Some(err) = &property.error {
                warn!(
                    "{} ({} at {}): {}, successors left unanalyzed",
                    id, node.mnemonic, node.offset, err
                );
            } else {
                for edge in node.outgoing() {
                    self.edge_visited[edge.index()] = true;
                }
                // Reversed so the first successor is popped first
                let successors: Vec<NodeId> = graph.successors(id).collect();
                worklist.extend(successors.into_iter().rev());
            }
            self.properties[id.index()] = Some(property);
        }
    }

    /// Merge the incoming states and run them through the node's instruction
    fn process(&mut self, id: NodeId, node: &Node) -> NodeStackProperty {
        let states_before = self.states_before(id, node);
        let line = node
            .instruction
            .and_then(|index| self.method.instructions.get(index));

        let mut states_after = StateSet::new();
        let mut error = None;
        match line {
            None => states_after = states_before.clone(),
            Some(line) => {
                let interpreter = Interpreter::new(
                    &self.method.constants,
                    &self.names,
                    &self.settings.placeholder,
                );
                for state in &states_before {
                    let mut state = state.clone();
                    if let Err(err) = interpreter.interpret(line, &mut state) {
                        error = Some(err);
                        states_after = StateSet::new();
                        break;
                    }
                    states_after.insert(state);
                }
            }
        }

        trace!(
            "{} ({} at {}): {} state(s) before, {} after",
            id,
            node.mnemonic,
            node.offset,
            states_before.len(),
            states_after.len()
        );

        NodeStackProperty {
            instruction: node.instruction,
            states_before,
            states_after,
            error,
        }
    }
}
