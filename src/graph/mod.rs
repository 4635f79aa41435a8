//! Control-flow graph handed to the analysis
//!
//! Nodes and edges live in arenas and are referred to by [`NodeId`] and [`EdgeId`]. Removing an
//! edge leaves a hole behind so that ids handed out earlier stay valid.

mod back_edges;

pub use back_edges::*;

use crate::bytecode::{InstructionLine, MethodBody, Opcode};
use crate::Error;
use std::fmt;

/// Identifier of a node in a [`ControlFlowGraph`]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier of an edge in a [`ControlFlowGraph`]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(usize);

impl EdgeId {
    pub const fn new(index: usize) -> Self {
        EdgeId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Shape of a vertex, as a diagram would draw it
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum VertexKind {
    Simple,
    If,
    Switch,
    Return,
    Invoke,
    FieldGet,

    /// Synthetic method entry
    Start,

    /// Synthetic method exit
    Exit,
}

impl VertexKind {
    /// Classify an instruction
    pub fn for_opcode(opcode: Opcode) -> VertexKind {
        match opcode {
            Opcode::TableSwitch | Opcode::LookupSwitch => VertexKind::Switch,
            Opcode::GetField | Opcode::GetStatic => VertexKind::FieldGet,
            op if op.is_conditional_branch() => VertexKind::If,
            op if op.is_return() => VertexKind::Return,
            op if op.is_invoke() => VertexKind::Invoke,
            _ => VertexKind::Simple,
        }
    }
}

/// Vertex of the control-flow graph
#[derive(Clone, Debug)]
pub struct Node {
    /// Byte offset of the instruction (synthetic nodes pick their own)
    pub offset: u32,

    pub mnemonic: String,

    pub kind: VertexKind,

    /// Index into `MethodBody::instructions`, absent for synthetic start/exit nodes
    pub instruction: Option<usize>,

    incoming: Vec<EdgeId>,
    outgoing: Vec<EdgeId>,
}

impl Node {
    /// Node standing for one instruction of a method
    pub fn for_instruction(index: usize, line: &InstructionLine) -> Node {
        Node {
            offset: line.offset,
            mnemonic: line.opcode.mnemonic().to_owned(),
            kind: VertexKind::for_opcode(line.opcode),
            instruction: Some(index),
            incoming: vec![],
            outgoing: vec![],
        }
    }

    /// Node without an instruction
    pub fn synthetic(kind: VertexKind, offset: u32) -> Node {
        let mnemonic = match kind {
            VertexKind::Start => "start",
            VertexKind::Exit => "exit",
            _ => "",
        };
        Node {
            offset,
            mnemonic: mnemonic.to_owned(),
            kind,
            instruction: None,
            incoming: vec![],
            outgoing: vec![],
        }
    }

    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }
}

/// Directed control-flow edge
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

/// Directed graph of nodes and edges
#[derive(Clone, Default, Debug)]
pub struct ControlFlowGraph {
    nodes: Vec<Node>,
    edges: Vec<Option<Edge>>,
}

impl ControlFlowGraph {
    pub fn new() -> ControlFlowGraph {
        ControlFlowGraph::default()
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add one node per instruction of the method, in order (edges are up to the caller)
    pub fn add_instruction_nodes(&mut self, method: &MethodBody) -> Vec<NodeId> {
        method
            .instructions
            .iter()
            .enumerate()
            .map(|(index, line)| self.add_node(Node::for_instruction(index, line)))
            .collect()
    }

    /// Connect two existing nodes
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId, Error> {
        for node in [source, target] {
            if node.0 >= self.nodes.len() {
                return Err(Error::UnknownNode(node));
            }
        }
        let id = EdgeId(self.edges.len());
        self.edges.push(Some(Edge { source, target }));
        self.nodes[source.0].outgoing.push(id);
        self.nodes[target.0].incoming.push(id);
        Ok(id)
    }

    /// Remove an edge from the edge list and from both endpoints
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, Error> {
        let edge = self
            .edges
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(Error::UnknownEdge(id))?;
        self.nodes[edge.source.0].outgoing.retain(|e| *e != id);
        self.nodes[edge.target.0].incoming.retain(|e| *e != id);
        Ok(edge)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges still in the graph
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Ids of all nodes, in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i), e)))
    }

    /// Targets of the outgoing edges of a node, in edge order
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.outgoing.iter())
            .filter_map(move |e| self.edge(*e).map(|edge| edge.target))
    }

    /// Sources of the incoming edges of a node, in edge order
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.incoming.iter())
            .filter_map(move |e| self.edge(*e).map(|edge| edge.source))
    }

    /// Nodes with no incoming edges, in node order
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, node)| node.incoming.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Check that every node refers to an instruction the method actually has
    pub fn validate(&self, method: &MethodBody) -> Result<(), Error> {
        for (id, node) in self.nodes() {
            if let Some(index) = node.instruction {
                if index >= method.instructions.len() {
                    return Err(Error::UnknownInstruction { node: id, index });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn diamond() -> (ControlFlowGraph, Vec<NodeId>) {
        let mut graph = ControlFlowGraph::new();
        let nodes: Vec<NodeId> = (0..4)
            .map(|i| graph.add_node(Node::synthetic(VertexKind::Simple, i)))
            .collect();
        graph.add_edge(nodes[0], nodes[1]).unwrap();
        graph.add_edge(nodes[0], nodes[2]).unwrap();
        graph.add_edge(nodes[1], nodes[3]).unwrap();
        graph.add_edge(nodes[2], nodes[3]).unwrap();
        (graph, nodes)
    }

    #[test]
    fn incidence_lists() {
        let (graph, nodes) = diamond();
        assert_eq!(graph.roots(), vec![nodes[0]]);
        assert_eq!(
            graph.successors(nodes[0]).collect::<Vec<_>>(),
            vec![nodes[1], nodes[2]]
        );
        assert_eq!(
            graph.predecessors(nodes[3]).collect::<Vec<_>>(),
            vec![nodes[1], nodes[2]]
        );
    }

    #[test]
    fn removing_edges_keeps_ids() {
        let (mut graph, nodes) = diamond();
        let removed = graph.remove_edge(EdgeId::new(1)).unwrap();
        assert_eq!(removed, Edge { source: nodes[0], target: nodes[2] });
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.roots(), vec![nodes[0], nodes[2]]);
        assert!(graph.edge(EdgeId::new(3)).is_some());
        assert!(matches!(
            graph.remove_edge(EdgeId::new(1)),
            Err(Error::UnknownEdge(e)) if e == EdgeId::new(1)
        ));
    }

    #[test]
    fn edges_to_unknown_nodes() {
        let (mut graph, nodes) = diamond();
        assert!(matches!(
            graph.add_edge(nodes[0], NodeId::new(9)),
            Err(Error::UnknownNode(n)) if n == NodeId::new(9)
        ));
    }

    #[test]
    fn vertex_kinds() {
        assert_eq!(VertexKind::for_opcode(Opcode::IfNull), VertexKind::If);
        assert_eq!(VertexKind::for_opcode(Opcode::LookupSwitch), VertexKind::Switch);
        assert_eq!(VertexKind::for_opcode(Opcode::AThrow), VertexKind::Return);
        assert_eq!(VertexKind::for_opcode(Opcode::InvokeDynamic), VertexKind::Invoke);
        assert_eq!(VertexKind::for_opcode(Opcode::GetStatic), VertexKind::FieldGet);
        assert_eq!(VertexKind::for_opcode(Opcode::IAdd), VertexKind::Simple);
    }

    #[test]
    fn instruction_indices_are_checked() {
        let mut graph = ControlFlowGraph::new();
        let method = MethodBody::default();
        let line = InstructionLine::new(0, Opcode::Nop);
        let id = graph.add_node(Node::for_instruction(0, &line));
        assert!(matches!(
            graph.validate(&method),
            Err(Error::UnknownInstruction { node, index: 0 }) if node == id
        ));
    }
}
