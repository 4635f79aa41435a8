#![allow(dead_code)]

use opstack::analysis::StackAnalysis;
use opstack::bytecode::{ConstantPool, InstructionLine, MethodBody};
use opstack::graph::{ControlFlowGraph, DepthFirstBackEdges, NodeId};
use opstack::Settings;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A method along with a hand-built control-flow graph
pub struct Fixture {
    pub method: MethodBody,
    pub graph: ControlFlowGraph,
    pub nodes: Vec<NodeId>,
}

impl Fixture {
    /// One node per instruction, with edges given as pairs of offsets
    pub fn new(lines: Vec<InstructionLine>, edges: &[(u32, u32)]) -> Fixture {
        let mut method = MethodBody::new(lines, ConstantPool::new());
        method.max_stack = 16;

        let mut graph = ControlFlowGraph::new();
        let nodes = graph.add_instruction_nodes(&method);
        for (source, target) in edges {
            let source = method.index_of_offset(*source).expect("source offset");
            let target = method.index_of_offset(*target).expect("target offset");
            graph.add_edge(nodes[source], nodes[target]).unwrap();
        }

        Fixture {
            method,
            graph,
            nodes,
        }
    }

    /// Straight-line code: every instruction falls through to the next
    pub fn linear(lines: Vec<InstructionLine>) -> Fixture {
        let offsets: Vec<u32> = lines.iter().map(|line| line.offset).collect();
        let edges: Vec<(u32, u32)> = offsets.windows(2).map(|w| (w[0], w[1])).collect();
        Fixture::new(lines, &edges)
    }

    /// Node of the instruction at an offset
    pub fn node_at(&self, offset: u32) -> NodeId {
        let index = self.method.index_of_offset(offset).expect("offset");
        self.nodes[index]
    }

    pub fn analyze(&mut self) -> StackAnalysis {
        self.analyze_with(&Settings::default())
    }

    pub fn analyze_with(&mut self, settings: &Settings) -> StackAnalysis {
        init_logging();
        StackAnalysis::analyze(&self.method, &mut self.graph, &DepthFirstBackEdges, settings)
            .unwrap()
    }
}

/// Signatures of the states before the instruction at an offset
pub fn before(fixture: &Fixture, analysis: &StackAnalysis, offset: u32) -> Vec<String> {
    let property = analysis.property(fixture.node_at(offset)).expect("analyzed");
    property.states_before.signatures()
}

/// Signatures of the states after the instruction at an offset
pub fn after(fixture: &Fixture, analysis: &StackAnalysis, offset: u32) -> Vec<String> {
    let property = analysis.property(fixture.node_at(offset)).expect("analyzed");
    property.states_after.signatures()
}
