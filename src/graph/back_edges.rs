use super::{ControlFlowGraph, Edge, EdgeId, NodeId};
use log::debug;

/// Algorithm that picks the loop-closing edges of a graph
pub trait BackEdgeFinder {
    fn find_back_edges(&self, graph: &ControlFlowGraph) -> Vec<EdgeId>;
}

/// Back edges by depth-first search
///
/// An edge is a back edge if it leads to a node that is still on the DFS stack. Search starts at
/// every node without predecessors (in node order), then at whatever is left unvisited, so cycles
/// unreachable from a root get broken too.
#[derive(Copy, Clone, Default, Debug)]
pub struct DepthFirstBackEdges;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

impl BackEdgeFinder for DepthFirstBackEdges {
    fn find_back_edges(&self, graph: &ControlFlowGraph) -> Vec<EdgeId> {
        let mut colours = vec![Colour::White; graph.node_count()];
        let mut back_edges = vec![];

        let starts = graph.roots().into_iter().chain(graph.node_ids());
        for start in starts {
            if colours[start.index()] != Colour::White {
                continue;
            }

            // Each frame is a node and the position of the next outgoing edge to explore
            let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];
            colours[start.index()] = Colour::Grey;

            while let Some((node, next)) = stack.last_mut() {
                let outgoing = graph.node(*node).map_or(&[][..], |n| n.outgoing());
                if let Some(edge_id) = outgoing.get(*next).copied() {
                    *next += 1;
                    let target = match graph.edge(edge_id) {
                        Some(edge) => edge.target,
                        None => continue,
                    };
                    match colours[target.index()] {
                        Colour::White => {
                            colours[target.index()] = Colour::Grey;
                            stack.push((target, 0));
                        }
                        Colour::Grey => back_edges.push(edge_id),
                        Colour::Black => (),
                    }
                } else {
                    colours[node.index()] = Colour::Black;
                    stack.pop();
                }
            }
        }

        back_edges
    }
}

/// Remove the loop-closing edges from a graph, returning them
///
/// The edges are taken out of the edge list and out of both endpoints' incidence lists, leaving
/// an acyclic graph behind.
pub fn remove_back_edges<F>(graph: &mut ControlFlowGraph, finder: &F) -> Vec<Edge>
where
    F: BackEdgeFinder + ?Sized,
{
    let mut removed = vec![];
    for edge_id in finder.find_back_edges(graph) {
        if let Ok(edge) = graph.remove_edge(edge_id) {
            removed.push(edge);
        }
    }
    debug!("removed {} back edge(s)", removed.len());
    removed
}
