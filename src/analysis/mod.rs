//! Operand stack analysis
//!
//! States flow through the control-flow graph from the entry (and exception handler) nodes
//! downwards. At every node, the states arriving from all predecessors are merged into one set,
//! each state in the set is run through the [`Interpreter`], and the results become the states
//! the node hands to its successors. Loops are not iterated: their closing edges are removed up
//! front and only checked afterwards, by the loop report.

mod entry;
mod interpreter;
mod merge;
mod propagate;
mod state;

pub use crate::util::timed;
pub use entry::*;
pub use interpreter::*;
pub use merge::ANY_EXCEPTION;
pub use propagate::*;
pub use state::*;

use crate::StackError;

/// Everything the analysis found out about one node
#[derive(Clone, Debug)]
pub struct NodeStackProperty {
    /// Index of the node's instruction in the method body
    pub instruction: Option<usize>,

    /// Possible states right before the instruction
    pub states_before: StateSet,

    /// Possible states right after the instruction (empty if `error` is set)
    pub states_after: StateSet,

    /// Interpreting the instruction failed on at least one of the incoming states
    pub error: Option<StackError>,
}

impl NodeStackProperty {
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate numbers for a whole method
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct StackMetrics {
    /// Largest stack seen anywhere, in words
    pub max_stack_size: usize,

    /// Largest number of distinct states at a single node
    pub max_states_per_node: usize,

    /// Largest number of entries in a single state
    pub max_entries_per_state: usize,

    /// Nodes that got a stack property
    pub analyzed_nodes: usize,

    /// Nodes where interpretation failed
    pub errored_nodes: usize,
}

impl StackMetrics {
    fn record(&mut self, property: &NodeStackProperty) {
        self.analyzed_nodes += 1;
        if property.is_errored() {
            self.errored_nodes += 1;
        }
        for set in [&property.states_before, &property.states_after] {
            self.max_stack_size = self.max_stack_size.max(set.max_size_in_words());
            self.max_states_per_node = self.max_states_per_node.max(set.len());
            self.max_entries_per_state = self.max_entries_per_state.max(set.max_entries());
        }
    }
}
