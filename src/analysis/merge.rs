use super::propagate::Propagator;
use super::{StackEntry, StackState, StateSet, ValueType};
use crate::bytecode::ExceptionTableEntry;
use crate::graph::{Node, NodeId};
use log::{trace, warn};

/// Value of the exception pushed at the start of a catch-all handler
pub const ANY_EXCEPTION: &str = "<any exception>";

impl<'a> Propagator<'a> {
    /// States on entry to a node
    ///
    /// Nodes with predecessors get the union of their predecessors' outgoing states. Nodes
    /// without predecessors are either the method entry (offset 0, empty stack) or the start of
    /// an exception handler (the caught exception on an otherwise empty stack).
    pub(super) fn states_before(&mut self, id: NodeId, node: &Node) -> StateSet {
        if node.incoming().is_empty() {
            if node.offset == 0 {
                StateSet::single_empty()
            } else {
                self.handler_entry_states(id, node)
            }
        } else {
            let mut merged = StateSet::new();
            for predecessor in self.graph.predecessors(id) {
                match self.properties[predecessor.index()].as_ref() {
                    Some(property) => merged.extend(property.states_after.iter().cloned()),
                    None => warn!("{}: predecessor {} has no states", id, predecessor),
                }
            }
            merged
        }
    }

    fn handler_entry_states(&mut self, id: NodeId, node: &Node) -> StateSet {
        let handlers: Vec<&ExceptionTableEntry> = self.method.handlers_at(node.offset).collect();
        if handlers.is_empty() {
            trace!("{}: no predecessors and no handler at {}", id, node.offset);
            return StateSet::single_empty();
        }

        let mut states = StateSet::new();
        for handler in handlers {
            let value = if handler.catches_any() {
                ANY_EXCEPTION.to_owned()
            } else {
                let class = self
                    .method
                    .constants
                    .class_name(handler.catch_type)
                    .map(|name| name.replace('/', "."));
                format!("<{}>", class.as_deref().unwrap_or(&self.settings.placeholder))
            };
            let mut state = StackState::new();
            state.push(StackEntry::new(None, ValueType::Reference, value));
            states.insert(state);
        }

        if self.settings.register_handler_locals {
            self.register_handler_local(node);
        }
        states
    }

    /// Name the local that a handler stores its exception into, if debug info doesn't
    fn register_handler_local(&mut self, node: &Node) {
        let line = match node
            .instruction
            .and_then(|index| self.method.instructions.get(index))
        {
            Some(line) if line.opcode.is_store() => line,
            _ => return,
        };
        if let Ok(slot) = line.local_index() {
            if self.names.store_name(slot, line.offset).is_none() {
                trace!("naming local {} at {} '{}'", slot, line.offset, ANY_EXCEPTION);
                self.names.register(slot, line.offset, ANY_EXCEPTION);
            }
        }
    }
}
