use crate::bytecode::Opcode;
use crate::graph::{EdgeId, NodeId};
use std::fmt;

/// Errors from misusing the public API
///
/// The analysis itself never fails: problems found while interpreting a method are recorded on
/// the nodes and in the reports instead. These errors only come up when the inputs handed to the
/// crate are inconsistent.
#[derive(Debug)]
pub enum Error {
    /// Node is not part of the graph
    UnknownNode(NodeId),

    /// Edge is not part of the graph (or was already removed)
    UnknownEdge(EdgeId),

    /// A node refers to an instruction index past the end of the method body
    UnknownInstruction { node: NodeId, index: usize },

    /// Byte does not correspond to any JVM opcode
    UnknownOpcode(u8),

    /// Instruction does not carry enough operand bytes for the requested operand
    MissingOperand { offset: u32, opcode: Opcode },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownNode(node) => write!(f, "unknown node {}", node),
            Error::UnknownEdge(edge) => write!(f, "unknown edge {}", edge),
            Error::UnknownInstruction { node, index } => {
                write!(f, "node {} refers to missing instruction #{}", node, index)
            }
            Error::UnknownOpcode(byte) => write!(f, "unknown opcode 0x{:02x}", byte),
            Error::MissingOperand { offset, opcode } => {
                write!(f, "missing operand for '{}' at offset {}", opcode, offset)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Failure while applying an instruction's stack effect to one stack state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// Tried to pop from an empty operand stack
    EmptyStack,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::EmptyStack => f.write_str("empty stack"),
        }
    }
}

impl std::error::Error for StackError {}
