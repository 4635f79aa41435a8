//! Read-only model of a disassembled method
//!
//! Decoding class files is somebody else's job: everything here is constructed by the caller (or
//! by tests) and then only read by the analysis.

mod constants;
mod descriptors;
mod instruction;
mod locals;
mod method;
mod opcode;

pub use constants::*;
pub use descriptors::*;
pub use instruction::*;
pub use locals::*;
pub use method::*;
pub use opcode::*;
