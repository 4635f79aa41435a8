//! Operand stack analysis for JVM bytecode methods
//!
//! Given a disassembled method and its control-flow graph, this computes every possible operand
//! stack before and after each instruction, and derives verifier-style diagnostics from them.
//!
//! ```
//! use opstack::analysis::StackAnalysis;
//! use opstack::bytecode::{ConstantPool, InstructionLine, MethodBody, Opcode};
//! use opstack::graph::{ControlFlowGraph, DepthFirstBackEdges};
//! use opstack::report::Report;
//! use opstack::Settings;
//!
//! let mut method = MethodBody::new(
//!     vec![
//!         InstructionLine::new(0, Opcode::IConst1),
//!         InstructionLine::new(1, Opcode::IConst2),
//!         InstructionLine::new(2, Opcode::IAdd),
//!         InstructionLine::new(3, Opcode::IReturn),
//!     ],
//!     ConstantPool::new(),
//! );
//! method.max_stack = 2;
//!
//! let mut graph = ControlFlowGraph::new();
//! let nodes = graph.add_instruction_nodes(&method);
//! for pair in nodes.windows(2) {
//!     graph.add_edge(pair[0], pair[1]).unwrap();
//! }
//!
//! let settings = Settings::default();
//! let analysis =
//!     StackAnalysis::analyze(&method, &mut graph, &DepthFirstBackEdges, &settings).unwrap();
//! assert_eq!(analysis.max_stack_size(), 2);
//!
//! let report = Report::build(&method, &graph, &analysis, &settings);
//! assert!(!report.has_errors());
//! ```

pub mod analysis;
pub mod bytecode;
pub mod graph;
pub mod report;
pub mod util;

mod errors;
mod settings;

pub use errors::*;
pub use settings::*;
