use super::{ConstantIndex, ConstantPool, InstructionLine, LocalVariableTable};

/// Entry in a method's exception table
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExceptionTableEntry {
    /// Start of exception handler range (inclusive)
    pub start_pc: u32,

    /// End of exception handler range (exclusive)
    pub end_pc: u32,

    /// Start of the exception handler
    pub handler_pc: u32,

    /// Class of exceptions caught (`ConstantIndex(0)` catches everything)
    pub catch_type: ConstantIndex,
}

impl ExceptionTableEntry {
    /// Does this handler catch every throwable?
    pub fn catches_any(&self) -> bool {
        self.catch_type.0 == 0
    }
}

/// Everything known about one method body
///
/// All of this is input to the analysis and is only ever read.
#[derive(Clone, Default, Debug)]
pub struct MethodBody {
    /// Instructions, in code array order
    pub instructions: Vec<InstructionLine>,

    pub constants: ConstantPool,

    pub local_variables: LocalVariableTable,

    pub exception_table: Vec<ExceptionTableEntry>,

    /// Declared maximum depth of the operand stack, in words
    pub max_stack: u16,
}

impl MethodBody {
    pub fn new(instructions: Vec<InstructionLine>, constants: ConstantPool) -> MethodBody {
        MethodBody {
            instructions,
            constants,
            ..MethodBody::default()
        }
    }

    /// Index of the instruction at a byte offset
    pub fn index_of_offset(&self, offset: u32) -> Option<usize> {
        self.instructions
            .binary_search_by_key(&offset, |line| line.offset)
            .ok()
    }

    /// Exception handlers that start at a byte offset
    pub fn handlers_at(&self, handler_pc: u32) -> impl Iterator<Item = &ExceptionTableEntry> {
        self.exception_table
            .iter()
            .filter(move |entry| entry.handler_pc == handler_pc)
    }
}
