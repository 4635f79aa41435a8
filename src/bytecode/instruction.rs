use super::{ConstantIndex, Opcode};
use crate::Error;
use byteorder::{BigEndian, ByteOrder};
use std::fmt;

/// One disassembled instruction
///
/// Operands are kept exactly as they appear in the code array (big-endian, following the opcode
/// byte). A `wide` prefix is folded into the instruction it modifies, so `wide iload 300` is a
/// single `ILoad` line with `wide` set and two operand bytes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InstructionLine {
    /// Byte offset of the opcode in the code array
    pub offset: u32,

    pub opcode: Opcode,

    /// Raw operand bytes (everything after the opcode)
    pub operands: Box<[u8]>,

    /// Was this instruction prefixed by `wide`?
    pub wide: bool,
}

impl InstructionLine {
    /// Instruction without any operands
    pub fn new(offset: u32, opcode: Opcode) -> InstructionLine {
        InstructionLine::with_operands(offset, opcode, Vec::new())
    }

    /// Instruction with raw operand bytes
    pub fn with_operands(
        offset: u32,
        opcode: Opcode,
        operands: impl Into<Box<[u8]>>,
    ) -> InstructionLine {
        InstructionLine {
            offset,
            opcode,
            operands: operands.into(),
            wide: false,
        }
    }

    /// Instruction that was prefixed by `wide`
    pub fn widened(offset: u32, opcode: Opcode, operands: impl Into<Box<[u8]>>) -> InstructionLine {
        InstructionLine {
            wide: true,
            ..InstructionLine::with_operands(offset, opcode, operands)
        }
    }

    fn operand_bytes(&self, at: usize, len: usize) -> Result<&[u8], Error> {
        self.operands
            .get(at..at + len)
            .ok_or(Error::MissingOperand {
                offset: self.offset,
                opcode: self.opcode,
            })
    }

    pub fn u8_operand(&self, at: usize) -> Result<u8, Error> {
        Ok(self.operand_bytes(at, 1)?[0])
    }

    pub fn i8_operand(&self, at: usize) -> Result<i8, Error> {
        Ok(self.operand_bytes(at, 1)?[0] as i8)
    }

    pub fn u16_operand(&self, at: usize) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.operand_bytes(at, 2)?))
    }

    pub fn i16_operand(&self, at: usize) -> Result<i16, Error> {
        Ok(BigEndian::read_i16(self.operand_bytes(at, 2)?))
    }

    pub fn i32_operand(&self, at: usize) -> Result<i32, Error> {
        Ok(BigEndian::read_i32(self.operand_bytes(at, 4)?))
    }

    /// Constant pool index operand (`ldc` is the only instruction with a one-byte index)
    pub fn constant_index(&self) -> Result<ConstantIndex, Error> {
        let index = match self.opcode {
            Opcode::Ldc => self.u8_operand(0)? as u16,
            _ => self.u16_operand(0)?,
        };
        Ok(ConstantIndex(index))
    }

    /// Local variable slot, either implied by the opcode or read from the operands
    pub fn local_index(&self) -> Result<u16, Error> {
        if let Some(slot) = self.opcode.implicit_local() {
            Ok(slot)
        } else if self.wide {
            self.u16_operand(0)
        } else {
            Ok(self.u8_operand(0)? as u16)
        }
    }

    /// Increment of an `iinc`
    pub fn iinc_constant(&self) -> Result<i16, Error> {
        if self.wide {
            self.i16_operand(2)
        } else {
            Ok(self.i8_operand(1)? as i16)
        }
    }

    /// Number of dimensions of a `multianewarray`
    pub fn dimensions(&self) -> Result<u8, Error> {
        self.u8_operand(2)
    }

    /// Element type code of a `newarray`
    pub fn array_type_code(&self) -> Result<u8, Error> {
        self.u8_operand(0)
    }
}

impl fmt::Display for InstructionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.offset)?;
        if self.wide {
            f.write_str("wide ")?;
        }
        f.write_str(self.opcode.mnemonic())?;
        for byte in self.operands.iter() {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn big_endian_operands() {
        let line = InstructionLine::with_operands(4, Opcode::SiPush, vec![0xff, 0xfe]);
        assert_eq!(line.i16_operand(0).unwrap(), -2);
        assert_eq!(line.u16_operand(0).unwrap(), 0xfffe);
        assert!(matches!(
            line.i32_operand(0),
            Err(Error::MissingOperand { offset: 4, opcode: Opcode::SiPush })
        ));
    }

    #[test]
    fn constant_index_width() {
        let ldc = InstructionLine::with_operands(0, Opcode::Ldc, vec![7]);
        let ldc_w = InstructionLine::with_operands(0, Opcode::LdcW, vec![1, 2]);
        assert_eq!(ldc.constant_index().unwrap(), ConstantIndex(7));
        assert_eq!(ldc_w.constant_index().unwrap(), ConstantIndex(0x0102));
    }

    #[test]
    fn local_indices() {
        let short = InstructionLine::new(0, Opcode::AStore2);
        let narrow = InstructionLine::with_operands(0, Opcode::ILoad, vec![9]);
        let wide = InstructionLine::widened(0, Opcode::ILoad, vec![1, 44]);
        assert_eq!(short.local_index().unwrap(), 2);
        assert_eq!(narrow.local_index().unwrap(), 9);
        assert_eq!(wide.local_index().unwrap(), 300);
    }

    #[test]
    fn iinc_operands() {
        let narrow = InstructionLine::with_operands(0, Opcode::IInc, vec![1, 0xff]);
        let wide = InstructionLine::widened(0, Opcode::IInc, vec![0, 1, 0x01, 0x00]);
        assert_eq!(narrow.iinc_constant().unwrap(), -1);
        assert_eq!(wide.iinc_constant().unwrap(), 256);
        assert_eq!(wide.local_index().unwrap(), 1);
    }

    #[test]
    fn display() {
        let line = InstructionLine::with_operands(12, Opcode::BiPush, vec![0x2a]);
        assert_eq!(line.to_string(), "12: bipush 2a");
    }
}
