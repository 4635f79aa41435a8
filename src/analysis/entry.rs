use crate::bytecode::{BaseType, FieldType};
use crate::util::Width;
use std::fmt;

/// Type tag of a value on the operand stack
///
/// `boolean`, `byte`, `char`, and `short` never appear: the JVM widens them to `int` as soon as
/// they are loaded.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ValueType {
    Int,
    Float,
    Long,
    Double,
    Reference,
    ReturnAddress,
    Unknown,
}

impl ValueType {
    /// Short tag used when rendering states (`I`, `J`, `L`, ...)
    pub const fn tag(self) -> &'static str {
        match self {
            ValueType::Int => "I",
            ValueType::Float => "F",
            ValueType::Long => "J",
            ValueType::Double => "D",
            ValueType::Reference => "L",
            ValueType::ReturnAddress => "RA",
            ValueType::Unknown => "?",
        }
    }

    /// Number of bytes the value takes up on the stack
    pub const fn size_in_bytes(self) -> u8 {
        match self {
            ValueType::Long | ValueType::Double => 8,
            _ => 4,
        }
    }

    /// Stack type of a value described by a field type
    pub fn from_field_type<C>(field_type: &FieldType<C>) -> ValueType {
        match field_type {
            FieldType::Base(base) => ValueType::from(*base),
            FieldType::Ref(_) => ValueType::Reference,
        }
    }
}

impl From<BaseType> for ValueType {
    fn from(base: BaseType) -> ValueType {
        match base {
            BaseType::Int
            | BaseType::Char
            | BaseType::Short
            | BaseType::Byte
            | BaseType::Boolean => ValueType::Int,
            BaseType::Float => ValueType::Float,
            BaseType::Long => ValueType::Long,
            BaseType::Double => ValueType::Double,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Symbolic value on the operand stack
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct StackEntry {
    /// Offset of the instruction that pushed this value, if any
    pub producer: Option<u32>,

    /// Either 4 or 8
    pub size_in_bytes: u8,

    pub value_type: ValueType,

    /// Expression describing the value (eg. `(a+1)`)
    pub value: String,
}

impl StackEntry {
    pub fn new(producer: Option<u32>, value_type: ValueType, value: impl Into<String>) -> Self {
        StackEntry {
            producer,
            size_in_bytes: value_type.size_in_bytes(),
            value_type,
            value: value.into(),
        }
    }

    /// Same entry with a different type (conversions keep the expression)
    pub fn retyped(&self, producer: Option<u32>, value_type: ValueType) -> StackEntry {
        StackEntry::new(producer, value_type, self.value.clone())
    }
}

/// Width in words
impl Width for StackEntry {
    fn width(&self) -> usize {
        self.size_in_bytes as usize / 4
    }
}

/// Canonical form: the type tag and the escaped, quoted value (eg. `I:"1"`)
impl fmt::Display for StackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.value_type, self.value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bytecode::ParseDescriptor;

    #[test]
    fn sizes() {
        assert_eq!(StackEntry::new(None, ValueType::Int, "1").width(), 1);
        assert_eq!(StackEntry::new(None, ValueType::Double, "1.0").width(), 2);
        assert_eq!(StackEntry::new(None, ValueType::Long, "x").size_in_bytes, 8);
        assert_eq!(StackEntry::new(None, ValueType::Reference, "x").size_in_bytes, 4);
    }

    #[test]
    fn narrow_types_fold_to_int() {
        let field_type = FieldType::<String>::parse("Z").unwrap();
        assert_eq!(ValueType::from_field_type(&field_type), ValueType::Int);
        let field_type = FieldType::<String>::parse("[J").unwrap();
        assert_eq!(ValueType::from_field_type(&field_type), ValueType::Reference);
    }

    #[test]
    fn rendering_escapes_values() {
        let entry = StackEntry::new(Some(3), ValueType::Reference, "\"hi\"");
        assert_eq!(entry.to_string(), r#"L:"\"hi\"""#);
    }
}
