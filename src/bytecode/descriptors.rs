use crate::util::Width;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Descriptor that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorError {
    /// What went wrong
    pub message: String,

    /// Whether the descriptor ended too early (as opposed to containing a bad character)
    pub unexpected_end: bool,
}

impl DescriptorError {
    fn invalid(message: impl Into<String>) -> DescriptorError {
        DescriptorError {
            message: message.into(),
            unexpected_end: false,
        }
    }

    fn eof(message: impl Into<String>) -> DescriptorError {
        DescriptorError {
            message: message.into(),
            unexpected_end: true,
        }
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DescriptorError {}

/// Utility trait for reading descriptors out of their string representations
pub trait ParseDescriptor: Sized {
    /// Parse a descriptor from a string
    fn parse(source: &str) -> Result<Self, DescriptorError> {
        let mut chars = source.chars().peekable();
        let ret = Self::parse_from(&mut chars)?;
        match chars.next() {
            None => Ok(ret),
            Some(c) => Err(DescriptorError::invalid(format!(
                "Unexpected leftover input '{}'",
                c
            ))),
        }
    }

    /// Read the descriptor from a character buffer
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError>;
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    /// Name as written in Java source
    pub fn source_name(&self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }

    /// Element type of a `newarray` instruction, from its `atype` operand
    ///
    /// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-6.html#jvms-6.5.newarray
    pub fn from_array_type_code(atype: u8) -> Option<BaseType> {
        match atype {
            4 => Some(BaseType::Boolean),
            5 => Some(BaseType::Char),
            6 => Some(BaseType::Float),
            7 => Some(BaseType::Double),
            8 => Some(BaseType::Byte),
            9 => Some(BaseType::Short),
            10 => Some(BaseType::Int),
            11 => Some(BaseType::Long),
            _ => None,
        }
    }
}

impl Width for BaseType {
    fn width(&self) -> usize {
        match self {
            BaseType::Byte
            | BaseType::Char
            | BaseType::Float
            | BaseType::Int
            | BaseType::Short
            | BaseType::Boolean => 1,
            BaseType::Double | BaseType::Long => 2,
        }
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        let typ = match source.next() {
            Some('B') => BaseType::Byte,
            Some('C') => BaseType::Char,
            Some('D') => BaseType::Double,
            Some('F') => BaseType::Float,
            Some('I') => BaseType::Int,
            Some('J') => BaseType::Long,
            Some('S') => BaseType::Short,
            Some('Z') => BaseType::Boolean,
            Some(c) => {
                let msg = format!("Invalid base type character '{}'", c);
                return Err(DescriptorError::invalid(msg));
            }
            None => return Err(DescriptorError::eof("Missing base type character")),
        };
        Ok(typ)
    }
}

/// Class name, in the internal form used by class files (eg. `java/lang/String`)
impl ParseDescriptor for String {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        if let Some('L') = source.next() {
            let mut class_name = String::new();
            loop {
                let c: char = source.next().ok_or_else(|| {
                    DescriptorError::eof(format!("Missing terminator for 'L{}'", class_name))
                })?;
                if c == ';' {
                    if class_name.is_empty() {
                        return Err(DescriptorError::invalid("Empty class name"));
                    }
                    return Ok(class_name);
                } else {
                    class_name.push(c)
                }
            }
        } else {
            Err(DescriptorError::invalid(
                "Expected object type to start with `L`",
            ))
        }
    }
}

/// Reference type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType<Class> {
    Object(Class),
    ObjectArray(ArrayType<Class>),
    PrimitiveArray(ArrayType<BaseType>),
}

/// Generic array type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType<T> {
    /// Additional dimensions (`A[]` has 0 additional dimensions, `A[][][][]` has 3)
    pub additional_dimensions: usize,

    /// Underlying element type (`A` is the underlying element type of `A[][]`)
    pub element_type: T,
}

impl<T> ArrayType<T> {
    /// Total number of dimensions in the array type
    pub const fn dimensions(&self) -> usize {
        self.additional_dimensions + 1
    }
}

impl<C: ParseDescriptor> ParseDescriptor for RefType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        Ok(match source.peek().copied() {
            Some('L') => RefType::Object(C::parse_from(source)?),
            Some('[') => {
                source.next();
                let mut additional_dimensions = 0;
                while let Some('[') = source.peek().copied() {
                    additional_dimensions += 1;
                    source.next();
                }
                if let Some('L') = source.peek().copied() {
                    RefType::ObjectArray(ArrayType {
                        additional_dimensions,
                        element_type: C::parse_from(source)?,
                    })
                } else {
                    RefType::PrimitiveArray(ArrayType {
                        additional_dimensions,
                        element_type: BaseType::parse_from(source)?,
                    })
                }
            }
            Some(c) => {
                let msg = format!("Invalid reference type character '{}'", c);
                return Err(DescriptorError::invalid(msg));
            }
            None => return Err(DescriptorError::eof("Missing field type")),
        })
    }
}

impl RefType<String> {
    /// Name as written in Java source (eg. `java.lang.String[]`)
    pub fn source_name(&self) -> String {
        fn brackets(array: &ArrayType<impl Sized>) -> String {
            "[]".repeat(array.dimensions())
        }
        match self {
            RefType::Object(class) => class.replace('/', "."),
            RefType::ObjectArray(arr) => {
                format!("{}{}", arr.element_type.replace('/', "."), brackets(arr))
            }
            RefType::PrimitiveArray(arr) => {
                format!("{}{}", arr.element_type.source_name(), brackets(arr))
            }
        }
    }

    /// Parse the operand of `checkcast`, `anewarray`, and friends
    ///
    /// Class constants name plain classes without the `L...;` wrapper, but name array classes
    /// using array descriptors.
    pub fn parse_class_constant(name: &str) -> Result<Self, DescriptorError> {
        if name.starts_with('[') {
            RefType::parse(name)
        } else if name.is_empty() {
            Err(DescriptorError::eof("Missing class name"))
        } else {
            Ok(RefType::Object(name.to_owned()))
        }
    }
}

/// Type of a class, instance, or local variable
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType<Class> {
    Base(BaseType),
    Ref(RefType<Class>),
}

impl<C> Width for FieldType<C> {
    fn width(&self) -> usize {
        match self {
            FieldType::Base(base_type) => base_type.width(),
            FieldType::Ref(_) => 1,
        }
    }
}

impl<C> FieldType<C> {
    pub const fn int() -> FieldType<C> {
        FieldType::Base(BaseType::Int)
    }

    pub const fn long() -> FieldType<C> {
        FieldType::Base(BaseType::Long)
    }

    pub const fn float() -> FieldType<C> {
        FieldType::Base(BaseType::Float)
    }

    pub const fn double() -> FieldType<C> {
        FieldType::Base(BaseType::Double)
    }

    pub const fn object(class_name: C) -> FieldType<C> {
        FieldType::Ref(RefType::Object(class_name))
    }
}

impl FieldType<String> {
    /// Name as written in Java source
    pub fn source_name(&self) -> String {
        match self {
            FieldType::Base(base_type) => base_type.source_name().to_owned(),
            FieldType::Ref(ref_type) => ref_type.source_name(),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for FieldType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        match source.peek().copied() {
            None => Err(DescriptorError::eof("Missing field type")),
            Some('B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z') => {
                BaseType::parse_from(source).map(FieldType::Base)
            }
            Some('L' | '[') => RefType::parse_from(source).map(FieldType::Ref),
            Some(c) => {
                let msg = format!("Invalid field type character '{}'", c);
                Err(DescriptorError::invalid(msg))
            }
        }
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor<Class> {
    pub parameters: Vec<FieldType<Class>>,
    pub return_type: Option<FieldType<Class>>, // `None` is for `void` (ie. no return)
}

impl<C> MethodDescriptor<C> {
    /// Total length of parameters in words (not the same as the length of the vector)
    pub fn parameter_length(&self, has_this_param: bool) -> usize {
        let this_len = if has_this_param { 1 } else { 0 };
        this_len + self.parameters.iter().map(Width::width).sum::<usize>()
    }
}

impl<C: ParseDescriptor> ParseDescriptor for MethodDescriptor<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self, DescriptorError> {
        if source.next() != Some('(') {
            return Err(DescriptorError::invalid("Expected '(' for method"));
        }

        let mut parameters = vec![];
        loop {
            match source.peek().copied() {
                Some(')') => break,
                None => return Err(DescriptorError::eof("Expected ')' for method")),
                Some(_) => parameters.push(FieldType::<C>::parse_from(source)?),
            }
        }
        let _ = source.next();

        let return_type = if let Some('V') = source.peek().copied() {
            let _ = source.next();
            None
        } else {
            Some(FieldType::<C>::parse_from(source)?)
        };

        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type FT = FieldType<String>;

    #[test]
    fn field_types() {
        assert_eq!(FT::parse("I").unwrap(), FieldType::int());
        assert_eq!(
            FT::parse("Ljava/lang/Object;").unwrap(),
            FieldType::object(String::from("java/lang/Object"))
        );
        assert_eq!(
            FT::parse("[[[D").unwrap(),
            FieldType::Ref(RefType::PrimitiveArray(ArrayType {
                additional_dimensions: 2,
                element_type: BaseType::Double,
            }))
        );
        assert_eq!(
            FT::parse("[Ljava/lang/String;").unwrap().source_name(),
            "java.lang.String[]"
        );
    }

    #[test]
    fn method_descriptors() {
        let desc = MethodDescriptor::<String>::parse("(IDLjava/lang/Integer;)Ljava/lang/Object;")
            .unwrap();
        assert_eq!(
            desc.parameters,
            vec![
                FieldType::int(),
                FieldType::double(),
                FieldType::object(String::from("java/lang/Integer")),
            ]
        );
        assert_eq!(
            desc.return_type,
            Some(FieldType::object(String::from("java/lang/Object")))
        );
        assert_eq!(desc.parameter_length(true), 5);

        let void = MethodDescriptor::<String>::parse("()V").unwrap();
        assert!(void.parameters.is_empty());
        assert_eq!(void.return_type, None);
    }

    #[test]
    fn malformed_descriptors() {
        assert!(FT::parse("Q").is_err());
        assert!(FT::parse("Ljava/lang/Object").unwrap_err().unexpected_end);
        assert!(FT::parse("II").is_err());
        assert!(MethodDescriptor::<String>::parse("(I").unwrap_err().unexpected_end);
        assert!(MethodDescriptor::<String>::parse("I)V").is_err());
    }

    #[test]
    fn class_constants() {
        assert_eq!(
            RefType::parse_class_constant("java/util/List").unwrap(),
            RefType::Object(String::from("java/util/List"))
        );
        assert_eq!(
            RefType::parse_class_constant("[I").unwrap().source_name(),
            "int[]"
        );
    }
}
