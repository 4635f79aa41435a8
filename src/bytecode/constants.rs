use crate::util::{Offset, OffsetVec, Width};
use log::warn;
use std::collections::HashMap;
use std::convert::TryFrom;

/// Index into the constant pool
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct ConstantIndex(pub u16);

/// Constants as in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface
    Class(ConstantIndex),

    /// Field
    FieldRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    },

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: ConstantIndex,
        descriptor: ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    Utf8(String),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        reference_kind: u8,
        member: ConstantIndex,
    },

    /// Constant object of type `java.lang.invoke.MethodType`
    MethodType { descriptor: ConstantIndex },

    /// Dynamically-computed constant
    Dynamic {
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },

    /// Dynamically-computed call site
    InvokeDynamic {
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },

    Module(ConstantIndex),
    Package(ConstantIndex),
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double` which
/// also make the following index unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Field or method reference, with all of its names resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'a> {
    /// Owning class, in internal form (eg. `java/lang/String`)
    pub class: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
}

/// Read-only view of a class constant pool
///
/// Indexing starts at 1. The pool can be built up one constant at a time (the `get_*` helpers
/// reuse existing entries, similar to how a class writer would), which is mostly convenient for
/// tests. Lookups never fail loudly: a bad index or an entry of the wrong kind just gives `None`.
#[derive(Debug, Clone)]
pub struct ConstantPool {
    constants: OffsetVec<Constant>,
    utf8s: HashMap<String, ConstantIndex>,
    classes: HashMap<String, ConstantIndex>,
}

impl ConstantPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantPool {
        ConstantPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            utf8s: HashMap::new(),
            classes: HashMap::new(),
        }
    }

    /// Number of entries (long and double constants count once)
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Append a constant, returning its index
    ///
    /// Indices are `u16`. A constant that lands past the last addressable index is kept but gets
    /// index 0, which never resolves.
    pub fn push(&mut self, constant: Constant) -> ConstantIndex {
        let offset = self.constants.push(constant);
        match u16::try_from(offset.0) {
            Ok(index) => ConstantIndex(index),
            Err(_) => {
                warn!("constant pool overflow at index {}", offset.0);
                ConstantIndex(0)
            }
        }
    }

    /// Look up a constant by index
    pub fn get(&self, index: ConstantIndex) -> Option<&Constant> {
        self.constants
            .get_offset(Offset(index.0 as usize))
            .map(|(_, constant)| constant)
    }

    /// Look up a UTF-8 constant
    pub fn utf8(&self, index: ConstantIndex) -> Option<&str> {
        match self.get(index)? {
            Constant::Utf8(string) => Some(string.as_str()),
            _ => None,
        }
    }

    /// Look up the name of a class constant (in internal form)
    pub fn class_name(&self, index: ConstantIndex) -> Option<&str> {
        match self.get(index)? {
            Constant::Class(name) => self.utf8(*name),
            _ => None,
        }
    }

    /// Look up the name and descriptor of a name & type constant
    pub fn name_and_type(&self, index: ConstantIndex) -> Option<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType { name, descriptor } => {
                Some((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => None,
        }
    }

    /// Resolve a field or method reference
    pub fn member_ref(&self, index: ConstantIndex) -> Option<MemberRef<'_>> {
        let (class, name_and_type) = match self.get(index)? {
            Constant::FieldRef {
                class,
                name_and_type,
            }
            | Constant::MethodRef {
                class,
                name_and_type,
                ..
            } => (*class, *name_and_type),
            _ => return None,
        };
        let (name, descriptor) = self.name_and_type(name_and_type)?;
        Some(MemberRef {
            class: self.class_name(class)?,
            name,
            descriptor,
        })
    }

    /// Resolve the name and descriptor of an `invokedynamic` call site
    pub fn invoke_dynamic(&self, index: ConstantIndex) -> Option<(&str, &str)> {
        match self.get(index)? {
            Constant::InvokeDynamic { name_and_type, .. } => self.name_and_type(*name_and_type),
            _ => None,
        }
    }

    /// Get or insert a utf8 constant
    pub fn get_utf8(&mut self, utf8: &str) -> ConstantIndex {
        if let Some(idx) = self.utf8s.get(utf8) {
            *idx
        } else {
            let idx = self.push(Constant::Utf8(utf8.to_owned()));
            self.utf8s.insert(utf8.to_owned(), idx);
            idx
        }
    }

    /// Get or insert a class constant
    pub fn get_class(&mut self, class_name: &str) -> ConstantIndex {
        if let Some(idx) = self.classes.get(class_name) {
            *idx
        } else {
            let name = self.get_utf8(class_name);
            let idx = self.push(Constant::Class(name));
            self.classes.insert(class_name.to_owned(), idx);
            idx
        }
    }

    /// Insert a string constant
    pub fn get_string(&mut self, string: &str) -> ConstantIndex {
        let utf8 = self.get_utf8(string);
        self.push(Constant::String(utf8))
    }

    /// Insert a name & type constant
    pub fn get_name_and_type(&mut self, name: &str, descriptor: &str) -> ConstantIndex {
        let name = self.get_utf8(name);
        let descriptor = self.get_utf8(descriptor);
        self.push(Constant::NameAndType { name, descriptor })
    }

    /// Insert a field reference constant
    pub fn get_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstantIndex {
        let class = self.get_class(class);
        let name_and_type = self.get_name_and_type(name, descriptor);
        self.push(Constant::FieldRef {
            class,
            name_and_type,
        })
    }

    /// Insert a method reference constant
    pub fn get_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        is_interface: bool,
    ) -> ConstantIndex {
        let class = self.get_class(class);
        let name_and_type = self.get_name_and_type(name, descriptor);
        self.push(Constant::MethodRef {
            class,
            name_and_type,
            is_interface,
        })
    }

    /// Insert an `invokedynamic` call site constant
    pub fn get_invoke_dynamic(
        &mut self,
        bootstrap_method: u16,
        name: &str,
        descriptor: &str,
    ) -> ConstantIndex {
        let name_and_type = self.get_name_and_type(name, descriptor);
        self.push(Constant::InvokeDynamic {
            bootstrap_method,
            name_and_type,
        })
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        ConstantPool::new()
    }
}

impl FromIterator<Constant> for ConstantPool {
    fn from_iter<A: IntoIterator<Item = Constant>>(constants: A) -> Self {
        let mut pool = ConstantPool::new();
        for constant in constants {
            pool.push(constant);
        }
        pool
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wide_constants_skip_an_index() {
        let mut pool = ConstantPool::new();
        assert_eq!(pool.push(Constant::Integer(1)), ConstantIndex(1));
        assert_eq!(pool.push(Constant::Long(2)), ConstantIndex(2));
        assert_eq!(pool.push(Constant::Double(3.0)), ConstantIndex(4));
        assert_eq!(pool.push(Constant::Float(4.0)), ConstantIndex(6));
        assert_eq!(pool.get(ConstantIndex(3)), None);
        assert_eq!(pool.get(ConstantIndex(4)), Some(&Constant::Double(3.0)));
        assert_eq!(pool.get(ConstantIndex(0)), None);
    }

    #[test]
    fn resolving_members() {
        let mut pool = ConstantPool::new();
        let field = pool.get_field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
        let method = pool.get_method_ref("java/io/PrintStream", "println", "(I)V", false);
        assert_eq!(
            pool.member_ref(field),
            Some(MemberRef {
                class: "java/lang/System",
                name: "out",
                descriptor: "Ljava/io/PrintStream;",
            })
        );
        assert_eq!(pool.member_ref(method).map(|m| m.name), Some("println"));
        let class = pool.get_class("Foo");
        assert_eq!(pool.member_ref(class), None);
    }

    #[test]
    fn classes_and_utf8s_are_shared() {
        let mut pool = ConstantPool::new();
        let first = pool.get_class("java/lang/Exception");
        let second = pool.get_class("java/lang/Exception");
        assert_eq!(first, second);
        assert_eq!(pool.class_name(first), Some("java/lang/Exception"));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.class_name(ConstantIndex(1)), None);
    }

    #[test]
    fn overflowing_indices_do_not_wrap() {
        let mut pool: ConstantPool = (1..u16::MAX).map(|i| Constant::Integer(i as i32)).collect();
        assert_eq!(pool.push(Constant::Integer(-1)), ConstantIndex(u16::MAX));
        assert_eq!(pool.push(Constant::Integer(-2)), ConstantIndex(0));
        assert_eq!(pool.get(ConstantIndex(1)), Some(&Constant::Integer(1)));
        assert_eq!(pool.get(ConstantIndex(0)), None);
    }
}
