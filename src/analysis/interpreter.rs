use super::{StackEntry, StackState, ValueType};
use crate::bytecode::{
    BaseType, Constant, ConstantIndex, ConstantPool, FieldType, InstructionLine, LocalNames,
    MethodDescriptor, Opcode, ParseDescriptor, RefType,
};
use crate::util::Width;
use crate::{Error, StackError};
use log::warn;

/// Value pushed by method calls and comparisons
pub const RETURN_VALUE: &str = "<return value>";

/// Value pushed by `jsr`
pub const RETURN_ADDRESS: &str = "<return address>";

/// Symbolic interpreter for single instructions
///
/// Applies the stack effect of one instruction to one stack state. Entries carry an expression
/// describing the value (`(a+1)`, `arr[i]`, `<return value>`, ...) built from the constant pool
/// and the local variable names. Anything that can't be resolved becomes the placeholder with an
/// unknown type; the only hard failure is popping an empty stack.
pub struct Interpreter<'a> {
    constants: &'a ConstantPool,
    names: &'a LocalNames<'a>,
    placeholder: &'a str,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        constants: &'a ConstantPool,
        names: &'a LocalNames<'a>,
        placeholder: &'a str,
    ) -> Interpreter<'a> {
        Interpreter {
            constants,
            names,
            placeholder,
        }
    }

    /// Apply the stack effect of an instruction to a state
    ///
    /// On error the state is left partially updated and should be discarded.
    pub fn interpret(
        &self,
        line: &InstructionLine,
        state: &mut StackState,
    ) -> Result<(), StackError> {
        use Opcode::*;

        let push = |state: &mut StackState, value_type: ValueType, value: String| {
            state.push(StackEntry::new(Some(line.offset), value_type, value))
        };

        match line.opcode {
            Nop | Wide | Goto | GotoW | Ret | IInc | Breakpoint | ImpDep1 | ImpDep2 => (),

            AConstNull => push(state, ValueType::Reference, "null".to_owned()),
            IConstM1 | IConst0 | IConst1 | IConst2 | IConst3 | IConst4 | IConst5 => {
                let value = line.opcode.value() as i32 - IConst0.value() as i32;
                push(state, ValueType::Int, value.to_string());
            }
            LConst0 | LConst1 => {
                let value = line.opcode.value() - LConst0.value();
                push(state, ValueType::Long, value.to_string());
            }
            FConst0 | FConst1 | FConst2 => {
                let value = (line.opcode.value() - FConst0.value()) as f32;
                push(state, ValueType::Float, format!("{:?}", value));
            }
            DConst0 | DConst1 => {
                let value = (line.opcode.value() - DConst0.value()) as f64;
                push(state, ValueType::Double, format!("{:?}", value));
            }
            BiPush => {
                let value = self.operand(line, line.i8_operand(0).map(i32::from));
                push(state, ValueType::Int, self.or_placeholder(value));
            }
            SiPush => {
                let value = self.operand(line, line.i16_operand(0).map(i32::from));
                push(state, ValueType::Int, self.or_placeholder(value));
            }
            Ldc | LdcW | Ldc2W => {
                let (value_type, value) = self.loadable_constant(line);
                push(state, value_type, value);
            }

            ILoad | ILoad0 | ILoad1 | ILoad2 | ILoad3 => {
                push(state, ValueType::Int, self.local_name(line))
            }
            LLoad | LLoad0 | LLoad1 | LLoad2 | LLoad3 => {
                push(state, ValueType::Long, self.local_name(line))
            }
            FLoad | FLoad0 | FLoad1 | FLoad2 | FLoad3 => {
                push(state, ValueType::Float, self.local_name(line))
            }
            DLoad | DLoad0 | DLoad1 | DLoad2 | DLoad3 => {
                push(state, ValueType::Double, self.local_name(line))
            }
            ALoad | ALoad0 | ALoad1 | ALoad2 | ALoad3 => {
                push(state, ValueType::Reference, self.local_name(line))
            }

            IALoad | LALoad | FALoad | DALoad | AALoad | BALoad | CALoad | SALoad => {
                let index = state.pop()?;
                let array = state.pop()?;
                let value_type = match line.opcode {
                    LALoad => ValueType::Long,
                    FALoad => ValueType::Float,
                    DALoad => ValueType::Double,
                    AALoad => ValueType::Reference,
                    _ => ValueType::Int,
                };
                push(
                    state,
                    value_type,
                    format!("{}[{}]", array.value, index.value),
                );
            }

            IStore | LStore | FStore | DStore | AStore => pop_n(state, 1)?,
            IStore0 | IStore1 | IStore2 | IStore3 => pop_n(state, 1)?,
            LStore0 | LStore1 | LStore2 | LStore3 => pop_n(state, 1)?,
            FStore0 | FStore1 | FStore2 | FStore3 => pop_n(state, 1)?,
            DStore0 | DStore1 | DStore2 | DStore3 => pop_n(state, 1)?,
            AStore0 | AStore1 | AStore2 | AStore3 => pop_n(state, 1)?,
            IAStore | LAStore | FAStore | DAStore | AAStore | BAStore | CAStore | SAStore => {
                pop_n(state, 3)?
            }

            Pop => pop_n(state, 1)?,
            Pop2 => {
                let arg1 = state.pop()?;
                if arg1.width() == 1 {
                    state.pop()?;
                }
            }
            // The `2` forms act on single entries, like their one-word counterparts
            Dup | Dup2 => {
                let arg1 = state.pop()?;
                state.push(arg1.clone());
                state.push(arg1);
            }
            DupX1 | Dup2X1 => {
                let arg1 = state.pop()?;
                let arg2 = state.pop()?;
                state.push(arg1.clone());
                state.push(arg2);
                state.push(arg1);
            }
            DupX2 | Dup2X2 => {
                let arg1 = state.pop()?;
                let arg2 = state.pop()?;
                let arg3 = state.pop()?;
                state.push(arg1.clone());
                state.push(arg3);
                state.push(arg2);
                state.push(arg1);
            }
            Swap => {
                let arg1 = state.pop()?;
                let arg2 = state.pop()?;
                state.push(arg1);
                state.push(arg2);
            }

            IAdd | LAdd | FAdd | DAdd => binary(state, line, "+")?,
            ISub | LSub | FSub | DSub => binary(state, line, "-")?,
            IMul | LMul | FMul | DMul => binary(state, line, "*")?,
            IDiv | LDiv | FDiv | DDiv => binary(state, line, "/")?,
            IRem | LRem | FRem | DRem => binary(state, line, "%")?,
            IShl | LShl => binary(state, line, "<<")?,
            IShr | LShr | IUShr | LUShr => binary(state, line, ">>")?,
            IAnd | LAnd => binary(state, line, "&")?,
            IOr | LOr => binary(state, line, "|")?,
            IXor | LXor => binary(state, line, "^")?,
            INeg | LNeg | FNeg | DNeg => {
                let arg = state.pop()?;
                push(state, arithmetic_type(line.opcode), format!("(-{})", arg.value));
            }

            I2L | F2L | D2L => convert(state, line, ValueType::Long)?,
            I2F | L2F | D2F => convert(state, line, ValueType::Float)?,
            I2D | L2D | F2D => convert(state, line, ValueType::Double)?,
            L2I | F2I | D2I | I2B | I2C | I2S => convert(state, line, ValueType::Int)?,

            LCmp | FCmpL | FCmpG | DCmpL | DCmpG => {
                pop_n(state, 2)?;
                push(state, ValueType::Int, RETURN_VALUE.to_owned());
            }

            IfEq | IfNe | IfLt | IfGe | IfGt | IfLe | IfNull | IfNonNull => pop_n(state, 1)?,
            IfICmpEq | IfICmpNe | IfICmpLt | IfICmpGe | IfICmpGt | IfICmpLe | IfACmpEq
            | IfACmpNe => pop_n(state, 2)?,
            TableSwitch | LookupSwitch => pop_n(state, 1)?,
            Jsr | JsrW => push(state, ValueType::ReturnAddress, RETURN_ADDRESS.to_owned()),

            IReturn | LReturn | FReturn | DReturn | AReturn => pop_n(state, 1)?,
            Return => (),

            GetStatic => {
                let (value_type, name) = self.field(line);
                push(state, value_type, name);
            }
            GetField => {
                state.pop()?;
                let (value_type, name) = self.field(line);
                push(state, value_type, name);
            }
            PutStatic => pop_n(state, 1)?,
            PutField => pop_n(state, 2)?,

            InvokeVirtual | InvokeSpecial | InvokeStatic | InvokeInterface | InvokeDynamic => {
                let has_receiver = !matches!(line.opcode, InvokeStatic | InvokeDynamic);
                match self.method_descriptor(line) {
                    Some(descriptor) => {
                        pop_n(state, descriptor.parameters.len())?;
                        if has_receiver {
                            state.pop()?;
                        }
                        if let Some(return_type) = descriptor.return_type {
                            let value_type = ValueType::from_field_type(&return_type);
                            push(state, value_type, RETURN_VALUE.to_owned());
                        }
                    }
                    None => {
                        if has_receiver {
                            state.pop()?;
                        }
                        push(state, ValueType::Unknown, self.placeholder.to_owned());
                    }
                }
            }

            New => {
                let class = self.class_source_name(line);
                push(state, ValueType::Reference, format!("new {}", class));
            }
            NewArray => {
                let count = state.pop()?;
                let element = self
                    .operand(line, line.array_type_code())
                    .and_then(BaseType::from_array_type_code)
                    .map_or(self.placeholder, |base| base.source_name());
                let value = format!("new {}[{}]", element, count.value);
                push(state, ValueType::Reference, value);
            }
            ANewArray => {
                let count = state.pop()?;
                let element = self.class_source_name(line);
                let value = array_creation(&format!("{}[]", element), &[count.value]);
                push(state, ValueType::Reference, value);
            }
            MultiANewArray => {
                let dimensions = self.operand(line, line.dimensions()).unwrap_or(0);
                let mut counts = Vec::with_capacity(dimensions as usize);
                for _ in 0..dimensions {
                    counts.push(state.pop()?.value);
                }
                counts.reverse();
                let array = self.class_source_name(line);
                push(state, ValueType::Reference, array_creation(&array, &counts));
            }
            ArrayLength => {
                let array = state.pop()?;
                push(state, ValueType::Int, format!("{}.length", array.value));
            }
            AThrow => {
                let exception = state.pop()?;
                state.clear();
                state.push(exception);
            }
            CheckCast => {
                let object = state.pop()?;
                state.push(object.retyped(Some(line.offset), ValueType::Reference));
            }
            InstanceOf => {
                let object = state.pop()?;
                let class = self.class_source_name(line);
                let value = format!("({} instanceof {})", object.value, class);
                push(state, ValueType::Int, value);
            }
            MonitorEnter | MonitorExit => pop_n(state, 1)?,
        }

        Ok(())
    }

    /// Log and swallow operand decoding problems
    fn operand<T>(&self, line: &InstructionLine, operand: Result<T, Error>) -> Option<T> {
        match operand {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{}: {}", line, err);
                None
            }
        }
    }

    fn or_placeholder(&self, value: Option<impl ToString>) -> String {
        value.map_or_else(|| self.placeholder.to_owned(), |v| v.to_string())
    }

    fn constant_index(&self, line: &InstructionLine) -> Option<ConstantIndex> {
        self.operand(line, line.constant_index())
    }

    /// Name of the local variable accessed by a load or store
    fn local_name(&self, line: &InstructionLine) -> String {
        let slot = match self.operand(line, line.local_index()) {
            Some(slot) => slot,
            None => return self.placeholder.to_owned(),
        };
        let name = if line.opcode.is_store() {
            self.names.store_name(slot, line.offset)
        } else {
            self.names.load_name(slot, line.offset)
        };
        name.map_or_else(|| format!("local{}", slot), str::to_owned)
    }

    /// Source name of the class operand (eg. `java.lang.String` or `int[][]`)
    fn class_source_name(&self, line: &InstructionLine) -> String {
        let resolved = self
            .constant_index(line)
            .and_then(|index| self.constants.class_name(index))
            .and_then(|name| RefType::parse_class_constant(name).ok())
            .map(|class| class.source_name());
        resolved.unwrap_or_else(|| {
            warn!("{}: unresolvable class", line);
            self.placeholder.to_owned()
        })
    }

    /// Type and name of the field operand
    fn field(&self, line: &InstructionLine) -> (ValueType, String) {
        let resolved = self
            .constant_index(line)
            .and_then(|index| self.constants.member_ref(index))
            .and_then(|member| {
                let field_type = FieldType::<String>::parse(member.descriptor).ok()?;
                Some((ValueType::from_field_type(&field_type), member.name.to_owned()))
            });
        resolved.unwrap_or_else(|| {
            warn!("{}: unresolvable field", line);
            (ValueType::Unknown, self.placeholder.to_owned())
        })
    }

    /// Descriptor of the method operand
    fn method_descriptor(&self, line: &InstructionLine) -> Option<MethodDescriptor<String>> {
        let index = self.constant_index(line)?;
        let descriptor = if line.opcode == Opcode::InvokeDynamic {
            self.constants.invoke_dynamic(index).map(|(_, desc)| desc)
        } else {
            self.constants.member_ref(index).map(|member| member.descriptor)
        };
        let parsed = descriptor.and_then(|desc| MethodDescriptor::<String>::parse(desc).ok());
        if parsed.is_none() {
            warn!("{}: unresolvable method", line);
        }
        parsed
    }

    /// Type and text of the constant loaded by `ldc` and friends
    fn loadable_constant(&self, line: &InstructionLine) -> (ValueType, String) {
        let constant = match self.constant_index(line) {
            Some(index) => self.constants.get(index),
            None => None,
        };
        let resolved = match constant {
            Some(Constant::Integer(i)) => Some((ValueType::Int, i.to_string())),
            Some(Constant::Float(f)) => Some((ValueType::Float, format!("{:?}", f))),
            Some(Constant::Long(l)) => Some((ValueType::Long, l.to_string())),
            Some(Constant::Double(d)) => Some((ValueType::Double, format!("{:?}", d))),
            Some(Constant::String(utf8)) => self
                .constants
                .utf8(*utf8)
                .map(|s| (ValueType::Reference, format!("{:?}", s))),
            Some(Constant::Class(_)) => {
                let class = self.class_source_name(line);
                Some((ValueType::Reference, format!("{}.class", class)))
            }
            Some(Constant::MethodType { descriptor }) => self
                .constants
                .utf8(*descriptor)
                .map(|desc| (ValueType::Reference, desc.to_owned())),
            Some(Constant::MethodHandle { .. }) => {
                Some((ValueType::Reference, "<method handle>".to_owned()))
            }
            Some(Constant::Dynamic { name_and_type, .. }) => self
                .constants
                .name_and_type(*name_and_type)
                .and_then(|(name, desc)| {
                    let field_type = FieldType::<String>::parse(desc).ok()?;
                    Some((ValueType::from_field_type(&field_type), name.to_owned()))
                }),
            _ => None,
        };
        resolved.unwrap_or_else(|| {
            warn!("{}: unresolvable constant", line);
            (ValueType::Unknown, self.placeholder.to_owned())
        })
    }
}

fn pop_n(state: &mut StackState, count: usize) -> Result<(), StackError> {
    for _ in 0..count {
        state.pop()?;
    }
    Ok(())
}

/// Result type of an arithmetic opcode, from its prefix letter
fn arithmetic_type(opcode: Opcode) -> ValueType {
    match opcode.mnemonic().as_bytes().first() {
        Some(b'l') => ValueType::Long,
        Some(b'f') => ValueType::Float,
        Some(b'd') => ValueType::Double,
        _ => ValueType::Int,
    }
}

fn binary(state: &mut StackState, line: &InstructionLine, op: &str) -> Result<(), StackError> {
    let right = state.pop()?;
    let left = state.pop()?;
    let value = format!("({}{}{})", left.value, op, right.value);
    state.push(StackEntry::new(
        Some(line.offset),
        arithmetic_type(line.opcode),
        value,
    ));
    Ok(())
}

fn convert(
    state: &mut StackState,
    line: &InstructionLine,
    target: ValueType,
) -> Result<(), StackError> {
    let arg = state.pop()?;
    state.push(arg.retyped(Some(line.offset), target));
    Ok(())
}

/// Render an array creation, filling in the leading dimensions (`int[][]` with `[n]` gives
/// `new int[n][]`)
fn array_creation(array_type: &str, counts: &[String]) -> String {
    let (element, brackets) = match array_type.find('[') {
        Some(split) => array_type.split_at(split),
        None => (array_type, ""),
    };
    let total = brackets.len() / 2;
    let mut value = format!("new {}", element);
    for count in counts {
        value.push_str(&format!("[{}]", count));
    }
    for _ in counts.len()..total {
        value.push_str("[]");
    }
    value
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bytecode::LocalVariableTable;

    fn int(value: &str) -> StackEntry {
        StackEntry::new(None, ValueType::Int, value)
    }

    fn long(value: &str) -> StackEntry {
        StackEntry::new(None, ValueType::Long, value)
    }

    fn reference(value: &str) -> StackEntry {
        StackEntry::new(None, ValueType::Reference, value)
    }

    fn new_state<const N: usize>(entries: [StackEntry; N]) -> StackState {
        entries.into_iter().collect()
    }

    fn run(
        constants: &ConstantPool,
        line: InstructionLine,
        state: &mut StackState,
    ) -> Result<(), StackError> {
        let table = LocalVariableTable::new();
        let names = LocalNames::new(&table);
        Interpreter::new(constants, &names, "?").interpret(&line, state)
    }

    fn run_simple(opcode: Opcode, state: &mut StackState) -> Result<(), StackError> {
        run(&ConstantPool::new(), InstructionLine::new(0, opcode), state)
    }

    #[test]
    fn arithmetic() {
        let mut state = new_state([int("1"), int("2")]);
        run_simple(Opcode::IAdd, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"(1+2)"]"#);

        let mut state = new_state([long("a"), int("3")]);
        run_simple(Opcode::LUShr, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[J:"(a>>3)"]"#);
        assert_eq!(state.size_in_words(), 2);

        let mut state = new_state([StackEntry::new(None, ValueType::Double, "d")]);
        run_simple(Opcode::DNeg, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[D:"(-d)"]"#);
    }

    #[test]
    fn constants() {
        let mut state = StackState::new();
        for opcode in [Opcode::IConstM1, Opcode::LConst1, Opcode::FConst2, Opcode::AConstNull] {
            run_simple(opcode, &mut state).unwrap();
        }
        assert_eq!(
            state.signature(),
            r#"[I:"-1", J:"1", F:"2.0", L:"null"]"#
        );
        assert_eq!(state.size_in_words(), 5);

        let mut state = StackState::new();
        let line = InstructionLine::with_operands(0, Opcode::SiPush, vec![0x01, 0x00]);
        run(&ConstantPool::new(), line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"256"]"#);
    }

    #[test]
    fn ldc() {
        let mut pool = ConstantPool::new();
        let hello = pool.get_string("hello");
        let long = pool.push(Constant::Long(1 << 40));
        let class = pool.get_class("java/lang/String");

        let mut state = StackState::new();
        for (opcode, index) in [(Opcode::LdcW, hello), (Opcode::Ldc2W, long), (Opcode::LdcW, class)] {
            let line = InstructionLine::with_operands(0, opcode, index.0.to_be_bytes().to_vec());
            run(&pool, line, &mut state).unwrap();
        }
        assert_eq!(
            state.signature(),
            r#"[L:"\"hello\"", J:"1099511627776", L:"java.lang.String.class"]"#
        );

        let mut state = StackState::new();
        let line = InstructionLine::with_operands(0, Opcode::Ldc, vec![99]);
        run(&pool, line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[?:"?"]"#);
    }

    #[test]
    fn dup_on_single_int() {
        let mut state = new_state([int("5")]);
        run_simple(Opcode::Dup, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"5", I:"5"]"#);
    }

    #[test]
    fn dup_family() {
        let mut state = new_state([int("b"), int("a")]);
        run_simple(Opcode::DupX1, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"a", I:"b", I:"a"]"#);

        let mut state = new_state([int("c"), int("b"), int("a")]);
        run_simple(Opcode::DupX2, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"a", I:"c", I:"b", I:"a"]"#);

        let mut state = new_state([int("a"), int("b")]);
        run_simple(Opcode::Swap, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"b", I:"a"]"#);
    }

    #[test]
    fn dup2_forms_act_on_one_entry() {
        let mut state = new_state([int("a"), int("b")]);
        run_simple(Opcode::Dup2, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"a", I:"b", I:"b"]"#);

        let mut state = new_state([long("l")]);
        run_simple(Opcode::Dup2, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[J:"l", J:"l"]"#);

        let mut state = new_state([int("c"), int("b"), int("a")]);
        run_simple(Opcode::Dup2X1, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"c", I:"a", I:"b", I:"a"]"#);

        let mut state = new_state([long("m"), int("x"), long("l")]);
        run_simple(Opcode::Dup2X2, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[J:"l", J:"m", I:"x", J:"l"]"#);

        let mut state = new_state([long("m"), long("l")]);
        assert!(matches!(
            run_simple(Opcode::Dup2X2, &mut state),
            Err(StackError::EmptyStack)
        ));
    }

    #[test]
    fn comparisons() {
        for (opcode, operand) in [
            (Opcode::LCmp, long("x")),
            (Opcode::FCmpL, StackEntry::new(None, ValueType::Float, "x")),
            (Opcode::DCmpG, StackEntry::new(None, ValueType::Double, "x")),
        ] {
            let mut state = new_state([operand.clone(), operand]);
            run_simple(opcode, &mut state).unwrap();
            assert_eq!(state.signature(), r#"[I:"<return value>"]"#, "{}", opcode);
        }
    }

    #[test]
    fn conversions_keep_the_value() {
        let mut state = new_state([int("n")]);
        run_simple(Opcode::I2L, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[J:"n"]"#);
        assert_eq!(state.size_in_words(), 2);

        run_simple(Opcode::L2I, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"n"]"#);
        assert_eq!(state.size_in_words(), 1);

        let mut state = new_state([StackEntry::new(None, ValueType::Double, "d")]);
        run_simple(Opcode::D2F, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[F:"d"]"#);
        assert_eq!(state.peek().map(|entry| entry.producer), Some(Some(0)));
    }

    #[test]
    fn checkcast_keeps_the_value() {
        let mut state = new_state([reference("o")]);
        let line = InstructionLine::with_operands(7, Opcode::CheckCast, vec![0, 1]);
        run(&ConstantPool::new(), line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[L:"o"]"#);
        assert_eq!(state.peek().map(|entry| entry.producer), Some(Some(7)));
    }

    #[test]
    fn array_loads() {
        let mut state = new_state([reference("arr"), int("i")]);
        run_simple(Opcode::IALoad, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"arr[i]"]"#);

        let mut state = new_state([reference("arr"), int("i")]);
        run_simple(Opcode::DALoad, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[D:"arr[i]"]"#);
        assert_eq!(state.size_in_words(), 2);
    }

    #[test]
    fn jsr_pushes_a_return_address() {
        let mut state = StackState::new();
        run_simple(Opcode::Jsr, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[RA:"<return address>"]"#);
    }

    #[test]
    fn fixed_pop_counts() {
        let cases = [
            (Opcode::PutStatic, 1),
            (Opcode::PutField, 2),
            (Opcode::MonitorEnter, 1),
            (Opcode::MonitorExit, 1),
            (Opcode::IfEq, 1),
            (Opcode::IfNonNull, 1),
            (Opcode::IfICmpLt, 2),
            (Opcode::IfACmpNe, 2),
            (Opcode::TableSwitch, 1),
            (Opcode::LookupSwitch, 1),
            (Opcode::Goto, 0),
        ];
        for (opcode, popped) in cases {
            let mut state = new_state([int("a"), int("b"), int("c")]);
            run_simple(opcode, &mut state).unwrap();
            assert_eq!(state.len(), 3 - popped, "{}", opcode);
        }
    }

    #[test]
    fn pop2_forms() {
        let mut state = new_state([int("a"), int("b"), int("c")]);
        run_simple(Opcode::Pop2, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"a"]"#);

        let mut state = new_state([int("a"), long("b")]);
        run_simple(Opcode::Pop2, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"a"]"#);
    }

    #[test]
    fn athrow_keeps_only_the_exception() {
        let mut state = new_state([reference("x"), reference("exc")]);
        run_simple(Opcode::AThrow, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[L:"exc"]"#);
    }

    #[test]
    fn underflow() {
        let mut state = StackState::new();
        assert!(matches!(
            run_simple(Opcode::Pop, &mut state),
            Err(StackError::EmptyStack)
        ));
        let mut state = new_state([int("1")]);
        assert!(matches!(
            run_simple(Opcode::Swap, &mut state),
            Err(StackError::EmptyStack)
        ));
    }

    #[test]
    fn fields_and_invokes() {
        let mut pool = ConstantPool::new();
        let out = pool.get_field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
        let flag = pool.get_field_ref("Foo", "flag", "Z");
        let println = pool.get_method_ref("java/io/PrintStream", "println", "(J)V", false);
        let max = pool.get_method_ref("java/lang/Math", "max", "(II)I", false);
        let concat =
            pool.get_invoke_dynamic(0, "makeConcat", "(Ljava/lang/String;I)Ljava/lang/String;");

        let at = |opcode, index: ConstantIndex| {
            InstructionLine::with_operands(0, opcode, index.0.to_be_bytes().to_vec())
        };

        let mut state = StackState::new();
        run(&pool, at(Opcode::GetStatic, out), &mut state).unwrap();
        state.push(long("n"));
        run(&pool, at(Opcode::InvokeVirtual, println), &mut state).unwrap();
        assert!(state.is_empty());

        let mut state = new_state([reference("this")]);
        run(&pool, at(Opcode::GetField, flag), &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"flag"]"#);

        let mut state = new_state([int("a"), int("b")]);
        run(&pool, at(Opcode::InvokeStatic, max), &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"<return value>"]"#);

        let mut state = new_state([reference("this"), reference("s"), int("n")]);
        let mut operands = concat.0.to_be_bytes().to_vec();
        operands.extend([0, 0]);
        let line = InstructionLine::with_operands(0, Opcode::InvokeDynamic, operands);
        run(&pool, line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[L:"this", L:"<return value>"]"#);
    }

    #[test]
    fn objects_and_arrays() {
        let mut pool = ConstantPool::new();
        let string = pool.get_class("java/lang/String");
        let grid = pool.get_class("[[I");

        let mut state = new_state([int("n")]);
        let line = InstructionLine::with_operands(0, Opcode::ANewArray, string.0.to_be_bytes().to_vec());
        run(&pool, line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[L:"new java.lang.String[n]"]"#);

        let mut state = new_state([int("w")]);
        let line = InstructionLine::with_operands(0, Opcode::NewArray, vec![10]);
        run(&pool, line, &mut state).unwrap();
        run_simple(Opcode::ArrayLength, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"new int[w].length"]"#);

        let mut state = new_state([int("w"), int("h")]);
        let mut operands = grid.0.to_be_bytes().to_vec();
        operands.push(2);
        let line = InstructionLine::with_operands(0, Opcode::MultiANewArray, operands);
        run(&pool, line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[L:"new int[w][h]"]"#);

        let mut state = new_state([reference("o")]);
        let line = InstructionLine::with_operands(0, Opcode::InstanceOf, string.0.to_be_bytes().to_vec());
        run(&pool, line, &mut state).unwrap();
        assert_eq!(state.signature(), r#"[I:"(o instanceof java.lang.String)"]"#);
    }

    #[test]
    fn local_names() {
        let mut table = LocalVariableTable::new();
        table.add(1, 0, 10, "count", "I");
        let names = LocalNames::new(&table);
        let pool = ConstantPool::new();
        let interpreter = Interpreter::new(&pool, &names, "?");

        let mut state = StackState::new();
        interpreter
            .interpret(&InstructionLine::new(2, Opcode::ILoad1), &mut state)
            .unwrap();
        interpreter
            .interpret(&InstructionLine::new(3, Opcode::ALoad2), &mut state)
            .unwrap();
        assert_eq!(state.signature(), r#"[I:"count", L:"local2"]"#);
    }
}
