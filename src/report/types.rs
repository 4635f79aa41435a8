use super::{ReportContext, Section, Severity};
use crate::analysis::{StackState, ValueType};
use crate::bytecode::{FieldType, InstructionLine, MethodDescriptor, Opcode, ParseDescriptor};
use crate::ReportKinds;

/// Type layouts per node, and operand types of instructions that consume typed values
pub fn type_report(context: &ReportContext) -> Section {
    let mut section = Section::new(ReportKinds::TYPES, "Stack types");

    for (id, property) in context.analysis.properties() {
        let node = match context.graph.node(id) {
            Some(node) => node,
            None => continue,
        };

        let mut layouts: Vec<Vec<ValueType>> = vec![];
        for state in &property.states_before {
            let layout = state.types();
            if !layouts.contains(&layout) {
                layouts.push(layout);
            }
        }
        let rendered: Vec<String> = layouts.iter().map(|l| render_layout(l)).collect();
        if layouts.len() > 1 {
            let message = format!("inconsistent types: {}", rendered.join(" vs "));
            section.add(Severity::Error, Some((id, node)), message);
        } else {
            let message = format!("types {}", rendered.join(""));
            section.add(Severity::Info, Some((id, node)), message);
        }

        let line = match context.instruction(node) {
            Some(line) => line,
            None => continue,
        };
        let expected = match expected_operands(context, line) {
            Some(expected) => expected,
            None => continue,
        };
        for state in &property.states_before {
            for message in check_operands(state, &expected) {
                section.add(Severity::Error, Some((id, node)), message);
            }
        }
    }

    section
}

fn render_layout(layout: &[ValueType]) -> String {
    let tags: Vec<&str> = layout.iter().map(|typ| typ.tag()).collect();
    format!("[{}]", tags.join(", "))
}

/// Operand consumed by an instruction
struct Operand {
    value_type: ValueType,
    what: String,
}

impl Operand {
    fn new(value_type: ValueType, what: impl Into<String>) -> Operand {
        Operand {
            value_type,
            what: what.into(),
        }
    }
}

/// Types an instruction expects on top of the stack, bottom to top
///
/// `astore` is skipped since it also stores return addresses.
fn expected_operands(context: &ReportContext, line: &InstructionLine) -> Option<Vec<Operand>> {
    use Opcode::*;
    use ValueType::*;

    let array_store = |element: ValueType| {
        vec![
            Operand::new(Reference, "array"),
            Operand::new(Int, "index"),
            Operand::new(element, "value"),
        ]
    };

    let operands = match line.opcode {
        IStore | IStore0 | IStore1 | IStore2 | IStore3 => vec![Operand::new(Int, "value")],
        LStore | LStore0 | LStore1 | LStore2 | LStore3 => vec![Operand::new(Long, "value")],
        FStore | FStore0 | FStore1 | FStore2 | FStore3 => vec![Operand::new(Float, "value")],
        DStore | DStore0 | DStore1 | DStore2 | DStore3 => vec![Operand::new(Double, "value")],

        IAStore | BAStore | CAStore | SAStore => array_store(Int),
        LAStore => array_store(Long),
        FAStore => array_store(Float),
        DAStore => array_store(Double),
        AAStore => array_store(Reference),

        IReturn => vec![Operand::new(Int, "return value")],
        LReturn => vec![Operand::new(Long, "return value")],
        FReturn => vec![Operand::new(Float, "return value")],
        DReturn => vec![Operand::new(Double, "return value")],
        AReturn => vec![Operand::new(Reference, "return value")],

        PutField | PutStatic => {
            let member = context
                .method
                .constants
                .member_ref(line.constant_index().ok()?)?;
            let field_type = FieldType::<String>::parse(member.descriptor).ok()?;
            let mut operands = vec![];
            if line.opcode == PutField {
                operands.push(Operand::new(Reference, "object"));
            }
            let what = format!("value of {}", member.name);
            operands.push(Operand::new(ValueType::from_field_type(&field_type), what));
            operands
        }

        InvokeVirtual | InvokeSpecial | InvokeStatic | InvokeInterface | InvokeDynamic => {
            let index = line.constant_index().ok()?;
            let (name, descriptor) = if line.opcode == InvokeDynamic {
                context.method.constants.invoke_dynamic(index)?
            } else {
                let member = context.method.constants.member_ref(index)?;
                (member.name, member.descriptor)
            };
            let descriptor = MethodDescriptor::<String>::parse(descriptor).ok()?;
            let mut operands = vec![];
            if !matches!(line.opcode, InvokeStatic | InvokeDynamic) {
                operands.push(Operand::new(Reference, format!("receiver of {}", name)));
            }
            for (i, parameter) in descriptor.parameters.iter().enumerate() {
                let what = format!("argument {} of {}", i + 1, name);
                operands.push(Operand::new(ValueType::from_field_type(parameter), what));
            }
            operands
        }

        _ => return None,
    };
    Some(operands)
}

/// Compare the top of a state against expected operands
///
/// Unknown values match anything. Missing operands are left to the size report.
fn check_operands(state: &StackState, expected: &[Operand]) -> Vec<String> {
    let actual: Vec<ValueType> = state
        .entries()
        .rev()
        .take(expected.len())
        .map(|entry| entry.value_type)
        .collect();
    expected
        .iter()
        .rev()
        .zip(actual)
        .filter(|(operand, found)| {
            *found != ValueType::Unknown && operand.value_type != *found
        })
        .map(|(operand, found)| {
            format!(
                "expected {} for {} but found {}",
                operand.value_type, operand.what, found
            )
        })
        .collect()
}
