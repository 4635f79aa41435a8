use super::{ReportContext, Section, Severity};
use crate::bytecode::Opcode;
use crate::graph::VertexKind;
use crate::ReportKinds;
use std::collections::BTreeSet;

/// Stack sizes per node, checked against the declared maximum
pub fn size_report(context: &ReportContext) -> Section {
    let mut section = Section::new(ReportKinds::SIZE, "Stack size");
    let max_stack = context.settings.max_stack_for(context.method.max_stack) as usize;

    for (id, node) in context.graph.nodes() {
        let property = match context.analysis.property(id) {
            Some(property) => property,
            None => {
                let message = "not analyzed (unreachable, or only reachable through an error)";
                section.add(Severity::Warning, Some((id, node)), message.to_owned());
                continue;
            }
        };

        let sizes: BTreeSet<usize> = property
            .states_before
            .iter()
            .map(|state| state.size_in_words())
            .collect();
        let sizes_text = sizes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if sizes.len() > 1 {
            let message = format!("inconsistent stack sizes: {}", sizes_text);
            section.add(Severity::Error, Some((id, node)), message);
        } else {
            let message = format!("stack size {}", sizes_text);
            section.add(Severity::Info, Some((id, node)), message);
        }

        if let Some(err) = &property.error {
            let message = format!("stack underflow ({})", err);
            section.add(Severity::Error, Some((id, node)), message);
        }

        let largest = property
            .states_before
            .max_size_in_words()
            .max(property.states_after.max_size_in_words());
        if largest > max_stack {
            let message = format!("stack size {} exceeds max_stack {}", largest, max_stack);
            section.add(Severity::Error, Some((id, node)), message);
        }

        if node.kind == VertexKind::Return {
            let is_throw = context
                .instruction(node)
                .map_or(false, |line| line.opcode == Opcode::AThrow);
            let leftover = property
                .states_after
                .iter()
                .filter(|state| !state.is_empty())
                .filter(|state| !(is_throw && state.len() == 1))
                .count();
            if leftover > 0 {
                let message = format!("stack not empty on exit ({} state(s))", leftover);
                section.add(Severity::Warning, Some((id, node)), message);
            }
        }
    }

    section
}
