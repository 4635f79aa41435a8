use super::{ReportContext, Section, Severity};
use crate::analysis::ValueType;
use crate::ReportKinds;

/// Consistency of loops
///
/// Loops are not iterated during the analysis. Instead, the states flowing back along each
/// removed back edge are compared against the states the loop header was entered with: a
/// well-formed loop gets back to its header with the same type layout it started with.
pub fn loop_report(context: &ReportContext) -> Section {
    let mut section = Section::new(ReportKinds::LOOPS, "Loops");

    for edge in context.analysis.back_edges() {
        let (source, header) = match (
            context.graph.node(edge.source),
            context.graph.node(edge.target),
        ) {
            (Some(source), Some(header)) => (source, header),
            _ => continue,
        };
        let header_at = Some((edge.target, header));
        let label = format!("loop {} -> {}", source.offset, header.offset);

        let (entry, back) = match (
            context.analysis.property(edge.target),
            context.analysis.property(edge.source),
        ) {
            (Some(entry), Some(back)) if !back.is_errored() => (entry, back),
            _ => {
                let message = format!("{}: not analyzed", label);
                section.add(Severity::Warning, header_at, message);
                continue;
            }
        };

        let entry_layouts: Vec<Vec<ValueType>> = entry
            .states_before
            .iter()
            .map(|state| state.types())
            .collect();
        let mut consistent = true;
        for state in &back.states_after {
            if !entry_layouts.contains(&state.types()) {
                consistent = false;
                let message = format!(
                    "{}: state {} on the back edge does not match any entry state",
                    label, state
                );
                section.add(Severity::Error, header_at, message);
            }
        }
        if consistent {
            let message = format!("{}: consistent", label);
            section.add(Severity::Info, header_at, message);
        }
    }

    section
}
