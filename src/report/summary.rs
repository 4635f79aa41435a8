use super::{ReportContext, Section, Severity};
use crate::ReportKinds;

/// Method-wide statistics
pub fn summary_report(context: &ReportContext) -> Section {
    let mut section = Section::new(ReportKinds::SUMMARY, "Summary");
    let metrics = context.analysis.metrics();
    let max_stack = context.settings.max_stack_for(context.method.max_stack);

    let lines = [
        ("nodes", context.graph.node_count()),
        ("analyzed nodes", metrics.analyzed_nodes),
        ("errored nodes", metrics.errored_nodes),
        ("back edges", context.analysis.back_edges().len()),
        ("max stack size", metrics.max_stack_size),
        ("declared max stack", max_stack as usize),
        ("max states per node", metrics.max_states_per_node),
        ("max entries per state", metrics.max_entries_per_state),
        ("synthetic local names", context.analysis.synthetic_locals()),
    ];
    for (what, count) in lines {
        section.add(Severity::Info, None, format!("{}: {}", what, count));
    }

    section
}
