use super::{ReportContext, Section, Severity};
use crate::analysis::{StackState, StateSet};
use crate::graph::NodeId;
use crate::ReportKinds;

/// Values on the stack around every node
///
/// At join points, a state that arrives unchanged along more than one incoming branch means the
/// branches computed the same thing, which usually points at a dead (or duplicated) branch.
pub fn content_report(context: &ReportContext) -> Section {
    let mut section = Section::new(ReportKinds::CONTENT, "Stack content");

    for (id, property) in context.analysis.properties() {
        let node = match context.graph.node(id) {
            Some(node) => node,
            None => continue,
        };

        let message = format!(
            "before {}, after {}",
            render(&property.states_before),
            render(&property.states_after)
        );
        section.add(Severity::Info, Some((id, node)), message);

        let predecessors: Vec<NodeId> = context.graph.predecessors(id).collect();
        if predecessors.len() < 2 {
            continue;
        }
        for state in &property.states_before {
            let arrivals = predecessors
                .iter()
                .filter(|predecessor| delivers(context, **predecessor, state))
                .count();
            if arrivals > 1 {
                let message = format!(
                    "state {} arrives from {} branches (possibly dead branch)",
                    state, arrivals
                );
                section.add(Severity::Warning, Some((id, node)), message);
            }
        }
    }

    section
}

fn delivers(context: &ReportContext, predecessor: NodeId, state: &StackState) -> bool {
    context
        .analysis
        .property(predecessor)
        .map_or(false, |property| property.states_after.contains(state))
}

fn render(states: &StateSet) -> String {
    if states.is_empty() {
        return String::from("(none)");
    }
    states.signatures().join(" | ")
}
