//! Diagnostics computed from a finished analysis
//!
//! Every section is an independent read-only pass over the per-node states. Nothing here changes
//! the analysis: a report can be built (or rebuilt with different settings) at any time.

mod content;
mod loops;
mod size;
mod summary;
mod types;

pub use content::content_report;
pub use loops::loop_report;
pub use size::size_report;
pub use summary::summary_report;
pub use types::type_report;

use crate::analysis::StackAnalysis;
use crate::bytecode::{InstructionLine, MethodBody};
use crate::graph::{ControlFlowGraph, Node, NodeId};
use crate::{ReportKinds, Settings};
use std::fmt;

/// How bad a finding is
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One line of a report
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Finding {
    pub severity: Severity,

    /// Node the finding is about (method-wide findings have none)
    pub node: Option<NodeId>,

    /// Where the finding is, for display (eg. `4 iadd`)
    pub location: String,

    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "[{}] {}", self.severity, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.severity, self.location, self.message)
        }
    }
}

/// Report section
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Section {
    pub kind: ReportKinds,
    pub title: &'static str,
    pub findings: Vec<Finding>,
}

impl Section {
    fn new(kind: ReportKinds, title: &'static str) -> Section {
        Section {
            kind,
            title,
            findings: vec![],
        }
    }

    fn add(&mut self, severity: Severity, node: Option<(NodeId, &Node)>, message: String) {
        let (node, location) = match node {
            Some((id, node)) => (Some(id), format!("{} {}", node.offset, node.mnemonic)),
            None => (None, String::new()),
        };
        self.findings.push(Finding {
            severity,
            node,
            location,
            message,
        });
    }

    /// Findings of a given severity
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |finding| finding.severity == severity)
    }

    /// Findings about a given node
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |finding| finding.node == Some(node))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        for finding in &self.findings {
            writeln!(f, "{}", finding)?;
        }
        Ok(())
    }
}

/// Inputs shared by every report section
pub struct ReportContext<'a> {
    pub method: &'a MethodBody,
    pub graph: &'a ControlFlowGraph,
    pub analysis: &'a StackAnalysis,
    pub settings: &'a Settings,
}

impl<'a> ReportContext<'a> {
    /// Instruction of a node, if it has one
    fn instruction(&self, node: &Node) -> Option<&'a InstructionLine> {
        node.instruction
            .and_then(|index| self.method.instructions.get(index))
    }
}

/// All enabled report sections for one analyzed method
#[derive(Clone, Debug)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl Report {
    /// Build the sections enabled in the settings
    pub fn build(
        method: &MethodBody,
        graph: &ControlFlowGraph,
        analysis: &StackAnalysis,
        settings: &Settings,
    ) -> Report {
        let context = ReportContext {
            method,
            graph,
            analysis,
            settings,
        };
        let reporters: [(ReportKinds, fn(&ReportContext) -> Section); 5] = [
            (ReportKinds::SIZE, size_report),
            (ReportKinds::TYPES, type_report),
            (ReportKinds::CONTENT, content_report),
            (ReportKinds::LOOPS, loop_report),
            (ReportKinds::SUMMARY, summary_report),
        ];
        let sections = reporters
            .iter()
            .filter(|(kind, _)| settings.reports.contains(*kind))
            .map(|(_, reporter)| reporter(&context))
            .collect();
        Report { sections }
    }

    pub fn section(&self, kind: ReportKinds) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    /// Findings of a given severity, across all sections
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.sections
            .iter()
            .flat_map(move |section| section.with_severity(severity))
    }

    pub fn has_errors(&self) -> bool {
        self.with_severity(Severity::Error).next().is_some()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", section)?;
        }
        Ok(())
    }
}
