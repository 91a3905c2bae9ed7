//! Normalizer: raw collaborator input into one of the two canonical graphs.
//!
//! Normalization is total over well-formed input. A record or syntax node
//! that cannot be used is skipped and reported as a [`SkippedRecord`]
//! instead of being dropped silently.

pub mod decode;
pub mod ledger;
pub mod source;

use std::fmt;

use crate::errors::ScanResult;
use crate::models::code::CodePatternGraph;
use crate::models::graph::TransactionGraph;
use crate::models::raw::ScanInput;
use crate::models::report::SkippedRecord;
use crate::utils::control::ScanControl;

/// Which graph a heuristic reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Ledger,
    Source,
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ledger => write!(f, "transaction graph"),
            Self::Source => write!(f, "code pattern graph"),
        }
    }
}

/// A normalized scan input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanGraph {
    Ledger(TransactionGraph),
    Source(CodePatternGraph),
}

impl ScanGraph {
    pub fn kind(&self) -> GraphKind {
        match self {
            Self::Ledger(_) => GraphKind::Ledger,
            Self::Source(_) => GraphKind::Source,
        }
    }
}

/// Normalizer output
#[derive(Debug, Clone)]
pub struct Normalized {
    pub graph: ScanGraph,
    /// Records skipped during normalization, in input order
    pub warnings: Vec<SkippedRecord>,
}

/// Normalize any scan input
pub fn normalize(input: &ScanInput, control: &ScanControl) -> ScanResult<Normalized> {
    let (graph, warnings) = match input {
        ScanInput::Ledger(snapshot) => {
            let (graph, warnings) = ledger::normalize_snapshot(snapshot, control)?;
            (ScanGraph::Ledger(graph), warnings)
        }
        ScanInput::Source(unit) => {
            let (graph, warnings) = source::normalize_source(unit, control)?;
            (ScanGraph::Source(graph), warnings)
        }
    };
    Ok(Normalized { graph, warnings })
}
