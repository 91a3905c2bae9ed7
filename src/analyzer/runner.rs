//! Heuristic runner.
//!
//! Fans the registry out over one graph, on the rayon pool or sequentially,
//! and fans the results back in. A heuristic that returns an error or panics
//! is recorded as a [`HeuristicFailure`] and contributes nothing; the others
//! are unaffected. The cancellation token and deadline are checked before
//! each heuristic starts.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;

use crate::analyzer::heuristics::{Heuristic, HeuristicContext};
use crate::models::finding::Finding;
use crate::models::report::HeuristicFailure;
use crate::normalizer::ScanGraph;
use crate::utils::control::{Interrupt, ScanControl};

/// Merged output of one run
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Findings of every heuristic that succeeded, in report order
    pub findings: Vec<Finding>,
    /// Failed heuristics, sorted by id
    pub failures: Vec<HeuristicFailure>,
    /// Heuristics that never started because the scan was interrupted
    pub skipped: Vec<String>,
    /// Set when `skipped` is non-empty
    pub interrupt: Option<Interrupt>,
}

enum Outcome {
    Findings(Vec<Finding>),
    Failed(HeuristicFailure),
    Skipped(String),
}

/// Run every applicable heuristic against `graph`
pub fn run(
    heuristics: &[Arc<dyn Heuristic>],
    graph: &ScanGraph,
    context: &HeuristicContext<'_>,
    control: &ScanControl,
    parallel: bool,
) -> RunOutcome {
    let applicable: Vec<&dyn Heuristic> = heuristics
        .iter()
        .map(|h| &**h)
        .filter(|h| h.applies_to() == graph.kind())
        .collect();
    debug!("Running {} heuristics over the {}", applicable.len(), graph.kind());

    let outcomes: Vec<Outcome> = if parallel {
        applicable
            .par_iter()
            .map(|heuristic| run_one(*heuristic, graph, context, control))
            .collect()
    } else {
        applicable
            .iter()
            .map(|heuristic| run_one(*heuristic, graph, context, control))
            .collect()
    };

    let mut merged = RunOutcome::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Findings(findings) => merged.findings.extend(findings),
            Outcome::Failed(failure) => merged.failures.push(failure),
            Outcome::Skipped(id) => merged.skipped.push(id),
        }
    }
    merged.findings.sort_by(|a, b| a.report_order(b));
    merged.failures.sort();
    merged.skipped.sort();
    if !merged.skipped.is_empty() {
        merged.interrupt = Some(control.interrupted().unwrap_or(Interrupt::Cancelled));
    }
    merged
}

fn run_one(
    heuristic: &dyn Heuristic,
    graph: &ScanGraph,
    context: &HeuristicContext<'_>,
    control: &ScanControl,
) -> Outcome {
    let id = heuristic.id().to_string();
    if control.interrupted().is_some() {
        debug!("Skipping heuristic {}: scan interrupted", id);
        return Outcome::Skipped(id);
    }

    match panic::catch_unwind(AssertUnwindSafe(|| heuristic.evaluate(graph, context))) {
        Ok(Ok(findings)) => {
            debug!("Heuristic {} produced {} findings", id, findings.len());
            Outcome::Findings(findings)
        }
        Ok(Err(e)) => {
            warn!("Heuristic {} failed: {}", id, e);
            Outcome::Failed(HeuristicFailure { heuristic: id, cause: e.to_string() })
        }
        Err(payload) => {
            let cause = panic_message(payload.as_ref());
            warn!("Heuristic {} panicked: {}", id, cause);
            Outcome::Failed(HeuristicFailure { heuristic: id, cause })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
