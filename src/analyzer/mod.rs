//! Core scan engine: normalize, evaluate, aggregate

pub mod aggregator;
pub mod heuristics;
pub mod runner;

use std::sync::Arc;

use log::{debug, info};

use crate::config::{EngineConfig, ScanConfig};
use crate::errors::{ScanError, ScanResult, ScanStage};
use crate::models::raw::ScanInput;
use crate::models::report::{Completeness, Report};
use crate::normalizer;
use crate::utils::control::ScanControl;

pub use self::heuristics::{Heuristic, HeuristicContext, HeuristicId};

/// Main analyzer that coordinates a scan
pub struct Analyzer {
    config: EngineConfig,
    heuristics: Vec<Arc<dyn Heuristic>>,
}

impl Analyzer {
    /// Validate the configuration and build the registry. Configuration
    /// errors surface here, before any input is looked at.
    pub fn new(config: ScanConfig) -> ScanResult<Self> {
        Ok(Self::with_config(EngineConfig::new(config)?))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let heuristics = heuristics::registry(&config.heuristics);
        Self { config, heuristics }
    }

    /// Register an additional heuristic
    pub fn with_heuristic(mut self, heuristic: Arc<dyn Heuristic>) -> Self {
        self.heuristics.push(heuristic);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ids of the registered heuristics, in registration order
    pub fn heuristic_ids(&self) -> Vec<&str> {
        self.heuristics.iter().map(|h| h.id()).collect()
    }

    /// Scan with the configured timeout and no external cancellation
    pub fn scan(&self, input: &ScanInput) -> ScanResult<Report> {
        self.scan_with_control(input, &ScanControl::default())
    }

    /// Scan under a caller-supplied cancellation token and deadline.
    ///
    /// An interruption during normalization yields no report. An
    /// interruption while heuristics run yields the partial report built
    /// from the heuristics that finished, inside the error.
    pub fn scan_with_control(&self, input: &ScanInput, control: &ScanControl) -> ScanResult<Report> {
        let control = match self.config.timeout {
            Some(timeout) => control.clone().with_timeout(timeout),
            None => control.clone(),
        };
        if let Some(interrupt) = control.interrupted() {
            return Err(ScanError::interrupted(interrupt, ScanStage::Normalize, None));
        }

        let normalized = normalizer::normalize(input, &control)?;
        info!(
            "Scanning {} with {} heuristics ({} records skipped)",
            normalized.graph.kind(),
            self.heuristics.len(),
            normalized.warnings.len()
        );

        let context = HeuristicContext::new(&self.config);
        let outcome = runner::run(&self.heuristics, &normalized.graph, &context, &control, self.config.parallel);

        let completeness = if outcome.skipped.is_empty() {
            Completeness::Complete
        } else {
            Completeness::Partial { skipped: outcome.skipped.clone() }
        };
        let report = aggregator::aggregate(
            outcome.findings,
            &self.config.policy,
            normalized.warnings,
            outcome.failures,
            completeness,
        );
        debug!("Report summary: {:?}", report.summary());

        match outcome.interrupt {
            Some(interrupt) => Err(ScanError::interrupted(interrupt, ScanStage::Evaluate, Some(report))),
            None => Ok(report),
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}
