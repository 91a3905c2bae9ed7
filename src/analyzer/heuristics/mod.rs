//! Heuristic registry.
//!
//! The catalog is a closed enumeration, [`HeuristicId`], registered at
//! compile time. Every variant implements [`Heuristic`], the one seam the
//! runner evaluates through; tests supply their own implementations of the
//! trait to exercise failure isolation.

mod address_reuse;
mod amount_reuse;
mod change_address;
mod clustering;
mod fee_payer;
mod known_entity;
mod memo;
mod priority_fee;
mod static_fee_payer;
mod static_memo;
mod timing;

use std::fmt;
use std::sync::Arc;

use crate::config::policy::PolicyRule;
use crate::config::EngineConfig;
use crate::errors::HeuristicError;
use crate::models::code::CodePatternGraph;
use crate::models::finding::{Finding, FindingType, Location};
use crate::models::graph::TransactionGraph;
use crate::models::transaction::{Address, Transaction};
use crate::normalizer::{GraphKind, ScanGraph};

/// Read-only state shared by every heuristic during one scan
#[derive(Debug, Clone, Copy)]
pub struct HeuristicContext<'a> {
    pub config: &'a EngineConfig,
}

impl<'a> HeuristicContext<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// A finding whose severity comes from the policy table
    pub fn finding(
        &self,
        finding_type: FindingType,
        rule: PolicyRule,
        location: Location,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Finding {
        Finding::new(finding_type, rule, self.config.severity(rule), location, message, suggestion)
    }
}

/// A detector: a pure function from one graph to findings
pub trait Heuristic: Send + Sync {
    /// Stable id used in configuration and failure records
    fn id(&self) -> &str;

    /// The graph this heuristic reads
    fn applies_to(&self) -> GraphKind;

    /// Evaluate against a graph. Must not depend on any other heuristic.
    fn evaluate(&self, graph: &ScanGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError>;
}

/// The built-in catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeuristicId {
    FeePayerReuse,
    AddressClustering,
    ChangeAddress,
    TimingCorrelation,
    MemoPii,
    AddressReuse,
    KnownEntityInteraction,
    AmountReuse,
    PriorityFeeFingerprint,
    StaticFeePayerReuse,
    StaticMemoPii,
}

impl HeuristicId {
    pub const ALL: [HeuristicId; 11] = [
        Self::FeePayerReuse,
        Self::AddressClustering,
        Self::ChangeAddress,
        Self::TimingCorrelation,
        Self::MemoPii,
        Self::AddressReuse,
        Self::KnownEntityInteraction,
        Self::AmountReuse,
        Self::PriorityFeeFingerprint,
        Self::StaticFeePayerReuse,
        Self::StaticMemoPii,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeePayerReuse => "fee-payer-reuse",
            Self::AddressClustering => "address-clustering",
            Self::ChangeAddress => "change-address",
            Self::TimingCorrelation => "timing-correlation",
            Self::MemoPii => "memo-pii",
            Self::AddressReuse => "address-reuse",
            Self::KnownEntityInteraction => "known-entity-interaction",
            Self::AmountReuse => "amount-reuse",
            Self::PriorityFeeFingerprint => "priority-fee-fingerprint",
            Self::StaticFeePayerReuse => "static-fee-payer-reuse",
            Self::StaticMemoPii => "static-memo-pii",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|h| h.as_str() == id)
    }

    /// Human-readable description, for `--list-heuristics`
    pub fn description(&self) -> &'static str {
        match self {
            Self::FeePayerReuse => "One fee payer sponsoring unrelated wallets' transactions",
            Self::AddressClustering => "Addresses co-signing transactions (common-input ownership)",
            Self::ChangeAddress => "Fresh recipients that spend again shortly after funding",
            Self::TimingCorrelation => "Addresses repeatedly active within a narrow time window",
            Self::MemoPii => "Personal data or free text in on-chain memos",
            Self::AddressReuse => "Receiving addresses shared by many senders",
            Self::KnownEntityInteraction => "Interaction with catalogued exchanges, bridges and mixers",
            Self::AmountReuse => "Distinctive amounts repeated between different parties",
            Self::PriorityFeeFingerprint => "Distinctive compute-unit prices reused across transactions",
            Self::StaticFeePayerReuse => "A generated signing key reused as fee payer across sends",
            Self::StaticMemoPii => "Personal data or free text in memo instruction literals",
        }
    }

    fn kind(&self) -> GraphKind {
        match self {
            Self::StaticFeePayerReuse | Self::StaticMemoPii => GraphKind::Source,
            _ => GraphKind::Ledger,
        }
    }
}

impl fmt::Display for HeuristicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Heuristic for HeuristicId {
    fn id(&self) -> &str {
        self.as_str()
    }

    fn applies_to(&self) -> GraphKind {
        self.kind()
    }

    fn evaluate(&self, graph: &ScanGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
        match (self, graph) {
            (Self::FeePayerReuse, ScanGraph::Ledger(g)) => fee_payer::evaluate(g, context),
            (Self::AddressClustering, ScanGraph::Ledger(g)) => clustering::evaluate(g, context),
            (Self::ChangeAddress, ScanGraph::Ledger(g)) => change_address::evaluate(g, context),
            (Self::TimingCorrelation, ScanGraph::Ledger(g)) => timing::evaluate(g, context),
            (Self::MemoPii, ScanGraph::Ledger(g)) => memo::evaluate(g, context),
            (Self::AddressReuse, ScanGraph::Ledger(g)) => address_reuse::evaluate(g, context),
            (Self::KnownEntityInteraction, ScanGraph::Ledger(g)) => known_entity::evaluate(g, context),
            (Self::AmountReuse, ScanGraph::Ledger(g)) => amount_reuse::evaluate(g, context),
            (Self::PriorityFeeFingerprint, ScanGraph::Ledger(g)) => priority_fee::evaluate(g, context),
            (Self::StaticFeePayerReuse, ScanGraph::Source(g)) => static_fee_payer::evaluate(g, context),
            (Self::StaticMemoPii, ScanGraph::Source(g)) => static_memo::evaluate(g, context),
            (heuristic, graph) => Err(HeuristicError::new(format!(
                "{} cannot evaluate a {}",
                heuristic,
                graph.kind()
            ))),
        }
    }
}

/// Registry entries for the configured heuristics, in catalog order
pub fn registry(ids: &[HeuristicId]) -> Vec<Arc<dyn Heuristic>> {
    ids.iter().map(|id| Arc::new(*id) as Arc<dyn Heuristic>).collect()
}

/// `abcd...wxyz` form of an address for messages
pub(crate) fn short(address: &Address) -> String {
    let text = address.to_string();
    if text.len() <= 12 {
        return text;
    }
    format!("{}...{}", &text[..4], &text[text.len() - 4..])
}

/// Both transactions carry a block time and are at most `window` apart.
/// Transactions without a block time are never considered close.
pub(crate) fn within_window(a: &Transaction, b: &Transaction, window: i64) -> bool {
    match (a.block_time, b.block_time) {
        (Some(ta), Some(tb)) => ta.abs_diff(tb) <= window.unsigned_abs(),
        _ => false,
    }
}

pub(crate) fn ledger_location(graph: &TransactionGraph, txs: &[usize]) -> Location {
    Location::transactions(graph.signatures(txs))
}

pub(crate) fn source_location(graph: &CodePatternGraph, line: usize) -> Location {
    Location::source(graph.file.clone(), line)
}
