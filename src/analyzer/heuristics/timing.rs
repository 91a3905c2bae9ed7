//! Timing correlation between fee payers

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::heuristics::{ledger_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{AddressId, TransactionGraph, TxIndex};
use crate::utils::union_find::UnionFind;

/// Distinct fee payers whose transactions land within the timing window of
/// each other are co-active. A pair is correlated once each side brings at
/// least `timing_min_occurrences` distinct co-active transactions, so one
/// transaction next to a burst from the other side is a single coincidence.
/// Correlated pairs are merged into groups.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let window = context.config.timing_window_secs.unsigned_abs();

    let mut timed: Vec<(i64, TxIndex, AddressId)> = Vec::new();
    for (index, tx) in graph.transactions().iter().enumerate() {
        let time = match tx.block_time {
            Some(time) => time,
            None => continue,
        };
        let payer = graph
            .address_id(&tx.fee_payer)
            .ok_or_else(|| HeuristicError::new(format!("fee payer of {} missing from graph", tx.signature)))?;
        timed.push((time, index, payer));
    }
    timed.sort_unstable();

    // (lower id, higher id) -> co-active transactions of each side
    let mut pairs: BTreeMap<(AddressId, AddressId), CoActivity> = BTreeMap::new();
    for (i, &(time_a, tx_a, payer_a)) in timed.iter().enumerate() {
        for &(time_b, tx_b, payer_b) in &timed[i + 1..] {
            if time_b.abs_diff(time_a) > window {
                break;
            }
            if payer_a == payer_b {
                continue;
            }
            let (low, high) = if payer_a < payer_b { (tx_a, tx_b) } else { (tx_b, tx_a) };
            let entry = pairs.entry((payer_a.min(payer_b), payer_a.max(payer_b))).or_default();
            entry.low.insert(low);
            entry.high.insert(high);
        }
    }

    let correlated: Vec<(&(AddressId, AddressId), &CoActivity)> = pairs
        .iter()
        .filter(|(_, activity)| activity.occurrences() >= context.config.timing_min_occurrences)
        .collect();
    if correlated.is_empty() {
        return Ok(Vec::new());
    }

    let mut forest = UnionFind::new(graph.addresses().len());
    for ((a, b), _) in &correlated {
        forest.union(*a, *b);
    }
    let mut txs_by_root: BTreeMap<AddressId, BTreeSet<TxIndex>> = BTreeMap::new();
    for ((a, _), activity) in &correlated {
        let root = forest.find(*a);
        txs_by_root
            .entry(root)
            .or_default()
            .extend(activity.low.iter().chain(activity.high.iter()).copied());
    }

    let mut findings = Vec::new();
    for group in forest.groups() {
        let root = forest.find(group[0]);
        let txs: Vec<TxIndex> = txs_by_root.remove(&root).unwrap_or_default().into_iter().collect();
        let rule = if group.len() >= context.config.timing_group_size {
            PolicyRule::TimingGroup
        } else {
            PolicyRule::TimingPair
        };
        let message = format!(
            "{} addresses repeatedly transacted within {} seconds of each other, suggesting coordinated control",
            group.len(),
            window
        );
        findings.push(
            context
                .finding(
                    FindingType::TimingCorrelation,
                    rule,
                    ledger_location(graph, &txs),
                    message,
                    "Randomize submission times and avoid batching activity of wallets that should stay unlinked",
                )
                .with_evidence(group.iter().map(|&id| graph.address(id).to_string())),
        );
    }

    Ok(findings)
}

#[derive(Default)]
struct CoActivity {
    low: BTreeSet<TxIndex>,
    high: BTreeSet<TxIndex>,
}

impl CoActivity {
    /// Repeats seen from both sides
    fn occurrences(&self) -> usize {
        self.low.len().min(self.high.len())
    }
}
