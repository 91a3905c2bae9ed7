//! Common-input-ownership clustering

use std::collections::BTreeMap;

use log::trace;

use crate::analyzer::heuristics::{ledger_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{AddressId, TransactionGraph, TxIndex};
use crate::utils::union_find::UnionFind;

/// Addresses that ever co-sign a transaction are assumed to share an owner.
/// One finding per connected component at or above the size threshold.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let mut forest = UnionFind::new(graph.addresses().len());
    for edge in graph.co_sign_edges() {
        forest.union(edge.a, edge.b);
    }

    let mut txs_by_root: BTreeMap<AddressId, Vec<TxIndex>> = BTreeMap::new();
    for edge in graph.co_sign_edges() {
        let root = forest.find(edge.a);
        txs_by_root.entry(root).or_default().push(edge.tx);
    }

    let mut findings = Vec::new();
    for group in forest.groups() {
        if group.len() < context.config.cluster_size_threshold {
            trace!("Cluster of {} below threshold", group.len());
            continue;
        }
        let root = forest.find(group[0]);
        let mut txs = txs_by_root.remove(&root).unwrap_or_default();
        txs.sort_unstable();
        txs.dedup();

        let rule = if group.len() >= context.config.critical_cluster_size {
            PolicyRule::ClusterLarge
        } else {
            PolicyRule::ClusterSmall
        };
        let members: Vec<String> = group.iter().map(|&id| graph.address(id).to_string()).collect();
        let message = format!(
            "{} addresses co-signed {} transaction(s) and are likely controlled by one entity",
            group.len(),
            txs.len()
        );

        findings.push(
            context
                .finding(
                    FindingType::AddressClustering,
                    rule,
                    ledger_location(graph, &txs),
                    message,
                    "Avoid signing one transaction with keys of wallets meant to stay unlinked",
                )
                .with_evidence(members),
        );
    }

    Ok(findings)
}
