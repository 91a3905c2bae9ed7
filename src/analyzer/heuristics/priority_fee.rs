//! Priority-fee fingerprinting

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::heuristics::{ledger_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{TransactionGraph, TxIndex};
use crate::models::transaction::Address;

/// A compute-unit price set in `priority_fee_min_occurrences` or more
/// transactions is a fingerprint. Shared by several fee payers, it links
/// those wallets to one client.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let mut by_price: BTreeMap<u64, (BTreeSet<Address>, BTreeSet<TxIndex>)> = BTreeMap::new();
    for (index, tx) in graph.transactions().iter().enumerate() {
        if let Some(price) = tx.compute_unit_price().filter(|price| *price > 0) {
            let (payers, txs) = by_price.entry(price).or_default();
            payers.insert(tx.fee_payer);
            txs.insert(index);
        }
    }

    let mut findings = Vec::new();
    for (price, (payers, txs)) in by_price {
        if txs.len() < context.config.priority_fee_min_occurrences {
            continue;
        }
        let (rule, message) = if payers.len() >= 2 {
            (
                PolicyRule::PriorityFeeCrossWallet,
                format!(
                    "{} fee payers used the same compute-unit price of {} micro-lamports, suggesting one client or operator",
                    payers.len(),
                    price
                ),
            )
        } else {
            (
                PolicyRule::PriorityFeeFingerprint,
                format!(
                    "{} transactions used the distinctive compute-unit price of {} micro-lamports",
                    txs.len(),
                    price
                ),
            )
        };
        let txs: Vec<TxIndex> = txs.into_iter().collect();

        findings.push(
            context
                .finding(
                    FindingType::PriorityFeeFingerprint,
                    rule,
                    ledger_location(graph, &txs),
                    message,
                    "Use the wallet's default or a network-estimated priority fee rather than a fixed custom value",
                )
                .with_evidence(payers.iter().map(|a| a.to_string()).chain(std::iter::once(price.to_string())))
                .with_identifier(price.to_string()),
        );
    }

    Ok(findings)
}
