//! Distinctive amount reuse

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::heuristics::{ledger_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::constants::programs::ROUND_AMOUNT_UNIT;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{TransactionGraph, TxIndex};
use crate::models::transaction::Address;

/// A non-round amount moving between several distinct sender/recipient
/// pairs acts as a fingerprint linking those transfers.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let mut by_amount: BTreeMap<u64, (BTreeSet<(Address, Address)>, BTreeSet<TxIndex>)> = BTreeMap::new();
    for (index, tx) in graph.transactions().iter().enumerate() {
        for transfer in tx.transfers() {
            if transfer.amount == 0 || transfer.amount % ROUND_AMOUNT_UNIT == 0 {
                continue;
            }
            let (pairs, txs) = by_amount.entry(transfer.amount).or_default();
            pairs.insert((transfer.source, transfer.destination));
            txs.insert(index);
        }
    }

    let mut findings = Vec::new();
    for (amount, (pairs, txs)) in by_amount {
        if pairs.len() < context.config.amount_min_occurrences {
            continue;
        }
        let txs: Vec<TxIndex> = txs.into_iter().collect();
        let parties: BTreeSet<Address> = pairs.iter().flat_map(|(s, d)| [*s, *d]).collect();
        let message = format!(
            "The exact amount {} moved between {} different sender/recipient pairs, making those transfers linkable",
            amount,
            pairs.len()
        );

        findings.push(
            context
                .finding(
                    FindingType::AmountReuse,
                    PolicyRule::AmountReuse,
                    ledger_location(graph, &txs),
                    message,
                    "Vary amounts slightly or split payments so distinctive values do not repeat",
                )
                .with_evidence(parties.iter().map(|a| a.to_string()).chain(std::iter::once(amount.to_string())))
                .with_identifier(amount.to_string()),
        );
    }

    Ok(findings)
}
