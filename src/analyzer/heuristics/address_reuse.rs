//! Receiving-address reuse

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::heuristics::{ledger_location, short, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{TransactionGraph, TxIndex};
use crate::models::transaction::Address;

/// An address receiving from `reuse_min_counterparties` or more distinct
/// senders ties all of them together. `heavy_reuse_counterparties` or more
/// is heavy reuse.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let threshold = context.config.reuse_min_counterparties;

    let mut received: BTreeMap<Address, (BTreeSet<Address>, BTreeSet<TxIndex>)> = BTreeMap::new();
    for (index, tx) in graph.transactions().iter().enumerate() {
        for transfer in tx.transfers() {
            if transfer.source == transfer.destination {
                continue;
            }
            let (senders, txs) = received.entry(transfer.destination).or_default();
            senders.insert(transfer.source);
            txs.insert(index);
        }
    }

    let mut findings = Vec::new();
    for (recipient, (senders, txs)) in received {
        if senders.len() < threshold {
            continue;
        }
        let rule = if senders.len() >= context.config.heavy_reuse_counterparties {
            PolicyRule::AddressReuseHeavy
        } else {
            PolicyRule::AddressReuse
        };
        let txs: Vec<TxIndex> = txs.into_iter().collect();
        let message = format!(
            "Address {} received funds from {} distinct senders, linking them through a shared counterparty",
            short(&recipient),
            senders.len()
        );
        let evidence = std::iter::once(recipient).chain(senders).map(|a| a.to_string());

        findings.push(
            context
                .finding(
                    FindingType::AddressReuse,
                    rule,
                    ledger_location(graph, &txs),
                    message,
                    "Use a fresh receiving address per counterparty",
                )
                .with_evidence(evidence)
                .with_identifier(recipient.to_string()),
        );
    }

    Ok(findings)
}
