//! On-chain fee-payer reuse

use std::collections::BTreeSet;

use crate::analyzer::heuristics::{ledger_location, short, within_window, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{TransactionGraph, TxIndex};
use crate::models::transaction::Address;

/// A fee payer paying for transactions signed by other wallets, where two
/// of those transactions inside the window send to disjoint recipients.
/// Sponsoring `fee_payer_linked_wallets` or more distinct wallets links
/// them to each other.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let window = context.config.fee_payer_window_secs;
    let mut findings = Vec::new();

    for (payer_id, payer) in graph.addresses().iter().enumerate() {
        let sponsored: Vec<(TxIndex, Vec<Address>)> = graph
            .fee_payments(payer_id)
            .iter()
            .copied()
            .filter(|&tx| graph.transaction(tx).signers.iter().any(|s| s != payer))
            .map(|tx| (tx, graph.transaction(tx).recipients()))
            .filter(|(_, recipients)| !recipients.is_empty())
            .collect();
        if sponsored.len() < 2 {
            continue;
        }

        let mut linked = BTreeSet::new();
        for (i, (a, recipients_a)) in sponsored.iter().enumerate() {
            for (b, recipients_b) in &sponsored[i + 1..] {
                if !within_window(graph.transaction(*a), graph.transaction(*b), window) {
                    continue;
                }
                if recipients_a.iter().any(|r| recipients_b.binary_search(r).is_ok()) {
                    continue;
                }
                linked.insert(*a);
                linked.insert(*b);
            }
        }
        if linked.is_empty() {
            continue;
        }

        let wallets: BTreeSet<Address> = linked
            .iter()
            .flat_map(|&tx| graph.transaction(tx).signers.iter().copied())
            .filter(|s| s != payer)
            .collect();
        let txs: Vec<TxIndex> = linked.into_iter().collect();

        let (rule, message) = if wallets.len() >= context.config.fee_payer_linked_wallets {
            (
                PolicyRule::FeePayerLinksWallets,
                format!(
                    "Fee payer {} paid for {} unrelated transfers signed by {} different wallets, linking those wallets to one operator",
                    short(payer),
                    txs.len(),
                    wallets.len()
                ),
            )
        } else {
            (
                PolicyRule::FeePayerReused,
                format!(
                    "Fee payer {} paid for {} unrelated transfers signed by {} other wallet(s)",
                    short(payer),
                    txs.len(),
                    wallets.len()
                ),
            )
        };

        let evidence = std::iter::once(payer).chain(wallets.iter()).map(|a| a.to_string());
        findings.push(
            context
                .finding(
                    FindingType::FeePayerReuse,
                    rule,
                    ledger_location(graph, &txs),
                    message,
                    "Use a distinct fee payer per wallet, or let each wallet pay its own fees",
                )
                .with_evidence(evidence)
                .with_identifier(payer.to_string()),
        );
    }

    Ok(findings)
}
