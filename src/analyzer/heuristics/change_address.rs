//! Change-address detection

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzer::heuristics::{ledger_location, short, within_window, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{TransactionGraph, TxIndex};
use crate::constants::programs::ROUND_AMOUNT_UNIT;
use crate::models::transaction::{Address, Transaction};

/// A recipient first seen in a transfer that spends again inside the change
/// window looks like a change or self address. When the later spend pays
/// back the original sender, or someone that sender paid, the round trip is
/// reported with the higher rule. Otherwise an amount that gives the change
/// away (the odd leg of a split beside a round payment, or a later spend that
/// sweeps what was received) upgrades the plain rule.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let window = context.config.change_window_secs;

    // Every destination each source has paid
    let mut paid: BTreeMap<Address, BTreeSet<Address>> = BTreeMap::new();
    // Transactions in which each address is a transfer source
    let mut spends: BTreeMap<Address, Vec<TxIndex>> = BTreeMap::new();
    for (index, tx) in graph.transactions().iter().enumerate() {
        for transfer in tx.transfers() {
            paid.entry(transfer.source).or_default().insert(transfer.destination);
            spends.entry(transfer.source).or_default().push(index);
        }
    }

    let mut reported = BTreeSet::new();
    let mut findings = Vec::new();

    for (funding, tx) in graph.transactions().iter().enumerate() {
        for transfer in tx.transfers() {
            let (sender, recipient) = (transfer.source, transfer.destination);
            if sender == recipient || reported.contains(&recipient) {
                continue;
            }
            let fresh = graph
                .address_id(&recipient)
                .and_then(|id| graph.appearances(id).first().copied())
                == Some(funding);
            if !fresh {
                continue;
            }

            let spend = spends.get(&recipient).and_then(|txs| {
                txs.iter()
                    .copied()
                    .find(|&later| later > funding && within_window(tx, graph.transaction(later), window))
            });
            let spend = match spend {
                Some(spend) => spend,
                None => continue,
            };
            reported.insert(recipient);

            let round_trip = graph.transaction(spend).transfers().any(|t| {
                t.source == recipient
                    && (t.destination == sender
                        || paid.get(&sender).map_or(false, |set| set.contains(&t.destination) && t.destination != recipient))
            });
            let (rule, message) = if round_trip {
                (
                    PolicyRule::ChangeAddressRoundTrip,
                    format!(
                        "Fresh address {} was funded by {} and sent funds back to that wallet's counterparties",
                        short(&recipient),
                        short(&sender)
                    ),
                )
            } else if amount_signal(tx, graph.transaction(spend), sender, recipient) {
                (
                    PolicyRule::ChangeAddressAmount,
                    format!(
                        "Fresh address {} was funded by {} with an amount that marks it as change and spent again shortly after",
                        short(&recipient),
                        short(&sender)
                    ),
                )
            } else {
                (
                    PolicyRule::ChangeAddress,
                    format!(
                        "Fresh address {} was funded by {} and spent again shortly after, like a change address",
                        short(&recipient),
                        short(&sender)
                    ),
                )
            };

            findings.push(
                context
                    .finding(
                        FindingType::ChangeAddress,
                        rule,
                        ledger_location(graph, &[funding, spend]),
                        message,
                        "Do not route change through fresh addresses that are spent right away; let funds rest or use an unrelated wallet",
                    )
                    .with_evidence([sender.to_string(), recipient.to_string()])
                    .with_identifier(recipient.to_string()),
            );
        }
    }

    Ok(findings)
}

fn is_round(amount: u64) -> bool {
    amount != 0 && amount % ROUND_AMOUNT_UNIT == 0
}

/// The funding split pays a round amount elsewhere and a non-round amount to
/// `recipient`, or the spend moves at least 90% of what `recipient` received.
fn amount_signal(funding: &Transaction, spend: &Transaction, sender: Address, recipient: Address) -> bool {
    let mut received: u128 = 0;
    let mut odd_leg = false;
    let mut round_elsewhere = false;
    for transfer in funding.transfers().filter(|t| t.source == sender) {
        if transfer.destination == recipient {
            received += u128::from(transfer.amount);
            odd_leg |= transfer.amount != 0 && !is_round(transfer.amount);
        } else {
            round_elsewhere |= is_round(transfer.amount);
        }
    }
    if odd_leg && round_elsewhere {
        return true;
    }

    let spent: u128 = spend
        .transfers()
        .filter(|t| t.source == recipient && t.destination != recipient)
        .map(|t| u128::from(t.amount))
        .sum();
    received > 0 && spent <= received && spent * 10 >= received * 9
}
