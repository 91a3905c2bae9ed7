//! Interaction with catalogued entities

use crate::analyzer::heuristics::{ledger_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::constants::entities::EntityKind;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::{TransactionGraph, TxIndex};

/// One finding per catalogued entity the snapshot touches. Exchanges hold
/// identity records for their users and use the higher rule.
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let catalog = &context.config.known_entities;
    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for (address, entity) in catalog {
        let txs: Vec<TxIndex> = match graph.address_id(address) {
            Some(id) => graph.appearances(id).to_vec(),
            None => continue,
        };
        let rule = match entity.kind {
            EntityKind::Exchange => PolicyRule::KnownEntityExchange,
            EntityKind::Bridge | EntityKind::Mixer | EntityKind::Service => PolicyRule::KnownEntity,
        };
        let message = format!(
            "{} transaction(s) interact with {} ({}), which can associate this activity with an identity",
            txs.len(),
            entity.label,
            entity.kind
        );
        let suggestion = match entity.kind {
            EntityKind::Exchange => "Assume exchange deposits and withdrawals are tied to your identity; keep them away from wallets meant to stay private",
            _ => "Interactions with well-known services are easy to trace; keep them away from wallets meant to stay private",
        };

        findings.push(
            context
                .finding(FindingType::KnownEntityInteraction, rule, ledger_location(graph, &txs), message, suggestion)
                .with_evidence([address.to_string()])
                .with_identifier(entity.label.clone()),
        );
    }

    Ok(findings)
}
