//! Static fee-payer reuse in transaction-building code

use std::collections::BTreeSet;

use crate::analyzer::heuristics::{source_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::code::{BindingId, BindingOrigin, CallKind, CallSite, CodePatternGraph};
use crate::models::finding::{Finding, FindingType};

/// A generated key declared outside a loop whose value reaches a send inside
/// that loop pays for every iteration's transaction. Without a loop, the
/// same key reaching two or more send sites is the weaker shared case.
/// At most one finding per key binding, at its declaration line.
pub fn evaluate(graph: &CodePatternGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let sends: Vec<(&CallSite, BTreeSet<BindingId>)> = graph
        .calls
        .iter()
        .filter(|call| call.kind == CallKind::SendTransaction)
        .map(|call| {
            let sources: BTreeSet<BindingId> = call.args.iter().flat_map(|arg| graph.argument_sources(arg)).collect();
            (call, sources)
        })
        .collect();
    if sends.is_empty() {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    for binding in &graph.bindings {
        let callee = match &binding.origin {
            BindingOrigin::KeyGeneration { callee } => callee,
            _ => continue,
        };
        let reached: Vec<&CallSite> = sends
            .iter()
            .filter(|(_, sources)| sources.contains(&binding.id))
            .map(|(call, _)| *call)
            .collect();
        if reached.is_empty() {
            continue;
        }

        let in_loop: Vec<&CallSite> = reached
            .iter()
            .copied()
            .filter(|call| call.loops.iter().any(|l| !binding.loops.contains(l)))
            .collect();

        let (rule, lines, message, suggestion) = if !in_loop.is_empty() {
            (
                PolicyRule::StaticFeePayerLoop,
                send_lines(&in_loop),
                format!(
                    "Key '{}' from {} is created once outside a loop and pays for every transaction sent inside it, linking all of them on-chain",
                    binding.name, callee
                ),
                "Generate a fresh fee payer per transaction inside the loop, or have each user pay their own fees",
            )
        } else if reached.len() >= 2 {
            (
                PolicyRule::StaticFeePayerShared,
                send_lines(&reached),
                format!(
                    "Key '{}' from {} signs {} separate sends, linking those transactions to one fee payer",
                    binding.name,
                    callee,
                    reached.len()
                ),
                "Use a distinct fee payer for transactions that should not be linked",
            )
        } else {
            continue;
        };

        findings.push(
            context
                .finding(FindingType::FeePayerReuse, rule, source_location(graph, binding.line), message, suggestion)
                .with_evidence(std::iter::once(binding.name.clone()).chain(lines))
                .with_identifier(binding.name.clone())
                .with_snippet(graph.snippet(binding.line)),
        );
    }

    Ok(findings)
}

fn send_lines(calls: &[&CallSite]) -> Vec<String> {
    calls.iter().map(|call| format!("send@{}", call.line)).collect()
}
