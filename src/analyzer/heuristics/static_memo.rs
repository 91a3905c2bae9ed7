//! Static memo PII leakage

use crate::analyzer::heuristics::memo::{classify, MemoLeak, PII_SUGGESTION, PLAINTEXT_SUGGESTION};
use crate::analyzer::heuristics::{source_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::code::{BindingOrigin, CallKind, CodePatternGraph};
use crate::models::finding::{Finding, FindingType};

/// String literals reaching a memo-instruction constructor, either inline
/// or through a binding initialised with a literal. One finding per call.
pub fn evaluate(graph: &CodePatternGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let mut findings = Vec::new();

    for call in graph.calls.iter().filter(|call| call.kind == CallKind::MemoInstruction) {
        let mut texts: Vec<&str> = Vec::new();
        for arg in &call.args {
            texts.extend(arg.literals.iter().map(String::as_str));
            for id in graph.argument_sources(arg) {
                if let BindingOrigin::Literal(value) = &graph.binding(id).origin {
                    texts.push(value);
                }
            }
        }

        let mut pii = Vec::new();
        let mut kinds = Vec::new();
        let mut plaintext = Vec::new();
        for text in texts {
            match classify(text) {
                Some(MemoLeak::Pii { matches, kinds: k }) => {
                    pii.extend(matches);
                    kinds.push(k);
                }
                Some(MemoLeak::Plaintext) => plaintext.push(text.to_string()),
                None => {}
            }
        }

        let location = source_location(graph, call.line);
        let finding = if !pii.is_empty() {
            kinds.sort();
            kinds.dedup();
            context
                .finding(
                    FindingType::MemoPii,
                    PolicyRule::StaticMemoPii,
                    location,
                    format!("Memo built by {} embeds personal data ({})", call.callee, kinds.join(", ")),
                    PII_SUGGESTION,
                )
                .with_evidence(pii)
        } else if !plaintext.is_empty() {
            context
                .finding(
                    FindingType::MemoPii,
                    PolicyRule::StaticMemoPlaintext,
                    location,
                    format!("Memo built by {} carries human-readable text", call.callee),
                    PLAINTEXT_SUGGESTION,
                )
                .with_evidence(plaintext)
        } else {
            continue;
        };

        findings.push(
            finding
                .with_identifier(call.callee.clone())
                .with_snippet(graph.snippet(call.line)),
        );
    }

    Ok(findings)
}
