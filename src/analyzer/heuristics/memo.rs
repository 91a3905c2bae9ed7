//! On-chain memo PII leakage

use crate::analyzer::heuristics::{ledger_location, HeuristicContext};
use crate::config::policy::PolicyRule;
use crate::errors::HeuristicError;
use crate::models::finding::{Finding, FindingType};
use crate::models::graph::TransactionGraph;
use crate::utils::pii;

pub(crate) const PII_SUGGESTION: &str =
    "Never put personal data in memos; reference an off-chain record by an opaque id instead";
pub(crate) const PLAINTEXT_SUGGESTION: &str =
    "Avoid descriptive memos; they can tie transactions to a purpose or a person";

/// What a memo text leaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MemoLeak {
    /// Matched PII strings and a description of their kinds
    Pii { matches: Vec<String>, kinds: String },
    /// Human-readable text without recognised PII
    Plaintext,
}

/// Classify memo text; `None` for opaque payloads
pub(crate) fn classify(text: &str) -> Option<MemoLeak> {
    let matches = pii::scan(text);
    if !matches.is_empty() {
        let mut kinds: Vec<String> = matches.iter().map(|m| m.kind.to_string()).collect();
        kinds.sort();
        kinds.dedup();
        return Some(MemoLeak::Pii {
            matches: matches.into_iter().map(|m| m.text).collect(),
            kinds: kinds.join(", "),
        });
    }
    if pii::is_free_text(text) {
        return Some(MemoLeak::Plaintext);
    }
    None
}

/// One finding per memo that carries PII or, failing that, free text
pub fn evaluate(graph: &TransactionGraph, context: &HeuristicContext<'_>) -> Result<Vec<Finding>, HeuristicError> {
    let mut findings = Vec::new();

    for (index, tx) in graph.transactions().iter().enumerate() {
        for memo in tx.memos() {
            let finding = match classify(memo) {
                Some(MemoLeak::Pii { matches, kinds }) => context
                    .finding(
                        FindingType::MemoPii,
                        PolicyRule::MemoPii,
                        ledger_location(graph, &[index]),
                        format!("Memo exposes personal data ({}) permanently on-chain", kinds),
                        PII_SUGGESTION,
                    )
                    .with_evidence(matches),
                Some(MemoLeak::Plaintext) => context
                    .finding(
                        FindingType::MemoPii,
                        PolicyRule::MemoPlaintext,
                        ledger_location(graph, &[index]),
                        "Memo contains human-readable text that is public and permanent",
                        PLAINTEXT_SUGGESTION,
                    )
                    .with_evidence([memo]),
                None => continue,
            };
            findings.push(finding.with_identifier(tx.signature.clone()));
        }
    }

    Ok(findings)
}
