#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::policy::PolicyRule;
    use crate::models::report::{Completeness, HeuristicFailure};
    use crate::models::transaction::Instruction;
    use solana_pubkey::Pubkey;

    fn key(n: u8) -> Address {
        Pubkey::new_from_array([n; 32])
    }

    fn transfer(from: u8, to: u8, amount: u64) -> Instruction {
        Instruction {
            program_id: crate::constants::programs::SYSTEM_PROGRAM_ID,
            accounts: vec![key(from), key(to)],
            data: Vec::new(),
            decoded: Some(DecodedInstruction::Transfer {
                source: key(from),
                destination: key(to),
                amount,
                mint: None,
            }),
        }
    }

    fn tx(signature: &str, slot: u64, signers: &[u8], instructions: Vec<Instruction>) -> Transaction {
        Transaction {
            signature: signature.to_string(),
            slot,
            block_time: None,
            fee_payer: key(signers[0]),
            signers: signers.iter().map(|n| key(*n)).collect(),
            instructions,
        }
    }

    fn finding(severity: Severity, finding_type: FindingType, location: Location) -> Finding {
        Finding::new(finding_type, PolicyRule::AmountReuse, severity, location, "message", "suggestion")
    }

    #[test]
    fn test_severity_order_and_serde() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::Critical.rank(), 3);

        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        let parsed: Severity = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Severity::Medium);
    }

    #[test]
    fn test_location_signatures_are_canonical() {
        let a = Location::transactions(["b", "a", "b"]);
        let b = Location::transactions(["a", "b"]);
        assert_eq!(a, b);
        assert_eq!(a.signatures(), &["a".to_string(), "b".to_string()]);
        assert_eq!(a.file(), None);

        let source = Location::source("bot.ts", 12);
        assert_eq!(source.file(), Some("bot.ts"));
        assert_eq!(source.line(), Some(12));
        assert!(source.signatures().is_empty());
    }

    #[test]
    fn test_finding_key_ignores_evidence_order() {
        let location = Location::transactions(["s1"]);
        let a = finding(Severity::Low, FindingType::AmountReuse, location.clone()).with_evidence(["y", "x"]);
        let b = finding(Severity::Low, FindingType::AmountReuse, location).with_evidence(["x", "y", "x"]);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.evidence, vec!["x", "y"]);
    }

    #[test]
    fn test_report_order() {
        let low = finding(Severity::Low, FindingType::AddressReuse, Location::transactions(["a"]));
        let high = finding(Severity::High, FindingType::MemoPii, Location::transactions(["z"]));
        let high_earlier_type = finding(Severity::High, FindingType::FeePayerReuse, Location::transactions(["z"]));

        let mut findings = vec![low.clone(), high.clone(), high_earlier_type.clone()];
        findings.sort_by(Finding::report_order);
        assert_eq!(findings, vec![high_earlier_type, high, low]);
    }

    #[test]
    fn test_report_json_contract() {
        let issue = finding(Severity::Critical, FindingType::FeePayerReuse, Location::source("bot.ts", 3))
            .with_identifier("payer")
            .with_snippet(Some("const payer = Keypair.generate();".to_string()));
        let report = Report::new(vec![issue], Vec::new(), Vec::new(), Completeness::Complete);

        let value = report.to_json_value().unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["issues", "summary"]);

        let issue = &value["issues"][0];
        let keys: Vec<&String> = issue.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            vec!["type", "severity", "file", "line", "message", "suggestion", "codeSnippet", "identifier"]
        );
        assert_eq!(issue["type"], "fee-payer-reuse");
        assert_eq!(issue["severity"], "CRITICAL");
        assert_eq!(issue["line"], 3);

        assert_eq!(value["summary"]["critical"], 1);
        assert_eq!(value["summary"]["total"], 1);
    }

    #[test]
    fn test_ledger_issue_has_null_file_and_line() {
        let issue = finding(Severity::Medium, FindingType::AddressReuse, Location::transactions(["s1"]));
        let report = Report::new(vec![issue], Vec::new(), Vec::new(), Completeness::Complete);
        let value = report.to_json_value().unwrap();
        assert!(value["issues"][0]["file"].is_null());
        assert!(value["issues"][0]["line"].is_null());
        assert!(value["issues"][0]["codeSnippet"].is_null());
    }

    #[test]
    fn test_empty_report() {
        let report = Report::new(
            Vec::new(),
            Vec::new(),
            vec![HeuristicFailure { heuristic: "x".to_string(), cause: "boom".to_string() }],
            Completeness::Complete,
        );
        assert_eq!(*report.summary(), Summary::default());
        // failures are metadata, not part of the JSON contract
        let value = report.to_json_value().unwrap();
        assert_eq!(value, serde_json::json!({
            "issues": [],
            "summary": { "critical": 0, "high": 0, "medium": 0, "low": 0, "total": 0 }
        }));
    }

    #[test]
    fn test_transaction_recipients() {
        let transaction = tx("s1", 1, &[1], vec![transfer(1, 2, 10), transfer(1, 3, 5)]);
        assert_eq!(transaction.recipients(), vec![key(2), key(3)]);
        assert_eq!(transaction.transfers().count(), 2);
        assert!(transaction.memos().next().is_none());
    }

    #[test]
    fn test_graph_adjacency() {
        let graph = TransactionGraph::new(
            None,
            vec![
                tx("s2", 2, &[1, 2, 3], vec![transfer(1, 4, 10)]),
                tx("s1", 1, &[1], vec![transfer(1, 2, 10)]),
            ],
        );

        // ordered by slot
        assert_eq!(graph.transaction(0).signature, "s1");

        let payer = graph.address_id(&key(1)).unwrap();
        assert_eq!(graph.fee_payments(payer), &[0, 1]);
        assert_eq!(graph.signings(payer), &[0, 1]);

        let recipient = graph.address_id(&key(4)).unwrap();
        assert_eq!(graph.appearances(recipient), &[1]);
        assert!(graph.fee_payments(recipient).is_empty());

        // 3 signers give 3 edges, all from the second transaction
        assert_eq!(graph.co_sign_edges().len(), 3);
        assert!(graph.co_sign_edges().iter().all(|edge| edge.tx == 1 && edge.a < edge.b));
    }

    #[test]
    fn test_graph_is_order_independent() {
        let a = tx("s1", 1, &[1], vec![transfer(1, 2, 10)]);
        let b = tx("s2", 1, &[2], vec![transfer(2, 3, 10)]);
        let first = TransactionGraph::new(None, vec![a.clone(), b.clone()]);
        let second = TransactionGraph::new(None, vec![b, a]);
        assert_eq!(first, second);
    }
}
