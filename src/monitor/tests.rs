#[cfg(test)]
mod tests {
    use super::super::rpc::{build_record, unavailable_record};
    use crate::models::raw::RawLedgerSnapshot;
    use crate::normalizer::ledger::normalize_snapshot;
    use crate::utils::control::ScanControl;
    use crate::constants::programs::SYSTEM_PROGRAM_ID;
    use crate::models::transaction::DecodedInstruction;
    use crate::normalizer::ledger::normalize_record;
    use solana_pubkey::Pubkey;
    use solana_signature::Signature;

    #[test]
    fn test_build_record_resolves_indexes() {
        let payer = Pubkey::new_from_array([1; 32]);
        let recipient = Pubkey::new_from_array([2; 32]);
        let keys = vec![payer, recipient, SYSTEM_PROGRAM_ID];
        let signature = Signature::from([7; 64]).to_string();

        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&1_500u64.to_le_bytes());
        let accounts = [0u8, 1, 9];

        let record = build_record(&signature, 42, Some(1_700_000_000), &keys, 1, &[(2, &accounts[..], data.as_slice())]);
        assert_eq!(record.fee_payer, Some(payer.to_string()));
        assert_eq!(record.signers, vec![payer.to_string()]);
        // index 9 is outside the key list
        assert_eq!(record.instructions[0].accounts.len(), 2);

        let tx = normalize_record(&record).unwrap();
        assert_eq!(
            tx.instructions[0].decoded,
            Some(DecodedInstruction::Transfer {
                source: payer,
                destination: recipient,
                amount: 1_500,
                mint: None,
            })
        );
    }

    #[test]
    fn test_build_record_without_signers() {
        let record = build_record("sig", 1, None, &[], 0, &[]);
        assert!(record.fee_payer.is_none());
        assert!(normalize_record(&record).is_err());
    }

    #[test]
    fn test_unavailable_transaction_is_reported_as_skipped() {
        let signature = Signature::from([3; 64]).to_string();
        let snapshot = RawLedgerSnapshot {
            target: None,
            transactions: vec![unavailable_record(&signature)],
        };

        let (graph, warnings) = normalize_snapshot(&snapshot, &ScanControl::default()).unwrap();
        assert!(graph.transactions().is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].identifier.as_deref(), Some(signature.as_str()));
        assert_eq!(warnings[0].reason, "missing slot");
    }
}
