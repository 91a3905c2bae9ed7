//! Ledger snapshot normalization

use std::collections::BTreeSet;
use std::str::FromStr;

use log::{debug, warn};
use solana_signature::Signature;

use crate::errors::{ScanError, ScanResult, ScanStage};
use crate::models::graph::TransactionGraph;
use crate::models::raw::{RawInstruction, RawLedgerSnapshot, RawTransactionRecord};
use crate::models::report::SkippedRecord;
use crate::models::transaction::{Address, Instruction, Transaction};
use crate::normalizer::decode::{decode_data, decode_instruction, from_parsed, parse_address};
use crate::utils::control::ScanControl;

/// Build a [`TransactionGraph`] from a snapshot.
///
/// Records that cannot be normalized are skipped and returned as warnings;
/// only an unparseable snapshot target fails the whole call.
pub fn normalize_snapshot(
    snapshot: &RawLedgerSnapshot,
    control: &ScanControl,
) -> ScanResult<(TransactionGraph, Vec<SkippedRecord>)> {
    let target = snapshot
        .target
        .as_deref()
        .map(|t| parse_address(t, "snapshot target"))
        .transpose()
        .map_err(ScanError::MalformedInput)?;

    let mut seen = BTreeSet::new();
    let mut transactions = Vec::with_capacity(snapshot.transactions.len());
    let mut warnings = Vec::new();

    for (index, record) in snapshot.transactions.iter().enumerate() {
        if let Some(interrupt) = control.interrupted() {
            return Err(ScanError::interrupted(interrupt, ScanStage::Normalize, None));
        }

        let result = normalize_record(record).and_then(|tx| {
            if seen.insert(tx.signature.clone()) {
                Ok(tx)
            } else {
                Err("duplicate signature".to_string())
            }
        });
        match result {
            Ok(tx) => transactions.push(tx),
            Err(reason) => {
                warn!("Skipping transaction record {}: {}", index, reason);
                warnings.push(SkippedRecord {
                    index,
                    identifier: record.signature.clone(),
                    reason,
                });
            }
        }
    }

    debug!(
        "Normalized {} of {} transaction records",
        transactions.len(),
        snapshot.transactions.len()
    );
    Ok((TransactionGraph::new(target, transactions), warnings))
}

/// Normalize one record. The error is the skip reason.
pub fn normalize_record(record: &RawTransactionRecord) -> Result<Transaction, String> {
    let signature = record.signature.as_deref().ok_or("missing signature")?;
    Signature::from_str(signature).map_err(|e| format!("invalid signature '{}': {}", signature, e))?;
    let slot = record.slot.ok_or("missing slot")?;

    let mut signers: Vec<Address> = Vec::with_capacity(record.signers.len());
    for signer in &record.signers {
        let signer = parse_address(signer, "signer")?;
        if !signers.contains(&signer) {
            signers.push(signer);
        }
    }

    let fee_payer = match record.fee_payer.as_deref() {
        Some(payer) => parse_address(payer, "fee payer")?,
        None => *signers.first().ok_or("missing fee payer and signers")?,
    };
    signers.retain(|s| *s != fee_payer);
    signers.insert(0, fee_payer);

    let instructions = record
        .instructions
        .iter()
        .enumerate()
        .map(|(i, ix)| normalize_instruction(ix).map_err(|e| format!("instruction {}: {}", i, e)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Transaction {
        signature: signature.to_string(),
        slot,
        block_time: record.block_time,
        fee_payer,
        signers,
        instructions,
    })
}

fn normalize_instruction(raw: &RawInstruction) -> Result<Instruction, String> {
    let program_id = parse_address(raw.program_id.as_deref().ok_or("missing program id")?, "program id")?;
    let accounts = raw
        .accounts
        .iter()
        .map(|a| parse_address(a, "account"))
        .collect::<Result<Vec<_>, _>>()?;
    let data = decode_data(raw.data.as_deref(), raw.encoding)?;
    let decoded = match &raw.parsed {
        Some(parsed) => Some(from_parsed(parsed)?),
        None => decode_instruction(&program_id, &accounts, &data),
    };

    Ok(Instruction {
        program_id,
        accounts,
        data,
        decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::raw::RawParsedInstruction;
    use crate::models::transaction::DecodedInstruction;
    use crate::utils::control::CancellationToken;

    fn key(n: u8) -> String {
        Address::new_from_array([n; 32]).to_string()
    }

    fn sig(n: u8) -> String {
        Signature::from([n; 64]).to_string()
    }

    fn record(n: u8, slot: u64, signers: &[u8]) -> RawTransactionRecord {
        RawTransactionRecord {
            signature: Some(sig(n)),
            slot: Some(slot),
            block_time: Some(1_700_000_000 + slot as i64),
            fee_payer: None,
            signers: signers.iter().map(|s| key(*s)).collect(),
            instructions: Vec::new(),
        }
    }

    #[test]
    fn test_fee_payer_defaults_to_first_signer() {
        let tx = normalize_record(&record(1, 10, &[4, 5, 4])).unwrap();
        assert_eq!(tx.fee_payer.to_string(), key(4));
        assert_eq!(tx.signers.len(), 2);
    }

    #[test]
    fn test_explicit_fee_payer_is_first_signer() {
        let mut raw = record(1, 10, &[4, 5]);
        raw.fee_payer = Some(key(5));
        let tx = normalize_record(&raw).unwrap();
        assert_eq!(tx.signers[0].to_string(), key(5));
        assert_eq!(tx.signers[1].to_string(), key(4));
    }

    #[test]
    fn test_malformed_records_become_warnings() {
        let mut bad_signature = record(2, 11, &[4]);
        bad_signature.signature = Some("not-a-signature".to_string());
        let mut no_slot = record(3, 12, &[4]);
        no_slot.slot = None;
        let snapshot = RawLedgerSnapshot {
            target: None,
            transactions: vec![record(1, 10, &[4]), bad_signature, no_slot, record(1, 10, &[4])],
        };

        let (graph, warnings) = normalize_snapshot(&snapshot, &ScanControl::default()).unwrap();
        assert_eq!(graph.transactions().len(), 1);
        let indexes: Vec<usize> = warnings.iter().map(|w| w.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(warnings[2].reason, "duplicate signature");
    }

    #[test]
    fn test_parsed_payload_takes_precedence() {
        let mut raw = record(1, 10, &[4]);
        raw.instructions.push(RawInstruction {
            program_id: Some(key(7)),
            accounts: vec![],
            data: None,
            encoding: Default::default(),
            parsed: Some(RawParsedInstruction::Memo { text: "hi".to_string() }),
        });
        let tx = normalize_record(&raw).unwrap();
        assert_eq!(tx.instructions[0].decoded, Some(DecodedInstruction::Memo("hi".to_string())));
    }

    #[test]
    fn test_bad_target_is_malformed_input() {
        let snapshot = RawLedgerSnapshot { target: Some("nope".to_string()), transactions: vec![] };
        assert!(matches!(
            normalize_snapshot(&snapshot, &ScanControl::default()),
            Err(ScanError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_cancelled_before_first_record() {
        let token = CancellationToken::new();
        token.cancel();
        let snapshot = RawLedgerSnapshot { target: None, transactions: vec![record(1, 10, &[4])] };
        let err = normalize_snapshot(&snapshot, &ScanControl::new(token)).unwrap_err();
        assert!(matches!(err, ScanError::Cancelled { stage: ScanStage::Normalize, partial: None }));
    }
}
