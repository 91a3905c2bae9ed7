use std::collections::BTreeSet;

use proptest::prelude::*;
use solana_privacy_scanner::models::raw::{RawInstruction, RawParsedInstruction, RawTransactionRecord};
use solana_privacy_scanner::{scan, RawLedgerSnapshot, Report, ScanConfig, ScanInput};
use solana_pubkey::Pubkey;
use solana_signature::Signature;

const MEMOS: &[&str] = &[
    "contact alice@example.com",
    "paid by John Smith",
    "rent for the flat",
    "a81f9c",
];
const AMOUNTS: &[u64] = &[1_000_000_000, 123_457, 5_000, 987_654_321];

fn key(n: u8) -> String {
    Pubkey::new_from_array([n + 1; 32]).to_string()
}

/// (signers, recipient, amount index, memo index, block time)
type RecordSeed = (Vec<u8>, u8, usize, Option<usize>, i64);

fn record(index: usize, (signers, recipient, amount, memo, time): &RecordSeed) -> RawTransactionRecord {
    let payer = key(signers[0]);
    let mut instructions = vec![RawInstruction {
        program_id: Some("11111111111111111111111111111111".to_string()),
        accounts: vec![payer.clone(), key(*recipient)],
        parsed: Some(RawParsedInstruction::Transfer {
            source: payer,
            destination: key(*recipient),
            amount: AMOUNTS[*amount],
            mint: None,
        }),
        ..Default::default()
    }];
    if let Some(memo) = memo {
        instructions.push(RawInstruction {
            program_id: Some("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr".to_string()),
            parsed: Some(RawParsedInstruction::Memo { text: MEMOS[*memo].to_string() }),
            ..Default::default()
        });
    }

    RawTransactionRecord {
        signature: Some(Signature::from([index as u8 + 1; 64]).to_string()),
        slot: Some(*time as u64),
        block_time: Some(*time),
        fee_payer: None,
        signers: signers.iter().map(|s| key(*s)).collect(),
        instructions,
    }
}

fn seeds() -> impl Strategy<Value = Vec<RecordSeed>> {
    prop::collection::vec(
        (
            prop::collection::vec(0u8..6, 1..4),
            0u8..8,
            0..AMOUNTS.len(),
            prop::option::of(0..MEMOS.len()),
            0i64..3_600,
        ),
        0..24,
    )
}

fn snapshot(records: Vec<RawTransactionRecord>) -> ScanInput {
    ScanInput::Ledger(RawLedgerSnapshot { target: None, transactions: records })
}

fn run(records: Vec<RawTransactionRecord>) -> Report {
    scan(&snapshot(records), ScanConfig::default()).unwrap()
}

proptest! {
    #[test]
    fn prop_scan_is_deterministic(seeds in seeds()) {
        let records: Vec<RawTransactionRecord> =
            seeds.iter().enumerate().map(|(i, seed)| record(i, seed)).collect();
        let mut reversed = records.clone();
        reversed.reverse();

        let first = run(records.clone());
        let second = run(records);
        let shuffled = run(reversed);

        prop_assert_eq!(first.issues(), second.issues());
        prop_assert_eq!(first.to_json().unwrap(), shuffled.to_json().unwrap());
    }

    #[test]
    fn prop_issues_ordered_and_unique(seeds in seeds()) {
        let records = seeds.iter().enumerate().map(|(i, seed)| record(i, seed)).collect();
        let report = run(records);

        for pair in report.issues().windows(2) {
            prop_assert!(pair[0].severity >= pair[1].severity);
        }

        let keys: BTreeSet<_> = report.issues().iter().map(|f| f.key()).collect();
        prop_assert_eq!(keys.len(), report.issues().len());

        let summary = report.summary();
        prop_assert_eq!(summary.total, report.issues().len());
        prop_assert_eq!(summary.critical + summary.high + summary.medium + summary.low, summary.total);
    }

    #[test]
    fn prop_repeated_records_change_nothing(seeds in seeds()) {
        let records: Vec<RawTransactionRecord> =
            seeds.iter().enumerate().map(|(i, seed)| record(i, seed)).collect();
        let mut doubled = records.clone();
        doubled.extend(records.iter().cloned());

        let once = run(records);
        let twice = run(doubled);
        prop_assert_eq!(once.issues(), twice.issues());
        prop_assert_eq!(twice.warnings().len(), seeds.len());
    }
}
