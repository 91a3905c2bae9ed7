//! Raw inputs as the collaborators supply them.
//!
//! Field presence is not trusted: every field is optional at this level and
//! the normalizer decides what a record must carry.

use serde::{Serialize, Deserialize};

use crate::models::code::AstNode;

/// Encoding of raw instruction data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataEncoding {
    #[default]
    Base58,
    Base64,
}

/// Instruction payload already decoded by the RPC collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawParsedInstruction {
    Memo { text: String },
    #[serde(rename_all = "camelCase")]
    Transfer {
        source: String,
        destination: String,
        amount: u64,
        #[serde(default)]
        mint: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ComputeUnitPrice { micro_lamports: u64 },
    #[serde(rename_all = "camelCase")]
    ComputeUnitLimit { units: u32 },
}

/// One instruction of a raw record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub encoding: DataEncoding,
    #[serde(default)]
    pub parsed: Option<RawParsedInstruction>,
}

/// One transaction as fetched from the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionRecord {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub fee_payer: Option<String>,
    #[serde(default)]
    pub signers: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<RawInstruction>,
}

/// A data snapshot of ledger activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLedgerSnapshot {
    /// Wallet the snapshot was taken for
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub transactions: Vec<RawTransactionRecord>,
}

/// A parsed source unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceUnit {
    pub file: String,
    /// Original text, used for code snippets only
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub ast: Vec<AstNode>,
}

/// Input to a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "camelCase")]
pub enum ScanInput {
    Ledger(RawLedgerSnapshot),
    Source(RawSourceUnit),
}

impl From<RawLedgerSnapshot> for ScanInput {
    fn from(snapshot: RawLedgerSnapshot) -> Self {
        Self::Ledger(snapshot)
    }
}

impl From<RawSourceUnit> for ScanInput {
    fn from(unit: RawSourceUnit) -> Self {
        Self::Source(unit)
    }
}
