//! Normalized on-chain transaction model

use serde::{Serialize, Deserialize};
use solana_pubkey::Pubkey;

/// A ledger account identifier
pub type Address = Pubkey;

/// Instruction payload the normalizer understood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedInstruction {
    /// Memo program text
    Memo(String),
    /// Native SOL or SPL token transfer
    Transfer {
        source: Address,
        destination: Address,
        amount: u64,
        /// Mint for `TransferChecked`, `None` for SOL and plain token transfers
        mint: Option<Address>,
    },
    /// Compute-budget unit price in micro-lamports
    ComputeUnitPrice(u64),
    /// Compute-budget unit limit
    ComputeUnitLimit(u32),
}

/// A single instruction inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Invoked program
    pub program_id: Address,
    /// Ordered account references
    pub accounts: Vec<Address>,
    /// Opaque instruction data
    pub data: Vec<u8>,
    /// Decoded payload, when the program is one the normalizer knows
    pub decoded: Option<DecodedInstruction>,
}

/// A transfer view over a decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub source: Address,
    pub destination: Address,
    pub amount: u64,
}

/// A normalized transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique signature (base58)
    pub signature: String,
    /// Slot the transaction landed in
    pub slot: u64,
    /// Unix block time, when the ledger reported one
    pub block_time: Option<i64>,
    /// Account paying the fee
    pub fee_payer: Address,
    /// Signers, fee payer first, unique
    pub signers: Vec<Address>,
    /// Ordered instructions
    pub instructions: Vec<Instruction>,
}

impl Transaction {
    /// Transfers in instruction order
    pub fn transfers(&self) -> impl Iterator<Item = Transfer> + '_ {
        self.instructions.iter().filter_map(|ix| match &ix.decoded {
            Some(DecodedInstruction::Transfer { source, destination, amount, .. }) => Some(Transfer {
                source: *source,
                destination: *destination,
                amount: *amount,
            }),
            _ => None,
        })
    }

    /// Memo texts in instruction order
    pub fn memos(&self) -> impl Iterator<Item = &str> + '_ {
        self.instructions.iter().filter_map(|ix| match &ix.decoded {
            Some(DecodedInstruction::Memo(text)) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Compute-unit price set by the transaction, if any (last one wins)
    pub fn compute_unit_price(&self) -> Option<u64> {
        self.instructions.iter().rev().find_map(|ix| match &ix.decoded {
            Some(DecodedInstruction::ComputeUnitPrice(price)) => Some(*price),
            _ => None,
        })
    }

    /// Recipient set: transfer destinations, or non-signer instruction
    /// accounts when the transaction carries no decoded transfer.
    pub fn recipients(&self) -> Vec<Address> {
        let mut recipients: Vec<Address> = self.transfers().map(|t| t.destination).collect();
        if recipients.is_empty() {
            recipients = self
                .instructions
                .iter()
                .flat_map(|ix| ix.accounts.iter().copied())
                .filter(|account| !self.signers.contains(account))
                .collect();
        }
        recipients.sort();
        recipients.dedup();
        recipients
    }

    /// Every address the transaction references: fee payer, signers,
    /// programs and instruction accounts.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses = vec![self.fee_payer];
        addresses.extend(self.signers.iter().copied());
        for ix in &self.instructions {
            addresses.push(ix.program_id);
            addresses.extend(ix.accounts.iter().copied());
            if let Some(DecodedInstruction::Transfer { source, destination, mint, .. }) = &ix.decoded {
                addresses.push(*source);
                addresses.push(*destination);
                addresses.extend(mint.iter().copied());
            }
        }
        addresses.sort();
        addresses.dedup();
        addresses
    }
}
