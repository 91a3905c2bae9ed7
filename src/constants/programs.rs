//! Program ids and instruction tags the normalizer decodes

use solana_pubkey::{pubkey, Pubkey};

/// SPL Memo program, v1
pub const MEMO_V1_PROGRAM_ID: Pubkey = pubkey!("Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo");
/// SPL Memo program, v2
pub const MEMO_V2_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");
/// SPL Token program
pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
/// SPL Token-2022 program
pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

pub use solana_sdk_ids::compute_budget::ID as COMPUTE_BUDGET_PROGRAM_ID;
pub use solana_sdk_ids::system_program::ID as SYSTEM_PROGRAM_ID;

/// System program `Transfer` (u32 little-endian tag)
pub const SYSTEM_TRANSFER_TAG: u32 = 2;
/// Token `Transfer`
pub const TOKEN_TRANSFER_TAG: u8 = 3;
/// Token `TransferChecked`
pub const TOKEN_TRANSFER_CHECKED_TAG: u8 = 12;
/// Compute budget `SetComputeUnitLimit`
pub const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
/// Compute budget `SetComputeUnitPrice`
pub const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

/// Lamports below this granularity make an amount "non-round" (0.001 SOL).
pub const ROUND_AMOUNT_UNIT: u64 = 1_000_000;

/// Whether the program is one of the memo programs
pub fn is_memo_program(program_id: &Pubkey) -> bool {
    *program_id == MEMO_V1_PROGRAM_ID || *program_id == MEMO_V2_PROGRAM_ID
}

/// Whether the program is one of the token programs
pub fn is_token_program(program_id: &Pubkey) -> bool {
    *program_id == TOKEN_PROGRAM_ID || *program_id == TOKEN_2022_PROGRAM_ID
}
