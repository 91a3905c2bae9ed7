//! Instruction data decoding for the programs the heuristics care about

use std::str::FromStr;

use crate::constants::programs::{
    is_memo_program, is_token_program, COMPUTE_BUDGET_PROGRAM_ID, SET_COMPUTE_UNIT_LIMIT_TAG,
    SET_COMPUTE_UNIT_PRICE_TAG, SYSTEM_PROGRAM_ID, SYSTEM_TRANSFER_TAG, TOKEN_TRANSFER_CHECKED_TAG,
    TOKEN_TRANSFER_TAG,
};
use crate::models::raw::{DataEncoding, RawParsedInstruction};
use crate::models::transaction::{Address, DecodedInstruction};

/// Decode raw instruction data. Missing data is an empty payload.
pub fn decode_data(data: Option<&str>, encoding: DataEncoding) -> Result<Vec<u8>, String> {
    let data = match data {
        Some(data) => data,
        None => return Ok(Vec::new()),
    };
    match encoding {
        DataEncoding::Base58 => bs58::decode(data)
            .into_vec()
            .map_err(|e| format!("invalid base58 instruction data: {}", e)),
        DataEncoding::Base64 => {
            base64::decode(data).map_err(|e| format!("invalid base64 instruction data: {}", e))
        }
    }
}

/// Parse a base58 address
pub fn parse_address(value: &str, field: &str) -> Result<Address, String> {
    Address::from_str(value).map_err(|e| format!("invalid {} '{}': {}", field, value, e))
}

/// Decode a payload the collaborator already parsed
pub fn from_parsed(parsed: &RawParsedInstruction) -> Result<DecodedInstruction, String> {
    Ok(match parsed {
        RawParsedInstruction::Memo { text } => DecodedInstruction::Memo(text.clone()),
        RawParsedInstruction::Transfer { source, destination, amount, mint } => DecodedInstruction::Transfer {
            source: parse_address(source, "transfer source")?,
            destination: parse_address(destination, "transfer destination")?,
            amount: *amount,
            mint: mint.as_deref().map(|m| parse_address(m, "transfer mint")).transpose()?,
        },
        RawParsedInstruction::ComputeUnitPrice { micro_lamports } => {
            DecodedInstruction::ComputeUnitPrice(*micro_lamports)
        }
        RawParsedInstruction::ComputeUnitLimit { units } => DecodedInstruction::ComputeUnitLimit(*units),
    })
}

/// Decode instruction data for a known program. Unknown programs and
/// payloads that do not match a known layout yield `None`.
pub fn decode_instruction(program_id: &Address, accounts: &[Address], data: &[u8]) -> Option<DecodedInstruction> {
    if is_memo_program(program_id) {
        return String::from_utf8(data.to_vec()).ok().map(DecodedInstruction::Memo);
    }
    if *program_id == SYSTEM_PROGRAM_ID {
        return decode_system_transfer(accounts, data);
    }
    if is_token_program(program_id) {
        return decode_token_transfer(accounts, data);
    }
    if *program_id == COMPUTE_BUDGET_PROGRAM_ID {
        return decode_compute_budget(data);
    }
    None
}

fn decode_system_transfer(accounts: &[Address], data: &[u8]) -> Option<DecodedInstruction> {
    if read_u32(data, 0)? != SYSTEM_TRANSFER_TAG || accounts.len() < 2 {
        return None;
    }
    Some(DecodedInstruction::Transfer {
        source: accounts[0],
        destination: accounts[1],
        amount: read_u64(data, 4)?,
        mint: None,
    })
}

fn decode_token_transfer(accounts: &[Address], data: &[u8]) -> Option<DecodedInstruction> {
    match *data.first()? {
        // source, destination, authority
        TOKEN_TRANSFER_TAG if accounts.len() >= 3 => Some(DecodedInstruction::Transfer {
            source: accounts[0],
            destination: accounts[1],
            amount: read_u64(data, 1)?,
            mint: None,
        }),
        // source, mint, destination, authority
        TOKEN_TRANSFER_CHECKED_TAG if accounts.len() >= 4 => Some(DecodedInstruction::Transfer {
            source: accounts[0],
            destination: accounts[2],
            amount: read_u64(data, 1)?,
            mint: Some(accounts[1]),
        }),
        _ => None,
    }
}

fn decode_compute_budget(data: &[u8]) -> Option<DecodedInstruction> {
    match *data.first()? {
        SET_COMPUTE_UNIT_PRICE_TAG => read_u64(data, 1).map(DecodedInstruction::ComputeUnitPrice),
        SET_COMPUTE_UNIT_LIMIT_TAG => read_u32(data, 1).map(DecodedInstruction::ComputeUnitLimit),
        _ => None,
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::programs::{MEMO_V2_PROGRAM_ID, TOKEN_PROGRAM_ID};

    fn key(n: u8) -> Address {
        Address::new_from_array([n; 32])
    }

    #[test]
    fn test_memo_is_utf8() {
        let decoded = decode_instruction(&MEMO_V2_PROGRAM_ID, &[], b"hello");
        assert_eq!(decoded, Some(DecodedInstruction::Memo("hello".to_string())));
        assert_eq!(decode_instruction(&MEMO_V2_PROGRAM_ID, &[], &[0xff, 0xfe]), None);
    }

    #[test]
    fn test_system_transfer() {
        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&5_000u64.to_le_bytes());
        let decoded = decode_instruction(&SYSTEM_PROGRAM_ID, &[key(1), key(2)], &data);
        assert_eq!(
            decoded,
            Some(DecodedInstruction::Transfer { source: key(1), destination: key(2), amount: 5_000, mint: None })
        );

        // CreateAccount is tag 0
        let mut data = 0u32.to_le_bytes().to_vec();
        data.extend_from_slice(&5_000u64.to_le_bytes());
        assert_eq!(decode_instruction(&SYSTEM_PROGRAM_ID, &[key(1), key(2)], &data), None);
    }

    #[test]
    fn test_token_transfer_checked() {
        let mut data = vec![TOKEN_TRANSFER_CHECKED_TAG];
        data.extend_from_slice(&42u64.to_le_bytes());
        data.push(6);
        let accounts = [key(1), key(9), key(2), key(3)];
        assert_eq!(
            decode_instruction(&TOKEN_PROGRAM_ID, &accounts, &data),
            Some(DecodedInstruction::Transfer {
                source: key(1),
                destination: key(2),
                amount: 42,
                mint: Some(key(9)),
            })
        );
    }

    #[test]
    fn test_compute_budget() {
        let mut data = vec![SET_COMPUTE_UNIT_PRICE_TAG];
        data.extend_from_slice(&1_234u64.to_le_bytes());
        assert_eq!(
            decode_instruction(&COMPUTE_BUDGET_PROGRAM_ID, &[], &data),
            Some(DecodedInstruction::ComputeUnitPrice(1_234))
        );
        assert_eq!(decode_instruction(&COMPUTE_BUDGET_PROGRAM_ID, &[], &[SET_COMPUTE_UNIT_PRICE_TAG, 1]), None);
    }

    #[test]
    fn test_decode_data_encodings() {
        assert_eq!(decode_data(Some("3yZe7d"), DataEncoding::Base58).unwrap(), b"test".to_vec());
        assert_eq!(decode_data(Some("dGVzdA=="), DataEncoding::Base64).unwrap(), b"test".to_vec());
        assert!(decode_data(Some("0OIl"), DataEncoding::Base58).is_err());
        assert!(decode_data(None, DataEncoding::Base58).unwrap().is_empty());
    }
}
