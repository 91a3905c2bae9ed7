//! RPC client interactions for ledger snapshots

use std::str::FromStr;

use log::{debug, info, warn};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction_status::{UiLoadedAddresses, UiTransactionEncoding};

use crate::errors::{ErrorCategory, ErrorContext, ErrorExt, ScanResult};
use crate::models::raw::{DataEncoding, RawInstruction, RawTransactionRecord};

/// Largest page `getSignaturesForAddress` serves
const SIGNATURE_PAGE_LIMIT: usize = 1_000;

/// A compiled instruction: program index, account indexes, data
pub(crate) type CompiledParts<'a> = (u8, &'a [u8], &'a [u8]);

/// Most recent signatures for an address, newest first, following pagination
pub async fn get_signatures(rpc_client: &RpcClient, address: &Pubkey, limit: usize) -> ScanResult<Vec<String>> {
    let mut signatures: Vec<String> = Vec::new();
    let mut before = None;

    while signatures.len() < limit {
        let config = GetConfirmedSignaturesForAddress2Config {
            before,
            limit: Some((limit - signatures.len()).min(SIGNATURE_PAGE_LIMIT)),
            ..Default::default()
        };
        let page = rpc_client
            .get_signatures_for_address_with_config(address, config)
            .await
            .with_context(
                ErrorContext::new(ErrorCategory::Rpc, "monitor", "get_signatures_for_address")
                    .with_details(address.to_string()),
            )?;
        debug!("Fetched {} signatures for {}", page.len(), address);

        let last = match page.last() {
            Some(last) => last.signature.clone(),
            None => break,
        };
        let full_page = page.len() >= SIGNATURE_PAGE_LIMIT;
        let before_filter = signatures.len() + page.len();
        signatures.extend(page.into_iter().filter(|s| s.err.is_none()).map(|s| s.signature));
        if signatures.len() < before_filter {
            info!("Leaving out {} failed transactions of {}", before_filter - signatures.len(), address);
        }
        if !full_page {
            break;
        }
        before = Some(
            Signature::from_str(&last)
                .with_simple_context(ErrorCategory::Rpc, "monitor", "parse page cursor")?,
        );
    }

    signatures.truncate(limit);
    Ok(signatures)
}

/// Fetch one transaction and flatten it into a raw record.
///
/// `Ok(None)` when the node no longer has the transaction or it cannot be
/// decoded.
pub async fn get_transaction_record(rpc_client: &RpcClient, signature: &str) -> ScanResult<Option<RawTransactionRecord>> {
    let parsed = Signature::from_str(signature)
        .with_simple_context(ErrorCategory::Input, "monitor", "parse signature")?;
    let config = RpcTransactionConfig {
        encoding: Some(UiTransactionEncoding::Base64),
        commitment: None,
        max_supported_transaction_version: Some(0),
    };
    let confirmed = rpc_client
        .get_transaction_with_config(&parsed, config)
        .await
        .with_context(
            ErrorContext::new(ErrorCategory::Rpc, "monitor", "get_transaction").with_details(signature),
        )?;

    let transaction = match confirmed.transaction.transaction.decode() {
        Some(transaction) => transaction,
        None => {
            warn!("Could not decode transaction {}", signature);
            return Ok(None);
        }
    };

    let mut account_keys: Vec<Pubkey> = transaction.message.static_account_keys().to_vec();
    if let Some(meta) = confirmed.transaction.meta {
        if let Some(loaded) = Option::<UiLoadedAddresses>::from(meta.loaded_addresses) {
            for key in loaded.writable.iter().chain(loaded.readonly.iter()) {
                match Pubkey::from_str(key) {
                    Ok(key) => account_keys.push(key),
                    Err(e) => warn!("Invalid loaded address {} in {}: {}", key, signature, e),
                }
            }
        }
    }

    let num_signers = usize::from(transaction.message.header().num_required_signatures);
    let instructions: Vec<CompiledParts<'_>> = transaction
        .message
        .instructions()
        .iter()
        .map(|ix| (ix.program_id_index, ix.accounts.as_slice(), ix.data.as_slice()))
        .collect();

    Ok(Some(build_record(
        signature,
        confirmed.slot,
        confirmed.block_time,
        &account_keys,
        num_signers,
        &instructions,
    )))
}

/// Stand-in for a transaction that could not be fetched. It carries only the
/// signature, so the normalizer reports it as a skipped record.
pub(crate) fn unavailable_record(signature: &str) -> RawTransactionRecord {
    RawTransactionRecord {
        signature: Some(signature.to_string()),
        ..Default::default()
    }
}

/// Build a raw record from a compiled message. Indexes outside the key list
/// are dropped; the normalizer sees what the ledger actually resolved.
pub(crate) fn build_record(
    signature: &str,
    slot: u64,
    block_time: Option<i64>,
    account_keys: &[Pubkey],
    num_signers: usize,
    instructions: &[CompiledParts<'_>],
) -> RawTransactionRecord {
    let key = |index: u8| account_keys.get(usize::from(index)).map(|k| k.to_string());

    let signers: Vec<String> = account_keys.iter().take(num_signers).map(|k| k.to_string()).collect();
    let instructions = instructions
        .iter()
        .map(|(program_index, accounts, data)| RawInstruction {
            program_id: key(*program_index),
            accounts: accounts.iter().filter_map(|index| key(*index)).collect(),
            data: Some(bs58::encode(data).into_string()),
            encoding: DataEncoding::Base58,
            parsed: None,
        })
        .collect();

    RawTransactionRecord {
        signature: Some(signature.to_string()),
        slot: Some(slot),
        block_time,
        fee_payer: signers.first().cloned(),
        signers,
        instructions,
    }
}
