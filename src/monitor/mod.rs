//! Ledger snapshot collection over RPC.
//!
//! Pagination and per-transaction fetch failures are handled here; the
//! engine only ever sees the finished [`RawLedgerSnapshot`].

mod rpc;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use log::{info, warn};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_pubkey::Pubkey;
use tokio::task::JoinSet;

use crate::errors::{ScanError, ScanResult, ScanStage};
use crate::models::raw::{RawLedgerSnapshot, RawTransactionRecord};
use crate::utils::control::ScanControl;

/// Default RPC endpoint
pub const DEFAULT_CLUSTER: &str = "https://api.mainnet-beta.solana.com";

/// Transactions fetched concurrently per batch
const FETCH_BATCH: usize = 8;

/// Monitor for fetching a wallet's transaction history
pub struct Monitor {
    rpc_client: Arc<RpcClient>,
}

impl Monitor {
    /// Create a new monitor with the given RPC URL
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_client: Arc::new(RpcClient::new(rpc_url.to_string())),
        }
    }

    /// Fetch up to `limit` recent transactions of `address`.
    ///
    /// A transaction the node cannot return is kept as a signature-only
    /// record, so it is reported as skipped instead of vanishing. The control
    /// is checked between batches.
    pub async fn fetch_snapshot(
        &self,
        address: &Pubkey,
        limit: usize,
        control: &ScanControl,
    ) -> ScanResult<RawLedgerSnapshot> {
        let signatures = rpc::get_signatures(&self.rpc_client, address, limit).await?;
        info!("Fetching {} transactions for {}", signatures.len(), address);

        let mut records: Vec<Option<RawTransactionRecord>> = vec![None; signatures.len()];
        for (batch_index, batch) in signatures.chunks(FETCH_BATCH).enumerate() {
            if let Some(interrupt) = control.interrupted() {
                return Err(ScanError::interrupted(interrupt, ScanStage::Fetch, None));
            }

            let mut tasks = JoinSet::new();
            for (offset, signature) in batch.iter().enumerate() {
                let rpc_client = Arc::clone(&self.rpc_client);
                let signature = signature.clone();
                let index = batch_index * FETCH_BATCH + offset;
                tasks.spawn(async move {
                    let result = rpc::get_transaction_record(&rpc_client, &signature).await;
                    (index, signature, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, _, Ok(Some(record)))) => records[index] = Some(record),
                    Ok((_, signature, Ok(None))) => warn!("Transaction {} unavailable, leaving it out", signature),
                    Ok((_, signature, Err(e))) => warn!("Failed to fetch {}: {}", signature, e),
                    Err(e) => warn!("Fetch task failed: {}", e),
                }
            }
        }

        let fetched = records.iter().filter(|record| record.is_some()).count();
        info!("Fetched {} of {} transactions", fetched, signatures.len());

        Ok(RawLedgerSnapshot {
            target: Some(address.to_string()),
            transactions: records
                .into_iter()
                .zip(&signatures)
                .map(|(record, signature)| record.unwrap_or_else(|| rpc::unavailable_record(signature)))
                .collect(),
        })
    }
}
