//! A library for finding privacy exposure in Solana activity
//!
//! This crate runs a registry of heuristics over either a wallet's ledger
//! history or the structure of transaction-building source code, and merges
//! what they find into a deduplicated, severity-ranked report.

pub mod analyzer;
pub mod config;
pub mod constants;
pub mod errors;
pub mod generator;
pub mod models;
pub mod monitor;
pub mod normalizer;
pub mod utils;

use std::fs;
use std::path::Path;

use log::info;
use serde::de::DeserializeOwned;
use solana_pubkey::Pubkey;

pub use crate::analyzer::{Analyzer, Heuristic, HeuristicContext, HeuristicId};
pub use crate::config::{EngineConfig, ScanConfig};
pub use crate::errors::{ScanError, ScanResult};
pub use crate::models::finding::{Finding, FindingType, Severity};
pub use crate::models::raw::{RawLedgerSnapshot, RawSourceUnit, ScanInput};
pub use crate::models::report::{Completeness, Report, Summary};
pub use crate::utils::control::{CancellationToken, ScanControl};

use crate::errors::{ErrorCategory, ErrorContext, ErrorExt};

/// Scan one input with the given configuration
pub fn scan(input: &ScanInput, config: ScanConfig) -> ScanResult<Report> {
    Analyzer::new(config)?.scan(input)
}

/// Fetch up to `limit` recent transactions of `address` and scan them
pub async fn scan_wallet(
    address: &Pubkey,
    rpc_url: &str,
    limit: usize,
    config: ScanConfig,
    control: &ScanControl,
) -> ScanResult<Report> {
    // Validate before spending RPC calls
    let analyzer = Analyzer::new(config)?;

    let monitor = monitor::Monitor::new(rpc_url);
    let snapshot = monitor.fetch_snapshot(address, limit, control).await?;
    info!("Fetched {} transactions for {}", snapshot.transactions.len(), address);

    analyzer.scan_with_control(&ScanInput::Ledger(snapshot), control)
}

/// Read a ledger snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> ScanResult<RawLedgerSnapshot> {
    read_json(path, "load snapshot")
}

/// Read a parsed source unit from a JSON file
pub fn load_source_unit(path: &Path) -> ScanResult<RawSourceUnit> {
    read_json(path, "load source unit")
}

fn read_json<T: DeserializeOwned>(path: &Path, operation: &str) -> ScanResult<T> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).with_context(
        ErrorContext::new(ErrorCategory::Input, "input", operation).with_details(path.display().to_string()),
    )
}

/// Version of the privacy scanner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
