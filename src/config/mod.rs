//! Scan configuration.
//!
//! [`ScanConfig`] is the user-facing, serde-loadable form. [`EngineConfig`]
//! is the validated, immutable form built once per engine and shared by
//! reference with every component.

pub mod policy;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use log::debug;
use serde::{Serialize, Deserialize};
use solana_pubkey::Pubkey;

use crate::analyzer::heuristics::HeuristicId;
use crate::constants::entities::{EntityKind, DEFAULT_ENTITIES};
use crate::errors::{ErrorCategory, ErrorContext, ErrorExt, ScanError, ScanResult};
use crate::models::finding::Severity;
use crate::models::transaction::Address;

pub use self::policy::{PolicyRule, SeverityPolicy};

/// A known-entity catalog entry as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEntityConfig {
    pub address: String,
    pub label: String,
    pub kind: EntityKind,
}

/// User-facing scan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Severity overrides keyed by policy rule id
    pub severity_overrides: BTreeMap<String, Severity>,
    /// When set, only these heuristics run
    pub enabled_heuristics: Option<BTreeSet<String>>,
    /// Heuristics that never run
    pub disabled_heuristics: BTreeSet<String>,
    /// Smallest co-signer component reported by clustering
    pub cluster_size_threshold: usize,
    /// Components at least this large use the `cluster-large` rule
    pub critical_cluster_size: usize,
    /// Timing-correlation window
    pub timing_window_secs: u64,
    /// Co-occurrences inside the window before a pair is reported
    pub timing_min_occurrences: usize,
    /// Correlated addresses at least this many use the `timing-group` rule
    pub timing_group_size: usize,
    /// Window in which one fee payer's sponsored transactions are linked
    pub fee_payer_window_secs: u64,
    /// Sponsored wallets at which a fee payer uses the `fee-payer-links-wallets` rule
    pub fee_payer_linked_wallets: usize,
    /// Window in which a fresh recipient spending again looks like change
    pub change_window_secs: u64,
    /// Distinct senders before an address counts as reused
    pub reuse_min_counterparties: usize,
    /// Distinct senders at which reuse uses the `address-reuse-heavy` rule
    pub heavy_reuse_counterparties: usize,
    /// Transfers sharing one non-round amount before it is reported
    pub amount_min_occurrences: usize,
    /// Transactions sharing one compute-unit price before it is reported
    pub priority_fee_min_occurrences: usize,
    /// Extra catalog entries, merged with the built-in ones
    pub known_entities: Vec<KnownEntityConfig>,
    /// Skip the built-in catalog
    pub disable_default_entities: bool,
    /// Whole-scan deadline
    pub timeout_secs: Option<u64>,
    /// Evaluate heuristics on the rayon pool
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            severity_overrides: BTreeMap::new(),
            enabled_heuristics: None,
            disabled_heuristics: BTreeSet::new(),
            cluster_size_threshold: 2,
            critical_cluster_size: 5,
            timing_window_secs: 60,
            timing_min_occurrences: 3,
            timing_group_size: 3,
            fee_payer_window_secs: 86_400,
            fee_payer_linked_wallets: 2,
            change_window_secs: 86_400,
            reuse_min_counterparties: 3,
            heavy_reuse_counterparties: 6,
            amount_min_occurrences: 2,
            priority_fee_min_occurrences: 3,
            known_entities: Vec::new(),
            disable_default_entities: false,
            timeout_secs: None,
            parallel: true,
        }
    }
}

impl ScanConfig {
    /// Default location: `<config_dir>/solana-privacy-scanner/config.json`
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("solana-privacy-scanner").join("config.json")
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> ScanResult<Self> {
        let context = ErrorContext::new(ErrorCategory::Config, "config", "load")
            .with_details(path.display().to_string());
        let json = fs::read_to_string(path).with_context(context.clone())?;
        let config: Self = serde_json::from_str(&json).with_context(context)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file at [`ScanConfig::default_path`] if it exists
    pub fn load_default() -> ScanResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// A validated known-entity entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownEntity {
    pub address: Address,
    pub label: String,
    pub kind: EntityKind,
}

/// Validated, immutable engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub policy: SeverityPolicy,
    /// Heuristics to run, in catalog order
    pub heuristics: Vec<HeuristicId>,
    pub cluster_size_threshold: usize,
    pub critical_cluster_size: usize,
    pub timing_window_secs: i64,
    pub timing_min_occurrences: usize,
    pub timing_group_size: usize,
    pub fee_payer_window_secs: i64,
    pub fee_payer_linked_wallets: usize,
    pub change_window_secs: i64,
    pub reuse_min_counterparties: usize,
    pub heavy_reuse_counterparties: usize,
    pub amount_min_occurrences: usize,
    pub priority_fee_min_occurrences: usize,
    /// Catalog keyed by address
    pub known_entities: BTreeMap<Address, KnownEntity>,
    pub timeout: Option<Duration>,
    pub parallel: bool,
}

impl EngineConfig {
    /// Validate a [`ScanConfig`]. Every error here is a `ConfigurationError`.
    pub fn new(config: ScanConfig) -> ScanResult<Self> {
        let policy = SeverityPolicy::with_overrides(&config.severity_overrides)?;
        let heuristics = resolve_heuristics(&config)?;

        if config.cluster_size_threshold < 2 {
            return Err(ScanError::Configuration(format!(
                "clusterSizeThreshold must be at least 2, got {}",
                config.cluster_size_threshold
            )));
        }
        if config.critical_cluster_size < config.cluster_size_threshold {
            return Err(ScanError::Configuration(format!(
                "criticalClusterSize ({}) must not be below clusterSizeThreshold ({})",
                config.critical_cluster_size, config.cluster_size_threshold
            )));
        }
        for (name, value) in [
            ("timingMinOccurrences", config.timing_min_occurrences),
            ("reuseMinCounterparties", config.reuse_min_counterparties),
            ("amountMinOccurrences", config.amount_min_occurrences),
            ("priorityFeeMinOccurrences", config.priority_fee_min_occurrences),
            ("feePayerLinkedWallets", config.fee_payer_linked_wallets),
        ] {
            if value < 2 {
                return Err(ScanError::Configuration(format!("{} must be at least 2, got {}", name, value)));
            }
        }
        // a pair is always reported as a pair
        if config.timing_group_size < 3 {
            return Err(ScanError::Configuration(format!(
                "timingGroupSize must be at least 3, got {}",
                config.timing_group_size
            )));
        }
        if config.heavy_reuse_counterparties < config.reuse_min_counterparties {
            return Err(ScanError::Configuration(format!(
                "heavyReuseCounterparties ({}) must not be below reuseMinCounterparties ({})",
                config.heavy_reuse_counterparties, config.reuse_min_counterparties
            )));
        }
        let timeout = config.timeout_secs.map(checked_timeout).transpose()?;

        let timing_window_secs = window("timingWindowSecs", config.timing_window_secs)?;
        let fee_payer_window_secs = window("feePayerWindowSecs", config.fee_payer_window_secs)?;
        let change_window_secs = window("changeWindowSecs", config.change_window_secs)?;

        let mut known_entities = BTreeMap::new();
        if !config.disable_default_entities {
            for (address, label, kind) in DEFAULT_ENTITIES {
                let entity = parse_entity(address, label, *kind)?;
                known_entities.insert(entity.address, entity);
            }
        }
        for entry in &config.known_entities {
            let entity = parse_entity(&entry.address, &entry.label, entry.kind)?;
            known_entities.insert(entity.address, entity);
        }

        Ok(Self {
            policy,
            heuristics,
            cluster_size_threshold: config.cluster_size_threshold,
            critical_cluster_size: config.critical_cluster_size,
            timing_window_secs,
            timing_min_occurrences: config.timing_min_occurrences,
            timing_group_size: config.timing_group_size,
            fee_payer_window_secs,
            fee_payer_linked_wallets: config.fee_payer_linked_wallets,
            change_window_secs,
            reuse_min_counterparties: config.reuse_min_counterparties,
            heavy_reuse_counterparties: config.heavy_reuse_counterparties,
            amount_min_occurrences: config.amount_min_occurrences,
            priority_fee_min_occurrences: config.priority_fee_min_occurrences,
            known_entities,
            timeout,
            parallel: config.parallel,
        })
    }

    pub fn severity(&self, rule: PolicyRule) -> Severity {
        self.policy.severity(rule)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        match Self::new(ScanConfig::default()) {
            Ok(config) => config,
            Err(e) => unreachable!("default configuration is valid: {}", e),
        }
    }
}

fn resolve_heuristics(config: &ScanConfig) -> ScanResult<Vec<HeuristicId>> {
    let parse = |id: &String| {
        HeuristicId::from_id(id)
            .ok_or_else(|| ScanError::Configuration(format!("unknown heuristic id '{}'", id)))
    };

    let disabled = config.disabled_heuristics.iter().map(parse).collect::<ScanResult<BTreeSet<_>>>()?;
    let enabled = match &config.enabled_heuristics {
        Some(ids) => Some(ids.iter().map(parse).collect::<ScanResult<BTreeSet<_>>>()?),
        None => None,
    };

    Ok(HeuristicId::ALL
        .iter()
        .copied()
        .filter(|id| enabled.as_ref().map_or(true, |set| set.contains(id)))
        .filter(|id| !disabled.contains(id))
        .collect())
}

fn window(name: &str, secs: u64) -> ScanResult<i64> {
    if secs == 0 {
        return Err(ScanError::Configuration(format!("{} must be positive", name)));
    }
    i64::try_from(secs).map_err(|_| ScanError::Configuration(format!("{} is out of range: {}", name, secs)))
}

/// A deadline this far out must be representable from now
fn checked_timeout(secs: u64) -> ScanResult<Duration> {
    let timeout = Duration::from_secs(secs);
    match Instant::now().checked_add(timeout) {
        Some(_) => Ok(timeout),
        None => Err(ScanError::Configuration(format!("timeoutSecs is out of range: {}", secs))),
    }
}

fn parse_entity(address: &str, label: &str, kind: EntityKind) -> ScanResult<KnownEntity> {
    let address = Pubkey::from_str(address)
        .map_err(|e| ScanError::Configuration(format!("invalid known-entity address '{}': {}", address, e)))?;
    Ok(KnownEntity {
        address,
        label: label.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::new(ScanConfig::default()).unwrap();
        assert_eq!(config.heuristics.len(), HeuristicId::ALL.len());
        assert_eq!(config.known_entities.len(), DEFAULT_ENTITIES.len());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_unknown_heuristic_rejected() {
        let mut config = ScanConfig::default();
        config.disabled_heuristics.insert("does-not-exist".to_string());
        assert!(matches!(EngineConfig::new(config), Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_enable_and_disable_sets() {
        let mut config = ScanConfig::default();
        config.enabled_heuristics = Some(
            ["memo-pii", "address-clustering"].iter().map(|s| s.to_string()).collect(),
        );
        config.disabled_heuristics.insert("memo-pii".to_string());
        let config = EngineConfig::new(config).unwrap();
        assert_eq!(config.heuristics, vec![HeuristicId::AddressClustering]);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let config = ScanConfig { cluster_size_threshold: 1, ..ScanConfig::default() };
        assert!(EngineConfig::new(config).is_err());

        let config = ScanConfig { timing_window_secs: 0, ..ScanConfig::default() };
        assert!(EngineConfig::new(config).is_err());

        let config = ScanConfig {
            known_entities: vec![KnownEntityConfig {
                address: "not-a-key".to_string(),
                label: "x".to_string(),
                kind: EntityKind::Exchange,
            }],
            ..ScanConfig::default()
        };
        assert!(EngineConfig::new(config).is_err());
    }

    #[test]
    fn test_rule_thresholds_validated() {
        let config = EngineConfig::new(ScanConfig::default()).unwrap();
        assert_eq!(config.timing_group_size, 3);
        assert_eq!(config.heavy_reuse_counterparties, 6);
        assert_eq!(config.fee_payer_linked_wallets, 2);

        let config = ScanConfig { timing_group_size: 2, ..ScanConfig::default() };
        assert!(matches!(EngineConfig::new(config), Err(ScanError::Configuration(_))));

        let config = ScanConfig {
            reuse_min_counterparties: 4,
            heavy_reuse_counterparties: 3,
            ..ScanConfig::default()
        };
        assert!(matches!(EngineConfig::new(config), Err(ScanError::Configuration(_))));

        let config = ScanConfig { fee_payer_linked_wallets: 1, ..ScanConfig::default() };
        assert!(matches!(EngineConfig::new(config), Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_out_of_range_timeout_rejected() {
        let config = ScanConfig { timeout_secs: Some(u64::MAX), ..ScanConfig::default() };
        assert!(matches!(EngineConfig::new(config), Err(ScanError::Configuration(_))));

        let config = ScanConfig { timeout_secs: Some(30), ..ScanConfig::default() };
        assert_eq!(EngineConfig::new(config).unwrap().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "severityOverrides": { "memo-pii": "CRITICAL" }, "clusterSizeThreshold": 3 }"#,
        )
        .unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.cluster_size_threshold, 3);
        assert_eq!(config.timing_window_secs, 60);

        let engine_config = EngineConfig::new(config).unwrap();
        assert_eq!(engine_config.severity(PolicyRule::MemoPii), Severity::Critical);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScanConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
    }
}
