//! Severity policy table.
//!
//! Heuristics never pick a severity themselves: they name the rule that
//! fired and look the severity up here, so the same table governs every
//! heuristic and overrides apply uniformly.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{ScanError, ScanResult};
use crate::models::finding::Severity;

/// A severity-bearing outcome a heuristic can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PolicyRule {
    FeePayerLinksWallets,
    FeePayerReused,
    ClusterLarge,
    ClusterSmall,
    ChangeAddressRoundTrip,
    ChangeAddressAmount,
    ChangeAddress,
    TimingGroup,
    TimingPair,
    MemoPii,
    MemoPlaintext,
    AddressReuseHeavy,
    AddressReuse,
    KnownEntityExchange,
    KnownEntity,
    AmountReuse,
    PriorityFeeCrossWallet,
    PriorityFeeFingerprint,
    StaticFeePayerLoop,
    StaticFeePayerShared,
    StaticMemoPii,
    StaticMemoPlaintext,
}

impl PolicyRule {
    pub const ALL: [PolicyRule; 22] = [
        Self::FeePayerLinksWallets,
        Self::FeePayerReused,
        Self::ClusterLarge,
        Self::ClusterSmall,
        Self::ChangeAddressRoundTrip,
        Self::ChangeAddressAmount,
        Self::ChangeAddress,
        Self::TimingGroup,
        Self::TimingPair,
        Self::MemoPii,
        Self::MemoPlaintext,
        Self::AddressReuseHeavy,
        Self::AddressReuse,
        Self::KnownEntityExchange,
        Self::KnownEntity,
        Self::AmountReuse,
        Self::PriorityFeeCrossWallet,
        Self::PriorityFeeFingerprint,
        Self::StaticFeePayerLoop,
        Self::StaticFeePayerShared,
        Self::StaticMemoPii,
        Self::StaticMemoPlaintext,
    ];

    /// Rule id used in configuration overrides
    pub fn id(&self) -> &'static str {
        match self {
            Self::FeePayerLinksWallets => "fee-payer-links-wallets",
            Self::FeePayerReused => "fee-payer-reused",
            Self::ClusterLarge => "cluster-large",
            Self::ClusterSmall => "cluster-small",
            Self::ChangeAddressRoundTrip => "change-address-round-trip",
            Self::ChangeAddressAmount => "change-address-amount",
            Self::ChangeAddress => "change-address",
            Self::TimingGroup => "timing-group",
            Self::TimingPair => "timing-pair",
            Self::MemoPii => "memo-pii",
            Self::MemoPlaintext => "memo-plaintext",
            Self::AddressReuseHeavy => "address-reuse-heavy",
            Self::AddressReuse => "address-reuse",
            Self::KnownEntityExchange => "known-entity-exchange",
            Self::KnownEntity => "known-entity",
            Self::AmountReuse => "amount-reuse",
            Self::PriorityFeeCrossWallet => "priority-fee-cross-wallet",
            Self::PriorityFeeFingerprint => "priority-fee-fingerprint",
            Self::StaticFeePayerLoop => "static-fee-payer-loop",
            Self::StaticFeePayerShared => "static-fee-payer-shared",
            Self::StaticMemoPii => "static-memo-pii",
            Self::StaticMemoPlaintext => "static-memo-plaintext",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|rule| rule.id() == id)
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Self::FeePayerLinksWallets
            | Self::ClusterLarge
            | Self::StaticFeePayerLoop => Severity::Critical,
            Self::ClusterSmall
            | Self::ChangeAddressRoundTrip
            | Self::ChangeAddressAmount
            | Self::TimingGroup
            | Self::MemoPii
            | Self::AddressReuseHeavy
            | Self::KnownEntityExchange
            | Self::StaticFeePayerShared
            | Self::StaticMemoPii => Severity::High,
            Self::FeePayerReused
            | Self::ChangeAddress
            | Self::TimingPair
            | Self::AddressReuse
            | Self::KnownEntity
            | Self::AmountReuse
            | Self::PriorityFeeCrossWallet => Severity::Medium,
            Self::MemoPlaintext
            | Self::PriorityFeeFingerprint
            | Self::StaticMemoPlaintext => Severity::Low,
        }
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Rule -> severity table, complete for every [`PolicyRule`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityPolicy {
    table: BTreeMap<PolicyRule, Severity>,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            table: PolicyRule::ALL.iter().map(|rule| (*rule, rule.default_severity())).collect(),
        }
    }
}

impl SeverityPolicy {
    /// Defaults with overrides applied. Unknown rule ids are rejected.
    pub fn with_overrides(overrides: &BTreeMap<String, Severity>) -> ScanResult<Self> {
        let mut policy = Self::default();
        for (id, severity) in overrides {
            let rule = PolicyRule::from_id(id).ok_or_else(|| {
                ScanError::Configuration(format!("unknown severity policy rule '{}'", id))
            })?;
            policy.table.insert(rule, *severity);
        }
        Ok(policy)
    }

    pub fn severity(&self, rule: PolicyRule) -> Severity {
        self.table.get(&rule).copied().unwrap_or_else(|| rule.default_severity())
    }

    /// The full table, in rule order
    pub fn entries(&self) -> impl Iterator<Item = (PolicyRule, Severity)> + '_ {
        self.table.iter().map(|(rule, severity)| (*rule, *severity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ids_round_trip() {
        for rule in PolicyRule::ALL {
            assert_eq!(PolicyRule::from_id(rule.id()), Some(rule));
        }
        assert_eq!(PolicyRule::from_id("nope"), None);
    }

    #[test]
    fn test_default_table_is_complete() {
        let policy = SeverityPolicy::default();
        assert_eq!(policy.entries().count(), PolicyRule::ALL.len());
        assert_eq!(policy.severity(PolicyRule::StaticFeePayerLoop), Severity::Critical);
        assert_eq!(policy.severity(PolicyRule::MemoPii), Severity::High);
    }

    #[test]
    fn test_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("memo-pii".to_string(), Severity::Critical);
        let policy = SeverityPolicy::with_overrides(&overrides).unwrap();
        assert_eq!(policy.severity(PolicyRule::MemoPii), Severity::Critical);
        assert_eq!(policy.severity(PolicyRule::MemoPlaintext), Severity::Low);

        overrides.insert("made-up".to_string(), Severity::Low);
        assert!(matches!(
            SeverityPolicy::with_overrides(&overrides),
            Err(ScanError::Configuration(_))
        ));
    }
}
