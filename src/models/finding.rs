//! Finding model

use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use std::fmt;

use crate::config::policy::PolicyRule;

/// Severity of a finding, totally ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "critical")]
    Critical,
}

impl Severity {
    /// Numeric rank, CRITICAL=3 down to LOW=0
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` of a finding as it appears in the report.
///
/// On-chain and static heuristics that detect the same leak share a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingType {
    FeePayerReuse,
    AddressClustering,
    ChangeAddress,
    TimingCorrelation,
    MemoPii,
    AddressReuse,
    KnownEntityInteraction,
    AmountReuse,
    PriorityFeeFingerprint,
}

impl FindingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FeePayerReuse => "fee-payer-reuse",
            Self::AddressClustering => "address-clustering",
            Self::ChangeAddress => "change-address",
            Self::TimingCorrelation => "timing-correlation",
            Self::MemoPii => "memo-pii",
            Self::AddressReuse => "address-reuse",
            Self::KnownEntityInteraction => "known-entity-interaction",
            Self::AmountReuse => "amount-reuse",
            Self::PriorityFeeFingerprint => "priority-fee-fingerprint",
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finding was observed.
///
/// Transaction signatures are kept sorted and unique so that two findings
/// over the same transactions compare equal regardless of discovery order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    /// A line in an analyzed source unit
    Source { file: String, line: usize },
    /// A set of transaction signatures
    Transactions(Vec<String>),
}

impl Location {
    pub fn source(file: impl Into<String>, line: usize) -> Self {
        Self::Source { file: file.into(), line }
    }

    pub fn transactions<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut signatures: Vec<String> = signatures.into_iter().map(Into::into).collect();
        signatures.sort();
        signatures.dedup();
        Self::Transactions(signatures)
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Source { file, .. } => Some(file),
            Self::Transactions(_) => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Source { line, .. } => Some(*line),
            Self::Transactions(_) => None,
        }
    }

    pub fn signatures(&self) -> &[String] {
        match self {
            Self::Source { .. } => &[],
            Self::Transactions(signatures) => signatures,
        }
    }
}

/// Identity of a finding: (type, location, evidence set).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FindingKey {
    pub finding_type: &'static str,
    pub location: Location,
    pub evidence: Vec<String>,
}

/// One reported privacy issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Report type
    pub finding_type: FindingType,
    /// Policy rule the severity was looked up with
    pub rule: PolicyRule,
    /// Severity from the policy table
    pub severity: Severity,
    /// Where it was observed
    pub location: Location,
    /// Human-readable description
    pub message: String,
    /// Suggested remediation
    pub suggestion: String,
    /// Machine-checkable evidence (addresses, matched strings), sorted and unique
    pub evidence: Vec<String>,
    /// Primary subject (variable name or address)
    pub identifier: Option<String>,
    /// Offending source line, for static findings
    pub code_snippet: Option<String>,
}

impl Finding {
    pub fn new(
        finding_type: FindingType,
        rule: PolicyRule,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            finding_type,
            rule,
            severity,
            location,
            message: message.into(),
            suggestion: suggestion.into(),
            evidence: Vec::new(),
            identifier: None,
            code_snippet: None,
        }
    }

    pub fn with_evidence<I, S>(mut self, evidence: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut evidence: Vec<String> = evidence.into_iter().map(Into::into).collect();
        evidence.sort();
        evidence.dedup();
        self.evidence = evidence;
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.code_snippet = snippet;
        self
    }

    /// Deduplication key
    pub fn key(&self) -> FindingKey {
        FindingKey {
            finding_type: self.finding_type.as_str(),
            location: self.location.clone(),
            evidence: self.evidence.clone(),
        }
    }

    /// Report order: severity descending, then type, then location, then the
    /// remaining fields so that the order is total.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.finding_type.as_str().cmp(other.finding_type.as_str()))
            .then_with(|| self.location.cmp(&other.location))
            .then_with(|| self.evidence.cmp(&other.evidence))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}
