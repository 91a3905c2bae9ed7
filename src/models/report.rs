//! Report model.
//!
//! A [`Report`] is built once per scan by the aggregator and never mutated
//! afterwards; its fields are only reachable through accessors.

use serde::{Serialize, Deserialize};

use crate::models::finding::{Finding, Severity};

/// Per-severity counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary.total = findings.len();
        summary
    }
}

/// A raw record or syntax node the normalizer could not use
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position in the raw input (record index, or source line)
    pub index: usize,
    /// Signature or `file:line`, when known
    pub identifier: Option<String>,
    pub reason: String,
}

/// A heuristic that failed during evaluation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeuristicFailure {
    pub heuristic: String,
    pub cause: String,
}

/// Whether every enabled heuristic contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completeness {
    Complete,
    /// Interrupted; the listed heuristics never ran
    Partial { skipped: Vec<String> },
}

/// Final, ordered, deduplicated scan result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    issues: Vec<Finding>,
    summary: Summary,
    warnings: Vec<SkippedRecord>,
    failures: Vec<HeuristicFailure>,
    completeness: Completeness,
}

impl Report {
    /// Built by the aggregator; `issues` must already be deduplicated and sorted.
    pub(crate) fn new(
        issues: Vec<Finding>,
        warnings: Vec<SkippedRecord>,
        failures: Vec<HeuristicFailure>,
        completeness: Completeness,
    ) -> Self {
        let summary = Summary::from_findings(&issues);
        Self {
            issues,
            summary,
            warnings,
            failures,
            completeness,
        }
    }

    pub fn issues(&self) -> &[Finding] {
        &self.issues
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Records the normalizer skipped
    pub fn warnings(&self) -> &[SkippedRecord] {
        &self.warnings
    }

    /// Heuristics that failed and contributed nothing
    pub fn failures(&self) -> &[HeuristicFailure] {
        &self.failures
    }

    pub fn completeness(&self) -> &Completeness {
        &self.completeness
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.completeness, Completeness::Partial { .. })
    }

    /// Issues of one type
    pub fn issues_of<'a>(&'a self, finding_type: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.issues.iter().filter(move |f| f.finding_type.as_str() == finding_type)
    }

    /// Serialize to the report JSON contract (pretty-printed)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.contract())
    }

    /// The report JSON contract as a value
    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.contract())
    }

    fn contract(&self) -> ReportJson<'_> {
        ReportJson {
            issues: self.issues.iter().map(IssueJson::from).collect(),
            summary: &self.summary,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    issues: Vec<IssueJson<'a>>,
    summary: &'a Summary,
}

/// One entry of the `issues` array
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueJson<'a> {
    #[serde(rename = "type")]
    issue_type: &'static str,
    severity: Severity,
    file: Option<&'a str>,
    line: Option<usize>,
    message: &'a str,
    suggestion: &'a str,
    code_snippet: Option<&'a str>,
    identifier: Option<&'a str>,
}

impl<'a> From<&'a Finding> for IssueJson<'a> {
    fn from(finding: &'a Finding) -> Self {
        Self {
            issue_type: finding.finding_type.as_str(),
            severity: finding.severity,
            file: finding.location.file(),
            line: finding.location.line(),
            message: &finding.message,
            suggestion: &finding.suggestion,
            code_snippet: finding.code_snippet.as_deref(),
            identifier: finding.identifier.as_deref(),
        }
    }
}
