//! Aggregator: severity normalization, deduplication and ordering

use std::collections::BTreeMap;

use log::debug;

use crate::config::policy::SeverityPolicy;
use crate::models::finding::{Finding, FindingKey};
use crate::models::report::{Completeness, HeuristicFailure, Report, SkippedRecord};

/// Re-apply the policy table, collapse findings with the same
/// (type, location, evidence) key and sort into report order.
///
/// When two findings share a key, the one that sorts first in report order
/// (highest severity) is kept.
pub fn aggregate(
    findings: Vec<Finding>,
    policy: &SeverityPolicy,
    warnings: Vec<SkippedRecord>,
    failures: Vec<HeuristicFailure>,
    completeness: Completeness,
) -> Report {
    let raw_count = findings.len();
    let mut unique: BTreeMap<FindingKey, Finding> = BTreeMap::new();

    for mut finding in findings {
        finding.severity = policy.severity(finding.rule);
        let key = finding.key();
        match unique.get_mut(&key) {
            Some(existing) => {
                if finding.report_order(existing).is_lt() {
                    *existing = finding;
                }
            }
            None => {
                unique.insert(key, finding);
            }
        }
    }

    let mut issues: Vec<Finding> = unique.into_values().collect();
    issues.sort_by(|a, b| a.report_order(b));
    debug!("Aggregated {} findings into {} issues", raw_count, issues.len());

    Report::new(issues, warnings, failures, completeness)
}
