//! Classification of an analysis run.
//!
//! Derives one verdict from the findings the engine produced.
//!
//! Policy:
//!
//!   - Any CRITICAL or HIGH finding → HIGH_RISK
//!   - Else any MEDIUM finding      → RISK
//!   - Else                         → SAFE
//!
//! The verdict does not depend on finding order.

use crate::report::model::{ClassificationInfo, ClassificationLevel};
use crate::rules::catalog::Severity;
use crate::rules::eval::Finding;

/// Derives the classification for a set of findings.
///
/// Exit code mapping:
/// - SAFE      → 0
/// - RISK      → 1
/// - HIGH_RISK → 2
pub fn classify(findings: &[Finding]) -> ClassificationInfo {
    let Some(highest) = findings.iter().map(|f| f.severity).max() else {
        return ClassificationInfo::safe("default");
    };

    let level = match highest {
        Severity::Critical | Severity::High => ClassificationLevel::HighRisk,
        Severity::Medium => ClassificationLevel::Risk,
        Severity::Low | Severity::Info => ClassificationLevel::Safe,
    };

    let exit_code = match level {
        ClassificationLevel::Safe => 0,
        ClassificationLevel::Risk => 1,
        ClassificationLevel::HighRisk => 2,
    };

    let mut triggered_rule_ids: Vec<String> = findings.iter().map(|f| f.rule_id.clone()).collect();
    triggered_rule_ids.sort();
    triggered_rule_ids.dedup();

    ClassificationInfo {
        level,
        policy: "default".to_string(),
        reason: "classification derived from findings".to_string(),
        highest_severity: Some(highest),
        triggered_rule_ids,
        exit_code,
    }
}
