use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::rules::catalog::{Pillar, Severity};
use crate::rules::eval::Finding;

/// Top-level analysis report.
///
/// Findings keep the engine's dispatch order; everything else is derived
/// deterministically from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub input: InputInfo,
    pub summary: Summary,
    pub findings: Vec<Finding>,
    pub classification: ClassificationInfo,
}

impl Report {
    pub fn new(
        tool: ToolInfo,
        input: InputInfo,
        findings: Vec<Finding>,
        classification: ClassificationInfo,
    ) -> Self {
        let summary = Summary::from_findings(&findings);

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            input,
            summary,
            findings,
            classification,
        }
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Directory,
    Plan,
}

/// What was analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    pub kind: InputKind,
    pub path: String,
    pub resource_count: usize,
    /// Plan artifacts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Plan artifacts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ArtifactHash>,
}

impl InputInfo {
    pub fn directory(path: impl Into<String>, resource_count: usize) -> Self {
        Self {
            kind: InputKind::Directory,
            path: path.into(),
            resource_count,
            size_bytes: None,
            hash: None,
        }
    }
}

/// Cryptographic artifact fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHash {
    pub algorithm: String,
    pub value: String,
}

/// Finding counts.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_pillar: BTreeMap<Pillar, usize>,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Summary {
            total: findings.len(),
            ..Default::default()
        };
        for f in findings {
            *summary.by_severity.entry(f.severity).or_default() += 1;
            *summary.by_pillar.entry(f.pillar).or_default() += 1;
        }
        summary
    }
}

/// Final classification level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLevel {
    Safe,
    Risk,
    HighRisk,
}

impl std::fmt::Display for ClassificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClassificationLevel::Safe => "SAFE",
            ClassificationLevel::Risk => "RISK",
            ClassificationLevel::HighRisk => "HIGH_RISK",
        };
        f.write_str(s)
    }
}

/// Final classification block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationInfo {
    pub level: ClassificationLevel,
    pub policy: String,
    pub reason: String,
    /// `None` when there are no findings.
    pub highest_severity: Option<Severity>,
    pub triggered_rule_ids: Vec<String>,
    pub exit_code: i32,
}

impl ClassificationInfo {
    pub fn safe(policy: &str) -> Self {
        Self {
            level: ClassificationLevel::Safe,
            policy: policy.into(),
            reason: "no findings".into(),
            highest_severity: None,
            triggered_rule_ids: vec![],
            exit_code: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::classify::classify;

    fn finding(id: &str, severity: Severity, pillar: Pillar) -> Finding {
        Finding {
            rule_id: id.into(),
            rule_name: "name".into(),
            severity,
            pillar,
            resource: "aws_s3_bucket.b".into(),
            file: "main.tf".into(),
            line: 3,
            description: "desc".into(),
            remediation: "fix".into(),
            doc_url: None,
        }
    }

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "tfwell".into(),
            version: "1.0.0".into(),
        }
    }

    #[test]
    fn report_counts_findings_and_keeps_order() {
        let findings = vec![
            finding("TAG-001", Severity::Low, Pillar::OperationalExcellence),
            finding("S3-001", Severity::Critical, Pillar::Security),
            finding("S3-002", Severity::High, Pillar::Security),
        ];
        let classification = classify(&findings);
        let input = InputInfo::directory("infra", 1);
        let report = Report::new(tool(), input, findings, classification);

        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.by_pillar[&Pillar::Security], 2);
        assert_eq!(report.summary.by_severity[&Severity::Low], 1);
        assert_eq!(report.findings[0].rule_id, "TAG-001");
        assert_eq!(report.classification.level, ClassificationLevel::HighRisk);
    }

    #[test]
    fn empty_report_is_safe() {
        let report = Report::new(
            tool(),
            InputInfo::directory("infra", 0),
            vec![],
            ClassificationInfo::safe("default"),
        );
        assert_eq!(report.summary, Summary::default());
        assert_eq!(report.classification.exit_code, 0);
    }

    #[test]
    fn report_serializes_expected_shape() {
        let findings = vec![finding("S3-001", Severity::Critical, Pillar::Security)];
        let classification = classify(&findings);
        let input = InputInfo::directory("infra", 1);
        let report = Report::new(tool(), input, findings, classification);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["input"]["kind"], "directory");
        assert!(json["input"].get("hash").is_none());
        assert_eq!(json["summary"]["by_severity"]["CRITICAL"], 1);
        assert_eq!(json["summary"]["by_pillar"]["security"], 1);
        assert_eq!(json["findings"][0]["severity"], "CRITICAL");
        assert_eq!(json["classification"]["level"], "HIGH_RISK");
        assert_eq!(json["classification"]["highest_severity"], "CRITICAL");
    }

    #[test]
    fn classification_level_display() {
        assert_eq!(ClassificationLevel::HighRisk.to_string(), "HIGH_RISK");
        assert_eq!(ClassificationLevel::Safe.to_string(), "SAFE");
    }
}
