use serde::{Deserialize, Serialize};

use crate::model::resource::Resource;
use crate::rules::catalog::{Pillar, RuleMetadata, Severity};

/// One reported policy violation.
///
/// Built through [`RuleMetadata::finding`]; the engine never alters a finding
/// after a rule returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub pillar: Pillar,
    /// Address of the offending resource.
    pub resource: String,
    pub file: String,
    pub line: usize,
    pub description: String,
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
}

/// A check over a single resource.
///
/// Implementations must be pure and total: a rule that cannot decide returns
/// no finding instead of failing.
pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    fn evaluate(&self, resource: &Resource) -> Vec<Finding>;
}

/// A check whose verdict depends on several resources at once.
///
/// Receives the complete, unfiltered resource list and must not keep it.
pub trait CrossResourceRule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    fn evaluate_all(&self, resources: &[Resource]) -> Vec<Finding>;
}
