use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::resource::Resource;
use crate::rules::eval::Finding;

/// Finding severity. Ordering is semantic: `Info < Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    #[serde(alias = "info")]
    Info,
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
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" | "med" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" | "crit" => Ok(Severity::Critical),
            _ => Err(format!(
                "unknown severity `{s}` (expected one of: {})",
                one_of(&Severity::ALL)
            )),
        }
    }
}

fn one_of<T: fmt::Display>(all: &[T]) -> String {
    all.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
}

/// Well-architected pillar a rule belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Security,
    Reliability,
    CostOptimization,
    OperationalExcellence,
    PerformanceEfficiency,
    Sustainability,
}

impl Pillar {
    pub const ALL: [Pillar; 6] = [
        Pillar::Security,
        Pillar::Reliability,
        Pillar::CostOptimization,
        Pillar::OperationalExcellence,
        Pillar::PerformanceEfficiency,
        Pillar::Sustainability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Security => "Security",
            Pillar::Reliability => "Reliability",
            Pillar::CostOptimization => "Cost Optimization",
            Pillar::OperationalExcellence => "Operational Excellence",
            Pillar::PerformanceEfficiency => "Performance Efficiency",
            Pillar::Sustainability => "Sustainability",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = String;

    /// Accepts `cost-optimization`, `cost_optimization`, `CostOptimization`
    /// and `Cost Optimization` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "security" => Ok(Pillar::Security),
            "reliability" => Ok(Pillar::Reliability),
            "costoptimization" | "cost" => Ok(Pillar::CostOptimization),
            "operationalexcellence" | "operations" => Ok(Pillar::OperationalExcellence),
            "performanceefficiency" | "performance" => Ok(Pillar::PerformanceEfficiency),
            "sustainability" => Ok(Pillar::Sustainability),
            _ => Err(format!(
                "unknown pillar `{s}` (expected one of: {})",
                one_of(&Pillar::ALL)
            )),
        }
    }
}

/// Static description of a rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub pillar: Pillar,
    /// Resource types a single-resource rule is dispatched for. Treated as a set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<String>,
    /// Default remediation attached to findings.
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
}

impl RuleMetadata {
    pub fn new(id: &str, name: &str, severity: Severity, pillar: Pillar) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            severity,
            pillar,
            resource_types: Vec::new(),
            remediation: String::new(),
            doc_url: None,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn for_types(mut self, types: &[&str]) -> Self {
        self.resource_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn remediate(mut self, remediation: &str) -> Self {
        self.remediation = remediation.to_string();
        self
    }

    pub fn doc(mut self, url: &str) -> Self {
        self.doc_url = Some(url.to_string());
        self
    }

    /// Build a finding for `resource` with this rule's default remediation.
    pub fn finding(&self, resource: &Resource, description: impl Into<String>) -> Finding {
        self.finding_with(resource, description, self.remediation.clone())
    }

    pub fn finding_with(
        &self,
        resource: &Resource,
        description: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Finding {
        Finding {
            rule_id: self.id.clone(),
            rule_name: self.name.clone(),
            severity: self.severity,
            pillar: self.pillar,
            resource: resource.address(),
            file: resource.file.clone(),
            line: resource.line,
            description: description.into(),
            remediation: remediation.into(),
            doc_url: self.doc_url.clone(),
        }
    }
}
