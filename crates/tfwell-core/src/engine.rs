//! Rule evaluation engine.
//!
//! An [`Engine`] is built once per run. Filtering against the [`Config`]
//! happens in [`Engine::new`]; [`Engine::analyze`] only dispatches.
//!
//! Dispatch order is fixed:
//! 1. resources in input order, and for each one the applicable
//!    single-resource rules in registry order;
//! 2. then every cross-resource rule once, over the whole resource list,
//!    in registry order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::model::resource::Resource;
use crate::rules::catalog::RuleMetadata;
use crate::rules::eval::{CrossResourceRule, Finding, Rule};
use crate::rules::registry::Registry;

pub struct Engine {
    /// Surviving single-resource rules, registry order.
    rules: Vec<Arc<dyn Rule>>,

    /// Surviving cross-resource rules, registry order.
    cross_rules: Vec<Arc<dyn CrossResourceRule>>,

    /// Resource type -> indices into `rules`, ascending.
    by_type: HashMap<String, Vec<usize>>,
}

impl Engine {
    /// Filter `registry` against `config` and index the survivors by resource type.
    pub fn new(config: Config, registry: &Registry) -> Self {
        let (rules, cross_rules) = if config.is_unfiltered() {
            (
                registry.all_rules().to_vec(),
                registry.all_cross_rules().to_vec(),
            )
        } else {
            (
                registry
                    .all_rules()
                    .iter()
                    .filter(|r| is_selected(&config, r.metadata()))
                    .cloned()
                    .collect(),
                registry
                    .all_cross_rules()
                    .iter()
                    .filter(|r| is_selected(&config, r.metadata()))
                    .cloned()
                    .collect(),
            )
        };

        let by_type = index_by_type(&rules);

        log::info!(
            "engine selected {}/{} rules and {}/{} cross-resource rules",
            rules.len(),
            registry.all_rules().len(),
            cross_rules.len(),
            registry.all_cross_rules().len()
        );

        Self {
            rules,
            cross_rules,
            by_type,
        }
    }

    /// Single-resource rules that survived filtering.
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    /// Cross-resource rules that survived filtering.
    pub fn cross_rules(&self) -> &[Arc<dyn CrossResourceRule>] {
        &self.cross_rules
    }

    /// Metadata of every surviving rule, single-resource rules first.
    pub fn metadata(&self) -> Vec<&RuleMetadata> {
        self.rules
            .iter()
            .map(|r| r.metadata())
            .chain(self.cross_rules.iter().map(|r| r.metadata()))
            .collect()
    }

    /// Run every applicable rule and return findings resource-major, rule-minor,
    /// followed by cross-resource findings.
    pub fn analyze(&self, resources: &[Resource]) -> Vec<Finding> {
        let mut findings = Vec::new();

        for resource in resources {
            let Some(indices) = self.by_type.get(&resource.resource_type) else {
                continue;
            };
            for &idx in indices {
                findings.extend(self.rules[idx].evaluate(resource));
            }
        }

        let single_count = findings.len();

        for rule in &self.cross_rules {
            findings.extend(rule.evaluate_all(resources));
        }

        log::info!(
            "analyzed {} resources: {} findings ({} cross-resource)",
            resources.len(),
            findings.len(),
            findings.len() - single_count
        );

        findings
    }
}

/// Apply the run filters to one rule. Exclusion is checked first and always wins.
fn is_selected(config: &Config, meta: &RuleMetadata) -> bool {
    if config.exclude_ids.iter().any(|id| *id == meta.id) {
        return false;
    }

    if !config.rule_ids.is_empty() && !config.rule_ids.iter().any(|id| *id == meta.id) {
        return false;
    }

    if !config.pillars.is_empty() && !config.pillars.contains(&meta.pillar) {
        return false;
    }

    if let Some(min) = config.min_severity {
        if meta.severity < min {
            return false;
        }
    }

    true
}

/// Map each declared resource type to the rules that handle it.
///
/// A rule listed under several types appears under each, once per type.
fn index_by_type(rules: &[Arc<dyn Rule>]) -> HashMap<String, Vec<usize>> {
    let mut by_type: HashMap<String, Vec<usize>> = HashMap::new();

    for (idx, rule) in rules.iter().enumerate() {
        for resource_type in &rule.metadata().resource_types {
            let entry = by_type.entry(resource_type.clone()).or_default();
            if !entry.contains(&idx) {
                entry.push(idx);
            }
        }
    }

    by_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::Attributes;
    use crate::rules::catalog::{Pillar, Severity};
    use std::sync::Mutex;

    /// Flags every resource it sees and records the call.
    struct Recording {
        meta: RuleMetadata,
        calls: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(id: &str, severity: Severity, pillar: Pillar, types: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                meta: RuleMetadata::new(id, id, severity, pillar).for_types(types),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Rule for Recording {
        fn metadata(&self) -> &RuleMetadata {
            &self.meta
        }

        fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
            self.calls.lock().unwrap().push(resource.address());
            vec![self.meta.finding(resource, "flagged")]
        }
    }

    /// Emits one finding per resource of `target` type.
    struct CountCross {
        meta: RuleMetadata,
        target: &'static str,
    }

    impl CrossResourceRule for CountCross {
        fn metadata(&self) -> &RuleMetadata {
            &self.meta
        }

        fn evaluate_all(&self, resources: &[Resource]) -> Vec<Finding> {
            resources
                .iter()
                .filter(|r| r.resource_type == self.target)
                .map(|r| self.meta.finding(r, "cross"))
                .collect()
        }
    }

    fn cross(id: &str, severity: Severity, target: &'static str) -> Arc<CountCross> {
        Arc::new(CountCross {
            meta: RuleMetadata::new(id, id, severity, Pillar::Reliability),
            target,
        })
    }

    fn ids(engine: &Engine) -> Vec<String> {
        engine
            .metadata()
            .iter()
            .map(|m| m.id.clone())
            .collect()
    }

    fn s3_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(Recording::new(
                "S3-001",
                Severity::Critical,
                Pillar::Security,
                &["aws_s3_bucket"],
            ))
            .register(Recording::new(
                "S3-002",
                Severity::High,
                Pillar::Security,
                &["aws_s3_bucket"],
            ))
            .register(Recording::new(
                "TAG-001",
                Severity::Low,
                Pillar::OperationalExcellence,
                &["aws_s3_bucket", "aws_instance"],
            ))
            .register_cross(cross("EKS-100", Severity::High, "aws_eks_cluster"));
        registry
    }

    #[test]
    fn empty_config_keeps_everything() {
        let engine = Engine::new(Config::default(), &s3_registry());
        assert_eq!(ids(&engine), vec!["S3-001", "S3-002", "TAG-001", "EKS-100"]);
    }

    #[test]
    fn exclude_removes_rule() {
        let config = Config {
            exclude_ids: vec!["S3-001".into()],
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());

        let single: Vec<&str> = engine.rules().iter().map(|r| r.metadata().id.as_str()).collect();
        assert_eq!(single, vec!["S3-002", "TAG-001"]);
    }

    #[test]
    fn exclude_wins_over_allow_list() {
        let config = Config {
            rule_ids: vec!["S3-001".into(), "S3-002".into()],
            exclude_ids: vec!["S3-001".into()],
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());
        assert_eq!(ids(&engine), vec!["S3-002"]);
    }

    #[test]
    fn allow_list_applies_to_cross_rules_too() {
        let config = Config {
            rule_ids: vec!["EKS-100".into()],
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());
        assert!(engine.rules().is_empty());
        assert_eq!(engine.cross_rules().len(), 1);
    }

    #[test]
    fn pillar_filter() {
        let config = Config {
            pillars: vec![Pillar::OperationalExcellence, Pillar::Reliability],
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());
        assert_eq!(ids(&engine), vec!["TAG-001", "EKS-100"]);
    }

    #[test]
    fn min_severity_filter_is_inclusive() {
        let config = Config {
            min_severity: Some(Severity::High),
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());
        assert_eq!(ids(&engine), vec!["S3-001", "S3-002", "EKS-100"]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let config = Config {
            pillars: vec![Pillar::Security],
            min_severity: Some(Severity::Critical),
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());
        assert_eq!(ids(&engine), vec!["S3-001"]);
    }

    #[test]
    fn dispatch_only_matches_declared_types() {
        let s3 = Recording::new("S3-001", Severity::High, Pillar::Security, &["aws_s3_bucket"]);
        let mut registry = Registry::new();
        registry.register(s3.clone());
        let engine = Engine::new(Config::default(), &registry);

        let resources = vec![
            Resource::new("aws_instance", "web"),
            Resource::new("aws_s3_bucket", "logs"),
            Resource::new("data.aws_s3_bucket", "existing"),
        ];
        let findings = engine.analyze(&resources);

        assert_eq!(s3.calls(), vec!["aws_s3_bucket.logs"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].resource, "aws_s3_bucket.logs");
    }

    #[test]
    fn findings_are_resource_major_rule_minor_then_cross() {
        let engine = Engine::new(Config::default(), &s3_registry());
        let resources = vec![
            Resource::new("aws_s3_bucket", "a"),
            Resource::new("aws_eks_cluster", "main"),
            Resource::new("aws_instance", "web"),
            Resource::new("aws_s3_bucket", "b"),
        ];

        let order: Vec<(String, String)> = engine
            .analyze(&resources)
            .into_iter()
            .map(|f| (f.resource, f.rule_id))
            .collect();

        let expected: Vec<(String, String)> = [
            ("aws_s3_bucket.a", "S3-001"),
            ("aws_s3_bucket.a", "S3-002"),
            ("aws_s3_bucket.a", "TAG-001"),
            ("aws_instance.web", "TAG-001"),
            ("aws_s3_bucket.b", "S3-001"),
            ("aws_s3_bucket.b", "S3-002"),
            ("aws_s3_bucket.b", "TAG-001"),
            ("aws_eks_cluster.main", "EKS-100"),
        ]
        .iter()
        .map(|(r, id)| (r.to_string(), id.to_string()))
        .collect();

        assert_eq!(order, expected);
    }

    #[test]
    fn duplicate_declared_type_dispatches_once() {
        let rule = Recording::new(
            "DUP-001",
            Severity::Low,
            Pillar::Security,
            &["aws_vpc", "aws_vpc"],
        );
        let mut registry = Registry::new();
        registry.register(rule.clone());
        let engine = Engine::new(Config::default(), &registry);

        engine.analyze(&[Resource::new("aws_vpc", "main")]);
        assert_eq!(rule.calls().len(), 1);
    }

    #[test]
    fn cross_rules_see_the_full_resource_list() {
        // The single-resource rule is filtered out; the cross rule still sees every resource.
        let config = Config {
            exclude_ids: vec!["S3-001".into(), "S3-002".into(), "TAG-001".into()],
            ..Default::default()
        };
        let engine = Engine::new(config, &s3_registry());

        let findings = engine.analyze(&[
            Resource::new("aws_s3_bucket", "a"),
            Resource::new("aws_eks_cluster", "one"),
            Resource::new("aws_eks_cluster", "two"),
        ]);

        let resources: Vec<&str> = findings.iter().map(|f| f.resource.as_str()).collect();
        assert_eq!(resources, vec!["aws_eks_cluster.one", "aws_eks_cluster.two"]);
    }

    #[test]
    fn analyze_does_not_touch_resources() {
        let engine = Engine::new(Config::default(), &s3_registry());
        let resources = vec![Resource::new("aws_s3_bucket", "a").with_attr("bucket", "x")];
        let before = resources.clone();

        engine.analyze(&resources);
        engine.analyze(&resources);

        assert_eq!(resources, before);
        assert_eq!(resources[0].get_string_attr("bucket"), Some("x"));
    }

    #[test]
    fn no_resources_no_findings() {
        let engine = Engine::new(Config::default(), &s3_registry());
        assert!(engine.analyze(&[]).is_empty());
    }
}
