//! EKS cluster checks, including the cluster/compute relationship.

use std::sync::Arc;

use crate::checks::{bool_setting, literal_str, literal_strings};
use crate::model::resource::{Attributes, Resource};
use crate::rules::catalog::{Pillar, RuleMetadata, Severity};
use crate::rules::eval::{CrossResourceRule, Finding, Rule};

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![Arc::new(PublicEndpoint::new()), Arc::new(ControlPlaneLogging::new())]
}

pub fn cross_rules() -> Vec<Arc<dyn CrossResourceRule>> {
    vec![Arc::new(ClusterCompute::new())]
}

const CLUSTER_TYPE: &str = "aws_eks_cluster";
const COMPUTE_TYPES: &[&str] = &["aws_eks_node_group", "aws_eks_fargate_profile"];

/// EKS-001: API server endpoint reachable from anywhere.
pub struct PublicEndpoint {
    meta: RuleMetadata,
}

impl PublicEndpoint {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EKS-001",
                "EKS public endpoint unrestricted",
                Severity::Medium,
                Pillar::Security,
            )
            .describe("The cluster API endpoint should be private or limited to known CIDR ranges.")
            .for_types(&[CLUSTER_TYPE])
            .remediate("Set vpc_config.endpoint_public_access = false, or restrict public_access_cidrs.")
            .doc("https://docs.aws.amazon.com/eks/latest/userguide/cluster-endpoint.html"),
        }
    }
}

impl Default for PublicEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PublicEndpoint {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        let Some(vpc) = resource.get_blocks("vpc_config").first() else {
            return vec![self.meta.finding(
                resource,
                "no vpc_config; the endpoint defaults to public",
            )];
        };

        match bool_setting(vpc, "endpoint_public_access", true) {
            Some(true) => {}
            _ => return Vec::new(),
        }

        // An absent list means the provider default of 0.0.0.0/0.
        let open = match vpc.get_attr("public_access_cidrs") {
            None => true,
            Some(v) if v.is_null() => true,
            Some(v) if v.is_unresolved() => return Vec::new(),
            Some(v) => {
                let Some(items) = v.as_list() else {
                    return Vec::new();
                };
                let literals = literal_strings(vpc, "public_access_cidrs").unwrap_or_default();
                if literals.contains(&"0.0.0.0/0") {
                    true
                } else if literals.len() < items.len() {
                    return Vec::new();
                } else {
                    items.is_empty()
                }
            }
        };

        if open {
            vec![self
                .meta
                .finding(resource, "public endpoint is enabled and open to 0.0.0.0/0")]
        } else {
            Vec::new()
        }
    }
}

/// EKS-002: control plane logs not shipped anywhere.
pub struct ControlPlaneLogging {
    meta: RuleMetadata,
}

impl ControlPlaneLogging {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EKS-002",
                "EKS control plane logging disabled",
                Severity::Low,
                Pillar::OperationalExcellence,
            )
            .describe("Control plane logs are needed to audit and troubleshoot the cluster.")
            .for_types(&[CLUSTER_TYPE])
            .remediate("Set enabled_cluster_log_types, e.g. [\"api\", \"audit\", \"authenticator\"].")
            .doc("https://docs.aws.amazon.com/eks/latest/userguide/control-plane-logs.html"),
        }
    }
}

impl Default for ControlPlaneLogging {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ControlPlaneLogging {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        let disabled = match resource.get_attr("enabled_cluster_log_types") {
            None => true,
            Some(v) if v.is_null() => true,
            Some(v) => v.as_list().is_some_and(<[_]>::is_empty),
        };

        if disabled {
            vec![self.meta.finding(resource, "no control plane log types are enabled")]
        } else {
            Vec::new()
        }
    }
}

/// EKS-100: cluster with neither a node group nor a Fargate profile.
pub struct ClusterCompute {
    meta: RuleMetadata,
}

impl ClusterCompute {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EKS-100",
                "EKS cluster without compute",
                Severity::High,
                Pillar::Reliability,
            )
            .describe("Every EKS cluster needs a managed node group or Fargate profile to run workloads.")
            .remediate("Add an aws_eks_node_group or aws_eks_fargate_profile whose cluster_name targets this cluster.")
            .doc("https://docs.aws.amazon.com/eks/latest/userguide/eks-compute.html"),
        }
    }
}

impl Default for ClusterCompute {
    fn default() -> Self {
        Self::new()
    }
}

/// Which cluster a node group or Fargate profile attaches to.
enum Target<'a> {
    /// Literal cluster name.
    Named(&'a str),
    /// Unresolved expression text.
    Expression(&'a str),
    /// Absent, e.g. a plan value known only after apply.
    Unknown,
}

impl<'a> Target<'a> {
    fn of(compute: &'a Resource) -> Self {
        match compute.get_attr("cluster_name") {
            Some(v) if v.is_unresolved() => v.as_str().map_or(Target::Unknown, Target::Expression),
            Some(v) => v.as_str().map_or(Target::Unknown, Target::Named),
            None => Target::Unknown,
        }
    }

    /// `Some(true/false)` when the target decidably is / is not `cluster`.
    fn matches(&self, cluster: &Resource) -> Option<bool> {
        match self {
            Target::Named(name) => {
                let literal = literal_str(cluster, "name")?;
                Some(literal == *name)
            }
            Target::Expression(text) => {
                if references(text, &cluster.name) {
                    Some(true)
                } else if text.contains(CLUSTER_TYPE) {
                    Some(false)
                } else {
                    None
                }
            }
            Target::Unknown => None,
        }
    }
}

/// True when `text` references `aws_eks_cluster.<name>` as a whole identifier.
fn references(text: &str, name: &str) -> bool {
    let needle = format!("{CLUSTER_TYPE}.{name}");
    text.match_indices(&needle).any(|(at, _)| {
        text[at + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
    })
}

impl CrossResourceRule for ClusterCompute {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate_all(&self, resources: &[Resource]) -> Vec<Finding> {
        let targets: Vec<Target<'_>> = resources
            .iter()
            .filter(|r| COMPUTE_TYPES.contains(&r.resource_type.as_str()))
            .map(Target::of)
            .collect();

        resources
            .iter()
            .filter(|r| r.resource_type == CLUSTER_TYPE)
            .filter_map(|cluster| {
                let verdicts: Vec<Option<bool>> =
                    targets.iter().map(|t| t.matches(cluster)).collect();
                if verdicts.contains(&Some(true)) || verdicts.contains(&None) {
                    log::debug!(
                        "{}: compute found or undecidable for {}",
                        self.meta.id,
                        cluster.address()
                    );
                    return None;
                }
                Some(self.meta.finding(
                    cluster,
                    "cluster has no aws_eks_node_group or aws_eks_fargate_profile",
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::Block;
    use crate::model::value::ConfigValue;

    fn cluster(name: &str, literal: &str) -> Resource {
        Resource::new(CLUSTER_TYPE, name)
            .with_location("eks.tf", 1)
            .with_attr("name", literal)
    }

    #[test]
    fn public_endpoint_defaults_are_open() {
        let rule = PublicEndpoint::new();
        let bare = cluster("main", "prod");
        let default_vpc = cluster("main", "prod").with_block(Block::new("vpc_config"));

        assert_eq!(rule.evaluate(&bare).len(), 1);
        assert_eq!(rule.evaluate(&default_vpc).len(), 1);
    }

    #[test]
    fn public_endpoint_private_or_restricted_is_clean() {
        let rule = PublicEndpoint::new();
        let private = cluster("a", "a").with_block(
            Block::new("vpc_config").with_attr("endpoint_public_access", false),
        );
        let restricted = cluster("b", "b").with_block(
            Block::new("vpc_config").with_attr(
                "public_access_cidrs",
                ConfigValue::List(vec![ConfigValue::from("203.0.113.0/24")]),
            ),
        );
        let wide = cluster("c", "c").with_block(
            Block::new("vpc_config").with_attr(
                "public_access_cidrs",
                ConfigValue::List(vec![ConfigValue::from("0.0.0.0/0")]),
            ),
        );
        let unresolved = cluster("d", "d").with_block(
            Block::new("vpc_config")
                .with_attr("public_access_cidrs", ConfigValue::unresolved("var.cidrs")),
        );

        assert!(rule.evaluate(&private).is_empty());
        assert!(rule.evaluate(&restricted).is_empty());
        assert_eq!(rule.evaluate(&wide).len(), 1);
        assert!(rule.evaluate(&unresolved).is_empty());
    }

    #[test]
    fn logging_requires_log_types() {
        let rule = ControlPlaneLogging::new();
        let empty =
            cluster("a", "a").with_attr("enabled_cluster_log_types", ConfigValue::List(vec![]));
        let some = cluster("b", "b").with_attr(
            "enabled_cluster_log_types",
            ConfigValue::List(vec![ConfigValue::from("audit")]),
        );
        let unresolved = cluster("c", "c").with_attr(
            "enabled_cluster_log_types",
            ConfigValue::unresolved("var.logs"),
        );

        assert_eq!(rule.evaluate(&cluster("d", "d")).len(), 1);
        assert_eq!(rule.evaluate(&empty).len(), 1);
        assert!(rule.evaluate(&some).is_empty());
        assert!(rule.evaluate(&unresolved).is_empty());
    }

    #[test]
    fn cluster_without_compute_is_flagged() {
        let resources = vec![cluster("main", "prod")];
        let findings = ClusterCompute::new().evaluate_all(&resources);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].resource, "aws_eks_cluster.main");
        assert_eq!(findings[0].rule_id, "EKS-100");
        assert_eq!(findings[0].line, 1);
    }

    #[test]
    fn node_group_by_reference_or_literal_satisfies_cluster() {
        let by_ref = vec![
            cluster("main", "prod"),
            Resource::new("aws_eks_node_group", "workers")
                .with_attr("cluster_name", ConfigValue::unresolved("aws_eks_cluster.main.name")),
        ];
        let by_literal = vec![
            cluster("main", "prod"),
            Resource::new("aws_eks_fargate_profile", "default").with_attr("cluster_name", "prod"),
        ];

        assert!(ClusterCompute::new().evaluate_all(&by_ref).is_empty());
        assert!(ClusterCompute::new().evaluate_all(&by_literal).is_empty());
    }

    #[test]
    fn compute_for_another_cluster_does_not_count() {
        let resources = vec![
            cluster("main", "prod"),
            cluster("main_v2", "prod-v2"),
            Resource::new("aws_eks_node_group", "workers")
                .with_attr("cluster_name", ConfigValue::unresolved("aws_eks_cluster.main_v2.name")),
        ];
        let findings = ClusterCompute::new().evaluate_all(&resources);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].resource, "aws_eks_cluster.main");
    }

    #[test]
    fn undecidable_compute_target_suppresses_finding() {
        let resources = vec![
            cluster("main", "prod"),
            Resource::new("aws_eks_node_group", "workers")
                .with_attr("cluster_name", ConfigValue::unresolved("var.cluster_name")),
        ];
        assert!(ClusterCompute::new().evaluate_all(&resources).is_empty());
    }

    #[test]
    fn reference_match_respects_identifier_boundary() {
        assert!(references("${aws_eks_cluster.main.name}", "main"));
        assert!(!references("${aws_eks_cluster.main_v2.name}", "main"));
    }
}
