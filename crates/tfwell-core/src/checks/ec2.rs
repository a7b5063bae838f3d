//! EC2 instance, volume and security group checks.

use std::sync::Arc;

use crate::checks::{bool_setting, instance_family, literal_str, literal_strings};
use crate::model::resource::{Attributes, Resource};
use crate::rules::catalog::{Pillar, RuleMetadata, Severity};
use crate::rules::eval::{Finding, Rule};

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(OpenIngress::new()),
        Arc::new(EbsEncryption::new()),
        Arc::new(Imdsv2::new()),
        Arc::new(PreviousGeneration::new()),
        Arc::new(Gp2Volume::new()),
        Arc::new(Graviton::new()),
    ]
}

const ANY_IPV4: &str = "0.0.0.0/0";
const ANY_IPV6: &str = "::/0";

/// EC2-001: security group ingress open to the whole internet.
pub struct OpenIngress {
    meta: RuleMetadata,
}

impl OpenIngress {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EC2-001",
                "Security group open to the internet",
                Severity::High,
                Pillar::Security,
            )
            .describe("Ingress rules should not allow traffic from 0.0.0.0/0 or ::/0.")
            .for_types(&["aws_security_group", "aws_security_group_rule"])
            .remediate("Restrict ingress CIDR blocks to known networks, or front the service with a load balancer.")
            .doc("https://docs.aws.amazon.com/vpc/latest/userguide/security-group-rules.html"),
        }
    }

    fn check_rule<A: Attributes + ?Sized>(&self, resource: &Resource, rule: &A) -> Option<Finding> {
        let cidr = open_cidr(rule)?;
        Some(self.meta.finding(
            resource,
            format!("ingress on {} allowed from {cidr}", port_range(rule)),
        ))
    }
}

impl Default for OpenIngress {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for OpenIngress {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        if resource.resource_type == "aws_security_group_rule" {
            if literal_str(resource, "type") != Some("ingress") {
                return Vec::new();
            }
            return self.check_rule(resource, resource).into_iter().collect();
        }

        resource
            .get_blocks("ingress")
            .iter()
            .filter_map(|ingress| self.check_rule(resource, ingress))
            .collect()
    }
}

fn open_cidr<A: Attributes + ?Sized>(rule: &A) -> Option<&'static str> {
    let v4 = literal_strings(rule, "cidr_blocks").unwrap_or_default();
    if v4.contains(&ANY_IPV4) {
        return Some(ANY_IPV4);
    }
    let v6 = literal_strings(rule, "ipv6_cidr_blocks").unwrap_or_default();
    if v6.contains(&ANY_IPV6) {
        return Some(ANY_IPV6);
    }
    None
}

fn port_range<A: Attributes + ?Sized>(rule: &A) -> String {
    if literal_str(rule, "protocol") == Some("-1") {
        return "all ports".to_string();
    }
    match (rule.get_number_attr("from_port"), rule.get_number_attr("to_port")) {
        (Some(from), Some(to)) if from == to => format!("port {from}"),
        (Some(from), Some(to)) => format!("ports {from}-{to}"),
        _ => "unknown ports".to_string(),
    }
}

/// EC2-002: EBS volume without encryption at rest.
pub struct EbsEncryption {
    meta: RuleMetadata,
}

impl EbsEncryption {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EC2-002",
                "EBS volume not encrypted",
                Severity::High,
                Pillar::Security,
            )
            .describe("EBS volumes should be encrypted at rest.")
            .for_types(&["aws_ebs_volume"])
            .remediate("Set encrypted = true, optionally with a customer-managed kms_key_id.")
            .doc("https://docs.aws.amazon.com/ebs/latest/userguide/ebs-encryption.html"),
        }
    }
}

impl Default for EbsEncryption {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for EbsEncryption {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        if bool_setting(resource, "encrypted", false) == Some(false) {
            vec![self.meta.finding(resource, "EBS volume is not encrypted")]
        } else {
            Vec::new()
        }
    }
}

/// EC2-003: instance metadata service reachable without session tokens.
pub struct Imdsv2 {
    meta: RuleMetadata,
}

impl Imdsv2 {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EC2-003",
                "IMDSv2 not enforced",
                Severity::Medium,
                Pillar::Security,
            )
            .describe("Instances should require IMDSv2 session tokens for metadata access.")
            .for_types(&["aws_instance"])
            .remediate("Add metadata_options { http_tokens = \"required\" }.")
            .doc("https://docs.aws.amazon.com/AWSEC2/latest/UserGuide/configuring-IMDS-existing-instances.html"),
        }
    }
}

impl Default for Imdsv2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Imdsv2 {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        let tokens = match resource.get_blocks("metadata_options").first() {
            None => None,
            Some(options) => match options.get_attr("http_tokens") {
                None => None,
                Some(v) if v.is_unresolved() => return Vec::new(),
                Some(v) => v.as_str(),
            },
        };

        match tokens {
            Some("required") => Vec::new(),
            Some(other) => vec![self
                .meta
                .finding(resource, format!("metadata_options.http_tokens is `{other}`"))],
            None => vec![self.meta.finding(
                resource,
                "metadata_options.http_tokens is not set; IMDSv1 stays enabled",
            )],
        }
    }
}

const PREVIOUS_GENERATION: &[&str] = &[
    "t1", "t2", "m1", "m2", "m3", "m4", "c1", "c3", "c4", "r3", "r4", "i2", "d2", "g2", "g3", "p2",
    "x1",
];

/// EC2-004: previous-generation instance family.
pub struct PreviousGeneration {
    meta: RuleMetadata,
}

impl PreviousGeneration {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EC2-004",
                "Previous-generation instance type",
                Severity::Low,
                Pillar::CostOptimization,
            )
            .describe("Current-generation instance families give better price/performance.")
            .for_types(&["aws_instance"])
            .remediate("Move to a current-generation family such as t3, m6i or m7g.")
            .doc("https://aws.amazon.com/ec2/previous-generation/"),
        }
    }
}

impl Default for PreviousGeneration {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PreviousGeneration {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        let Some(instance_type) = literal_str(resource, "instance_type") else {
            return Vec::new();
        };
        let family = instance_family(instance_type);
        if PREVIOUS_GENERATION.contains(&family) {
            vec![self.meta.finding(
                resource,
                format!("instance type `{instance_type}` is a previous-generation family"),
            )]
        } else {
            Vec::new()
        }
    }
}

/// EC2-005: gp2 volume where gp3 is cheaper and faster.
pub struct Gp2Volume {
    meta: RuleMetadata,
}

impl Gp2Volume {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EC2-005",
                "gp2 EBS volume",
                Severity::Low,
                Pillar::PerformanceEfficiency,
            )
            .describe("gp3 volumes provide baseline IOPS and throughput independent of size.")
            .for_types(&["aws_ebs_volume"])
            .remediate("Set type = \"gp3\".")
            .doc("https://docs.aws.amazon.com/ebs/latest/userguide/general-purpose.html"),
        }
    }
}

impl Default for Gp2Volume {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Gp2Volume {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        if literal_str(resource, "type") == Some("gp2") {
            vec![self.meta.finding(resource, "volume type is gp2")]
        } else {
            Vec::new()
        }
    }
}

/// EC2-006: x86 instance where a Graviton family exists.
pub struct Graviton {
    meta: RuleMetadata,
}

impl Graviton {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "EC2-006",
                "Non-Graviton instance type",
                Severity::Info,
                Pillar::Sustainability,
            )
            .describe("Graviton instances use less energy for the same workload.")
            .for_types(&["aws_instance"])
            .remediate("Consider an arm64 Graviton family such as t4g, m7g or c7g.")
            .doc("https://aws.amazon.com/ec2/graviton/"),
        }
    }
}

impl Default for Graviton {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Graviton {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        let Some(instance_type) = literal_str(resource, "instance_type") else {
            return Vec::new();
        };
        if is_graviton(instance_family(instance_type)) {
            Vec::new()
        } else {
            vec![self.meta.finding(
                resource,
                format!("instance type `{instance_type}` is not Graviton-based"),
            )]
        }
    }
}

/// `a1`, or a family whose suffix after the generation digit starts with `g`
/// (`t4g`, `m7gd`, `im4gn`).
fn is_graviton(family: &str) -> bool {
    if family == "a1" {
        return true;
    }
    let Some(digit) = family.find(|c: char| c.is_ascii_digit()) else {
        return false;
    };
    family[digit..]
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .starts_with('g')
}
