//! Tagging hygiene across taggable resource types.

use std::sync::Arc;

use crate::model::resource::{Attributes, Resource};
use crate::model::value::ConfigValue;
use crate::rules::catalog::{Pillar, RuleMetadata, Severity};
use crate::rules::eval::{Finding, Rule};

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![Arc::new(MissingTags::new())]
}

pub const TAGGABLE_TYPES: &[&str] = &[
    "aws_instance",
    "aws_ebs_volume",
    "aws_s3_bucket",
    "aws_security_group",
    "aws_db_instance",
    "aws_rds_cluster",
    "aws_eks_cluster",
    "aws_eks_node_group",
    "aws_vpc",
    "aws_subnet",
    "aws_lb",
    "aws_lambda_function",
    "aws_dynamodb_table",
];

/// TAG-001
pub struct MissingTags {
    meta: RuleMetadata,
}

impl MissingTags {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "TAG-001",
                "Resource has no tags",
                Severity::Low,
                Pillar::OperationalExcellence,
            )
            .describe("Tags identify ownership, environment and cost allocation.")
            .for_types(TAGGABLE_TYPES)
            .remediate("Add tags, or set default_tags on the AWS provider.")
            .doc("https://docs.aws.amazon.com/tag-editor/latest/userguide/tagging.html"),
        }
    }
}

impl Default for MissingTags {
    fn default() -> Self {
        Self::new()
    }
}

/// `Some(true)` when tagged, `Some(false)` when missing or empty, `None` when unresolved.
fn tagged(value: Option<&ConfigValue>) -> Option<bool> {
    match value {
        None | Some(ConfigValue::Null) => Some(false),
        Some(ConfigValue::Object(map)) => Some(!map.is_empty()),
        Some(_) => None,
    }
}

impl Rule for MissingTags {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        // Plans carry provider default_tags in tags_all.
        let verdicts = [
            tagged(resource.get_attr("tags_all")),
            tagged(resource.get_attr("tags")),
        ];
        if verdicts.contains(&Some(true)) || verdicts.contains(&None) {
            return Vec::new();
        }
        vec![self.meta.finding(resource, "resource has no tags")]
    }
}
