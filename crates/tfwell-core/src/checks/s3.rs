//! S3 bucket checks.

use std::sync::Arc;

use crate::checks::{bool_setting, literal_str};
use crate::model::resource::{Attributes, Resource};
use crate::rules::catalog::{Pillar, RuleMetadata, Severity};
use crate::rules::eval::{Finding, Rule};

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(PublicAcl::new()),
        Arc::new(PublicAccessBlock::new()),
        Arc::new(Versioning::new()),
    ]
}

const PUBLIC_ACLS: &[&str] = &["public-read", "public-read-write"];

/// S3-001: canned ACL that opens the bucket beyond the account.
pub struct PublicAcl {
    meta: RuleMetadata,
}

impl PublicAcl {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "S3-001",
                "S3 bucket public ACL",
                Severity::Critical,
                Pillar::Security,
            )
            .describe("S3 buckets must not use a canned ACL that grants public access.")
            .for_types(&["aws_s3_bucket", "aws_s3_bucket_acl"])
            .remediate("Use the `private` ACL and grant access through bucket policies scoped to known principals.")
            .doc("https://docs.aws.amazon.com/AmazonS3/latest/userguide/acl-overview.html#canned-acl"),
        }
    }
}

impl Default for PublicAcl {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PublicAcl {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        match literal_str(resource, "acl") {
            Some(acl) if PUBLIC_ACLS.contains(&acl) => {
                let description = format!("bucket ACL `{acl}` grants public access");
                vec![self.meta.finding(resource, description)]
            }
            _ => Vec::new(),
        }
    }
}

const ACCESS_BLOCK_FLAGS: &[&str] = &[
    "block_public_acls",
    "block_public_policy",
    "ignore_public_acls",
    "restrict_public_buckets",
];

/// S3-002: public access block with a flag left off.
pub struct PublicAccessBlock {
    meta: RuleMetadata,
}

impl PublicAccessBlock {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "S3-002",
                "S3 public access block incomplete",
                Severity::High,
                Pillar::Security,
            )
            .describe("All four S3 public access block settings should be enabled.")
            .for_types(&["aws_s3_bucket_public_access_block"])
            .remediate("Set block_public_acls, block_public_policy, ignore_public_acls and restrict_public_buckets to true.")
            .doc("https://docs.aws.amazon.com/AmazonS3/latest/userguide/access-control-block-public-access.html"),
        }
    }
}

impl Default for PublicAccessBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PublicAccessBlock {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        // Every flag defaults to false in the provider.
        let disabled: Vec<&str> = ACCESS_BLOCK_FLAGS
            .iter()
            .copied()
            .filter(|flag| bool_setting(resource, flag, false) == Some(false))
            .collect();

        if disabled.is_empty() {
            return Vec::new();
        }

        vec![self.meta.finding(
            resource,
            format!("public access block leaves {} disabled", disabled.join(", ")),
        )]
    }
}

/// S3-003: bucket versioning not enabled.
pub struct Versioning {
    meta: RuleMetadata,
}

impl Versioning {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "S3-003",
                "S3 versioning disabled",
                Severity::Medium,
                Pillar::Reliability,
            )
            .describe("Bucket versioning protects objects against accidental overwrite and deletion.")
            .for_types(&["aws_s3_bucket_versioning"])
            .remediate("Set versioning_configuration.status = \"Enabled\".")
            .doc("https://docs.aws.amazon.com/AmazonS3/latest/userguide/Versioning.html"),
        }
    }
}

impl Default for Versioning {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Versioning {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        let Some(config) = resource.get_blocks("versioning_configuration").first() else {
            return Vec::new();
        };

        match literal_str(config, "status") {
            Some(status) if status != "Enabled" => vec![self
                .meta
                .finding(resource, format!("versioning status is `{status}`"))],
            _ => Vec::new(),
        }
    }
}
