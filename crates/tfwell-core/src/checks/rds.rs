//! RDS instance and cluster checks.

use std::sync::Arc;

use crate::checks::bool_setting;
use crate::model::resource::{Attributes, Resource};
use crate::rules::catalog::{Pillar, RuleMetadata, Severity};
use crate::rules::eval::{Finding, Rule};

pub fn rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(StorageEncryption::new()),
        Arc::new(BackupRetention::new()),
        Arc::new(MultiAz::new()),
        Arc::new(PubliclyAccessible::new()),
    ]
}

/// Days of automated backups below which a database is flagged.
pub const MIN_BACKUP_RETENTION_DAYS: f64 = 7.0;

/// RDS-001
pub struct StorageEncryption {
    meta: RuleMetadata,
}

impl StorageEncryption {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "RDS-001",
                "RDS storage not encrypted",
                Severity::High,
                Pillar::Security,
            )
            .describe("Database storage, snapshots and backups should be encrypted at rest.")
            .for_types(&["aws_db_instance", "aws_rds_cluster"])
            .remediate("Set storage_encrypted = true. Existing databases need a snapshot restore to enable it.")
            .doc("https://docs.aws.amazon.com/AmazonRDS/latest/UserGuide/Overview.Encryption.html"),
        }
    }
}

impl Default for StorageEncryption {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for StorageEncryption {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        if bool_setting(resource, "storage_encrypted", false) == Some(false) {
            vec![self.meta.finding(resource, "storage_encrypted is not enabled")]
        } else {
            Vec::new()
        }
    }
}

/// RDS-002
pub struct BackupRetention {
    meta: RuleMetadata,
}

impl BackupRetention {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "RDS-002",
                "Short RDS backup retention",
                Severity::Medium,
                Pillar::Reliability,
            )
            .describe("Automated backups should be kept for at least 7 days.")
            .for_types(&["aws_db_instance", "aws_rds_cluster"])
            .remediate("Set backup_retention_period to 7 or more.")
            .doc("https://docs.aws.amazon.com/AmazonRDS/latest/UserGuide/USER_WorkingWithAutomatedBackups.html"),
        }
    }
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for BackupRetention {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        // Only an explicitly configured value is judged.
        match resource.get_number_attr("backup_retention_period") {
            Some(days) if days < MIN_BACKUP_RETENTION_DAYS => vec![self.meta.finding(
                resource,
                format!("backup_retention_period is {days} days"),
            )],
            _ => Vec::new(),
        }
    }
}

/// RDS-003
pub struct MultiAz {
    meta: RuleMetadata,
}

impl MultiAz {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "RDS-003",
                "RDS instance not Multi-AZ",
                Severity::Medium,
                Pillar::Reliability,
            )
            .describe("Multi-AZ deployments keep a synchronous standby in another availability zone.")
            .for_types(&["aws_db_instance"])
            .remediate("Set multi_az = true.")
            .doc("https://docs.aws.amazon.com/AmazonRDS/latest/UserGuide/Concepts.MultiAZ.html"),
        }
    }
}

impl Default for MultiAz {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for MultiAz {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        // Read replicas inherit availability from their source.
        if resource
            .get_attr("replicate_source_db")
            .is_some_and(|v| !v.is_null())
        {
            return Vec::new();
        }

        if bool_setting(resource, "multi_az", false) == Some(false) {
            vec![self.meta.finding(resource, "multi_az is not enabled")]
        } else {
            Vec::new()
        }
    }
}

/// RDS-004
pub struct PubliclyAccessible {
    meta: RuleMetadata,
}

impl PubliclyAccessible {
    pub fn new() -> Self {
        Self {
            meta: RuleMetadata::new(
                "RDS-004",
                "RDS instance publicly accessible",
                Severity::Critical,
                Pillar::Security,
            )
            .describe("Databases should not be reachable from the internet.")
            .for_types(&["aws_db_instance"])
            .remediate("Set publicly_accessible = false and reach the database through private subnets.")
            .doc("https://docs.aws.amazon.com/AmazonRDS/latest/UserGuide/USER_VPC.WorkingWithRDSInstanceinaVPC.html"),
        }
    }
}

impl Default for PubliclyAccessible {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PubliclyAccessible {
    fn metadata(&self) -> &RuleMetadata {
        &self.meta
    }

    fn evaluate(&self, resource: &Resource) -> Vec<Finding> {
        if bool_setting(resource, "publicly_accessible", false) == Some(true) {
            vec![self.meta.finding(resource, "publicly_accessible is true")]
        } else {
            Vec::new()
        }
    }
}
