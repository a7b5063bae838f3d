use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tfwell_core::checks::builtin_registry;
use tfwell_core::config::Config;
use tfwell_core::engine::Engine;
use tfwell_core::extract::{parse_dir, parse_plan_file, parse_source};
use tfwell_core::model::resource::Resource;
use tfwell_core::model::value::ConfigValue;
use tfwell_core::report::model::{ClassificationLevel, InputKind, Report, ToolInfo};
use tfwell_core::rules::catalog::{Pillar, Severity};

/// Path to the fixtures directory relative to the crate root.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: "tfwell".into(),
        version: "0.1.0-test".into(),
    }
}

fn scan_fixture(name: &str, config: Config) -> Report {
    tfwell_core::scan_dir(&fixtures_dir().join(name), config, tool()).expect("scan should succeed")
}

/// Rule IDs in report order.
fn rule_ids(report: &Report) -> Vec<&str> {
    report.findings.iter().map(|f| f.rule_id.as_str()).collect()
}

#[test]
fn source_file_yields_literal_attributes() {
    let src = r#"
resource "aws_s3_bucket" "b" {
  bucket = "x"
  tags = { Environment = "prod" }
}
"#;
    let resources = parse_source(src, std::path::Path::new("main.tf")).expect("parse");

    assert_eq!(resources.len(), 1);
    let b = &resources[0];
    assert_eq!(b.attributes["bucket"], ConfigValue::from("x"));
    assert_eq!(
        b.attributes["tags"],
        ConfigValue::Object([("Environment".to_string(), ConfigValue::from("prod"))].into())
    );
    assert_eq!(b.line, 2);
}

#[test]
fn insecure_directory_is_high_risk() {
    let report = scan_fixture("insecure", Config::default());

    // Resource-major: compute.tf sorts before storage.tf.
    assert_eq!(
        rule_ids(&report),
        vec!["EC2-004", "EC2-006", "EC2-001", "S3-001", "S3-002", "EC2-002", "EC2-005"]
    );
    assert_eq!(report.input.kind, InputKind::Directory);
    assert_eq!(report.input.resource_count, 5);
    assert_eq!(report.classification.level, ClassificationLevel::HighRisk);
    assert_eq!(report.classification.exit_code, 2);
    assert_eq!(report.classification.highest_severity, Some(Severity::Critical));
}

#[test]
fn terraform_cache_directory_is_skipped() {
    let resources = parse_dir(&fixtures_dir().join("insecure")).expect("parse");
    assert!(resources.iter().all(|r| r.resource_type != "aws_db_instance"));
}

#[test]
fn findings_carry_source_locations() {
    let report = scan_fixture("insecure", Config::default());

    let acl = report
        .findings
        .iter()
        .find(|f| f.rule_id == "S3-001")
        .expect("S3-001 finding");
    assert_eq!(acl.resource, "aws_s3_bucket.site");
    assert!(acl.file.ends_with("storage.tf"), "{}", acl.file);
    assert_eq!(acl.line, 1);

    let ingress = report
        .findings
        .iter()
        .find(|f| f.rule_id == "EC2-001")
        .expect("EC2-001 finding");
    assert!(ingress.file.ends_with("compute.tf"), "{}", ingress.file);
    assert_eq!(ingress.line, 19);
    assert_eq!(ingress.description, "ingress on port 22 allowed from 0.0.0.0/0");
}

#[test]
fn secure_directory_is_safe() {
    let report = scan_fixture("secure", Config::default());

    assert!(report.findings.is_empty(), "{:?}", rule_ids(&report));
    assert_eq!(report.classification.level, ClassificationLevel::Safe);
    assert_eq!(report.classification.exit_code, 0);
}

#[test]
fn filters_narrow_the_report() {
    let config = Config {
        pillars: vec![Pillar::Security],
        min_severity: Some(Severity::High),
        exclude_ids: vec!["S3-001".into()],
        ..Default::default()
    };
    let report = scan_fixture("insecure", config);

    assert_eq!(rule_ids(&report), vec!["EC2-001", "S3-002", "EC2-002"]);
}

#[test]
fn low_only_findings_stay_safe() {
    let config = Config {
        rule_ids: vec!["EC2-004".into(), "EC2-005".into()],
        ..Default::default()
    };
    let report = scan_fixture("insecure", config);

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.classification.level, ClassificationLevel::Safe);
    assert_eq!(report.classification.triggered_rule_ids, vec!["EC2-004", "EC2-005"]);
}

#[test]
fn plan_prunes_destroys_and_walks_child_modules() {
    let resources = parse_plan_file(&fixtures_dir().join("plan.json")).expect("parse plan");

    let addresses: Vec<String> = resources.iter().map(Resource::address).collect();
    assert_eq!(
        addresses,
        vec!["aws_db_instance.main", "module.network.aws_security_group.ssh"]
    );
}

#[test]
fn plan_scan_reports_fingerprint_and_findings() {
    let report = tfwell_core::scan_plan(&fixtures_dir().join("plan.json"), Config::default(), tool())
        .expect("scan plan");

    assert_eq!(report.input.kind, InputKind::Plan);
    assert_eq!(report.input.resource_count, 2);
    let hash = report.input.hash.as_ref().expect("plan hash");
    assert_eq!(hash.algorithm, "sha256");
    assert_eq!(hash.value.len(), 64);

    assert_eq!(rule_ids(&report), vec!["RDS-001", "EC2-001"]);
    assert_eq!(report.findings[1].resource, "module.network.aws_security_group.ssh");
    assert_eq!(report.findings[1].file, "<plan>");
    assert_eq!(report.findings[1].line, 0);
    assert_eq!(report.classification.level, ClassificationLevel::HighRisk);
}

#[test]
fn exclude_wins_over_allow_list() {
    let config = Config {
        rule_ids: vec!["S3-001".into(), "S3-002".into()],
        exclude_ids: vec!["S3-001".into()],
        ..Default::default()
    };
    let engine = Engine::new(config, &builtin_registry());

    let ids: Vec<&str> = engine.rules().iter().map(|r| r.metadata().id.as_str()).collect();
    assert_eq!(ids, vec!["S3-002"]);
    assert!(engine.cross_rules().is_empty());
}

#[test]
fn lone_cluster_gets_one_cross_resource_finding() {
    let report = scan_fixture("eks_only", Config::default());

    assert_eq!(rule_ids(&report), vec!["EKS-100"]);
    assert_eq!(report.findings[0].resource, "aws_eks_cluster.main");
    assert_eq!(report.classification.exit_code, 2);
}

#[test]
fn node_group_in_sibling_file_satisfies_cluster() {
    let dir = TempDir::new().expect("tempdir");
    fs::copy(
        fixtures_dir().join("eks_only").join("main.tf"),
        dir.path().join("cluster.tf"),
    )
    .expect("copy fixture");
    fs::write(
        dir.path().join("nodes.tf"),
        r#"
resource "aws_eks_node_group" "workers" {
  cluster_name  = aws_eks_cluster.main.name
  node_role_arn = var.node_role_arn
  subnet_ids    = var.subnet_ids
  tags = {
    Owner = "platform"
  }
}
"#,
    )
    .expect("write nodes.tf");

    let report = tfwell_core::scan_dir(dir.path(), Config::default(), tool()).expect("scan");
    assert!(report.findings.is_empty(), "{:?}", rule_ids(&report));
}

#[test]
fn syntax_error_names_the_file() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("broken.tf"), "resource \"aws_s3_bucket\" \"b\" {\n").expect("write");

    let err = tfwell_core::scan_dir(dir.path(), Config::default(), tool()).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("broken.tf"), "{chain}");
}

#[cfg(unix)]
#[test]
fn symlinked_source_file_is_scanned() {
    let dir = TempDir::new().expect("tempdir");
    std::os::unix::fs::symlink(
        fixtures_dir().join("insecure").join("storage.tf"),
        dir.path().join("storage.tf"),
    )
    .expect("symlink");

    let report = tfwell_core::scan_dir(dir.path(), Config::default(), tool()).expect("scan");
    assert!(rule_ids(&report).contains(&"S3-001"), "{:?}", rule_ids(&report));
}
