pub mod checks;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod report;
pub mod rules;

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::engine::Engine;
use crate::extract::read::read_plan_artifact;
use crate::model::resource::Resource;
use crate::report::model::{InputInfo, Report, ToolInfo};
use crate::rules::classify::classify;
use crate::rules::registry::Registry;

pub const TOOL_NAME: &str = "tfwell";

/// JSON schema version of tfwell reports.
/// This must be bumped only when the report shape changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

pub const RULE_CATALOG_VERSION: &str = "0.1.0";

/// Analyze every `.tf` file under `dir` with the built-in rules.
pub fn scan_dir(dir: &Path, config: Config, tool: ToolInfo) -> Result<Report> {
    let resources = extract::parse_dir(dir)
        .with_context(|| format!("failed to extract resources from {}", dir.display()))?;

    let input = InputInfo::directory(dir.display().to_string(), resources.len());
    Ok(analyze(&resources, config, &checks::builtin_registry(), tool, input))
}

/// Analyze a `terraform show -json` plan file with the built-in rules.
pub fn scan_plan(path: &Path, config: Config, tool: ToolInfo) -> Result<Report> {
    let artifact = read_plan_artifact(path)?;
    let resources = extract::parse_plan(&artifact.bytes)
        .with_context(|| format!("failed to extract resources from {}", artifact.path))?;

    let input = artifact.into_input(resources.len());
    Ok(analyze(&resources, config, &checks::builtin_registry(), tool, input))
}

/// Engine → classification → report, for already extracted resources.
pub fn analyze(
    resources: &[Resource],
    config: Config,
    registry: &Registry,
    tool: ToolInfo,
    input: InputInfo,
) -> Report {
    let engine = Engine::new(config, registry);
    let findings = engine.analyze(resources);
    let classification = classify(&findings);

    Report::new(tool, input, findings, classification)
}
