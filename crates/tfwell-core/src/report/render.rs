use crate::TOOL_NAME;
use crate::report::model::{InputKind, Report};
use crate::rules::catalog::RuleMetadata;

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));

    let kind = match report.input.kind {
        InputKind::Directory => "directory",
        InputKind::Plan => "plan",
    };
    out.push_str(&format!(
        "Input: {} {} ({} resources)\n",
        kind, report.input.path, report.input.resource_count
    ));
    out.push_str(&format!("Classification: {}\n", report.classification.level));

    if report.findings.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    out.push_str(&format!("Findings ({}):\n", report.summary.total));
    for f in &report.findings {
        let location = if f.line > 0 {
            format!("{}:{}", f.file, f.line)
        } else {
            f.file.clone()
        };
        out.push_str(&format!(
            "  - {} [{}] {} {}\n      {}\n      at {}\n",
            f.rule_id, f.severity, f.pillar, f.resource, f.description, location
        ));
        if !f.remediation.is_empty() {
            out.push_str(&format!("      fix: {}\n", f.remediation));
        }
    }
    out
}

/// One line per rule, for `tfwell rules`.
pub fn render_rule_list(rules: &[&RuleMetadata]) -> String {
    let mut out = String::new();
    for meta in rules {
        let types = if meta.resource_types.is_empty() {
            "(cross-resource)".to_string()
        } else {
            meta.resource_types.join(", ")
        };
        out.push_str(&format!(
            "{:<8} {:<8} {:<24} {}  [{}]\n",
            meta.id,
            meta.severity,
            meta.pillar.as_str(),
            meta.name,
            types
        ));
    }
    out
}
