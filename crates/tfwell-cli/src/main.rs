use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use tfwell_core::checks::builtin_registry;
use tfwell_core::config::{self, Config};
use tfwell_core::engine::Engine;
use tfwell_core::report::model::{Report, ToolInfo};
use tfwell_core::report::render;
use tfwell_core::{scan_dir, scan_plan};

mod args;

use args::{Command, Filters, Output, OutputFormat};

fn main() -> Result<()> {
    let args = args::Args::parse();
    init_logging(args.verbose);

    let tool = ToolInfo {
        name: tfwell_core::TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let (report, output) = match args.command {
        Command::Scan { dir, filters, output } => {
            let config = resolve_config(&filters, &dir)?;
            (scan_dir(&dir, config, tool)?, output)
        }
        Command::Plan { file, filters, output } => {
            let base = file.parent().unwrap_or(Path::new("."));
            let config = resolve_config(&filters, base)?;
            (scan_plan(&file, config, tool)?, output)
        }
        Command::Rules { filters } => {
            let config = resolve_config(&filters, Path::new("."))?;
            let engine = Engine::new(config, &builtin_registry());
            print!("{}", render::render_rule_list(&engine.metadata()));
            return Ok(());
        }
    };

    write_report(&report, &output)?;

    std::process::exit(report.classification.exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Config file (explicit or discovered in `base`) with command-line filters layered on top.
fn resolve_config(filters: &Filters, base: &Path) -> Result<Config> {
    let path = filters.config.clone().or_else(|| config::discover(base));

    let mut config = match path {
        Some(path) => {
            log::info!("using config {}", path.display());
            config::load_config(&path)?
        }
        None => Config::default(),
    };
    config.merge(filters.to_config());
    Ok(config)
}

fn write_report(report: &Report, output: &Output) -> Result<()> {
    let rendered = match output.format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => render::render_text(report),
    };

    match &output.out {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
