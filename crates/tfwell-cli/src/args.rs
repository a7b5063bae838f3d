use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use tfwell_core::config::Config;
use tfwell_core::rules::catalog::{Pillar, Severity};

#[derive(Debug, Parser)]
#[command(
    name = "tfwell",
    version,
    about = "Well-architected policy checks for Terraform sources and plans"
)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze every .tf file under a directory
    Scan {
        /// Directory holding Terraform sources
        dir: PathBuf,

        #[command(flatten)]
        filters: Filters,

        #[command(flatten)]
        output: Output,
    },

    /// Analyze a plan exported with `terraform show -json`
    Plan {
        /// Path to the plan JSON
        file: PathBuf,

        #[command(flatten)]
        filters: Filters,

        #[command(flatten)]
        output: Output,
    },

    /// List the rules that survive the given filters
    Rules {
        #[command(flatten)]
        filters: Filters,
    },
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct Filters {
    /// YAML run configuration (defaults to .tfwell.yml in the scanned directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep only rules in this pillar (repeatable)
    #[arg(long = "pillar", value_name = "PILLAR")]
    pub pillars: Vec<Pillar>,

    /// Keep only rules at or above this severity
    #[arg(long, value_name = "SEVERITY")]
    pub min_severity: Option<Severity>,

    /// Run only this rule ID (repeatable)
    #[arg(long = "rule", value_name = "ID")]
    pub rule_ids: Vec<String>,

    /// Skip this rule ID (repeatable); wins over --rule
    #[arg(long = "exclude", value_name = "ID")]
    pub exclude_ids: Vec<String>,
}

impl Filters {
    /// Filter settings given on the command line, as a config layer.
    pub fn to_config(&self) -> Config {
        Config {
            pillars: self.pillars.clone(),
            min_severity: self.min_severity,
            rule_ids: self.rule_ids.clone(),
            exclude_ids: self.exclude_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct Output {
    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
