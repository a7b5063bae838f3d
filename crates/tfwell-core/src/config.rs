//! Run configuration.
//!
//! Read from, in order of precedence:
//! - command-line flags (merged by the CLI through [`Config::merge`])
//! - an explicit `--config <path>` file
//! - `.tfwell.yml` / `.tfwell.yaml` in the scanned directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::catalog::{Pillar, Severity};

/// File names probed by [`discover`].
pub const CONFIG_FILE_NAMES: &[&str] = &[".tfwell.yml", ".tfwell.yaml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Which rules run. Every criterion is optional; an empty config runs everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keep only rules in these pillars.
    pub pillars: Vec<Pillar>,

    /// Keep only rules at or above this severity.
    pub min_severity: Option<Severity>,

    /// Allow-list of rule IDs.
    pub rule_ids: Vec<String>,

    /// Deny-list of rule IDs. Wins over `rule_ids`.
    pub exclude_ids: Vec<String>,
}

impl Config {
    /// True when no filter criterion is set.
    pub fn is_unfiltered(&self) -> bool {
        self.pillars.is_empty()
            && self.min_severity.is_none()
            && self.rule_ids.is_empty()
            && self.exclude_ids.is_empty()
    }

    /// Layer `other` on top of `self`: lists are extended, scalars replaced when set.
    pub fn merge(&mut self, other: Config) {
        extend_unique(&mut self.pillars, other.pillars);
        extend_unique(&mut self.rule_ids, other.rule_ids);
        extend_unique(&mut self.exclude_ids, other.exclude_ids);
        if other.min_severity.is_some() {
            self.min_severity = other.min_severity;
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

fn extend_unique<T: PartialEq>(target: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Load a YAML config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Config::from_yaml(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// First config file present in `dir`, if any.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}
