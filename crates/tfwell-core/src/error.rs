use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the extractors.
///
/// Unresolvable attribute expressions and destroy-only or null plan entries are
/// not errors; they are handled inside the extractors.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("walking {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Hcl {
        path: PathBuf,
        source: hcl_edit::parser::Error,
    },

    #[error("parsing plan JSON: {0}")]
    PlanJson(#[from] serde_json::Error),

    #[error("unexpected structure in {context}: {message}")]
    Structure { context: String, message: String },
}

pub type ExtractResult<T> = Result<T, ExtractError>;
