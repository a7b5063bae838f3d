use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::{fs, path::Path};

use crate::report::model::{ArtifactHash, InputInfo, InputKind};

/// Plan artifact read from disk, with a stable content fingerprint.
#[derive(Debug, Clone)]
pub struct PlanArtifact {
    pub path: String,

    /// Exact bytes read from disk.
    pub bytes: Vec<u8>,

    pub size_bytes: u64,

    pub hash_alg: String,

    /// Hex-encoded digest of `bytes`.
    pub hash_hex: String,
}

impl PlanArtifact {
    /// Report-facing input description; drops the raw bytes.
    pub fn into_input(self, resource_count: usize) -> InputInfo {
        InputInfo {
            kind: InputKind::Plan,
            path: self.path,
            resource_count,
            size_bytes: Some(self.size_bytes),
            hash: Some(ArtifactHash {
                algorithm: self.hash_alg,
                value: self.hash_hex,
            }),
        }
    }
}

/// Read a plan JSON artifact and fingerprint it.
///
/// The fingerprint depends only on file bytes, never on filesystem metadata.
pub fn read_plan_artifact(path: &Path) -> Result<PlanArtifact> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read plan: {}", path.display()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();

    Ok(PlanArtifact {
        path: path.display().to_string(),
        size_bytes: bytes.len() as u64,
        bytes,
        hash_alg: "sha256".to_string(),
        hash_hex: hex::encode(digest),
    })
}
