//! Artifact persistence
//!
//! The model file is a JSON envelope:
//!
//! ```json
//! {
//!   "format": "iris-random-forest",
//!   "format_version": 1,
//!   "created_at": "2026-01-01T00:00:00Z",
//!   "checksum": "<sha256 hex of the serialized classifier>",
//!   "classifier": { "params": {...}, "trees": [...], "is_trained": true }
//! }
//! ```
//!
//! Loading rejects any other format tag or version, a checksum mismatch, and
//! trees that are structurally unsound.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{IrisClassifier, ModelError};

pub const ARTIFACT_FORMAT: &str = "iris-random-forest";
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactOut<'a> {
    format: &'a str,
    format_version: u32,
    created_at: DateTime<Utc>,
    checksum: String,
    classifier: &'a IrisClassifier,
}

#[derive(Deserialize)]
struct ArtifactIn {
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    checksum: String,
    classifier: IrisClassifier,
}

impl IrisClassifier {
    /// Persist the trained model to `path`, creating parent directories.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if !self.is_trained() {
            return Err(ModelError::Untrained);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let envelope = ArtifactOut {
            format: ARTIFACT_FORMAT,
            format_version: ARTIFACT_VERSION,
            created_at: Utc::now(),
            checksum: checksum(self)?,
            classifier: self,
        };
        let json = serde_json::to_vec(&envelope)?;

        let tmp = temp_path(path);
        fs::write(&tmp, &json)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!("Saved model artifact ({} bytes) to {}", json.len(), path.display());
        Ok(())
    }

    /// Read a model previously written by [`IrisClassifier::save`]
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let data = fs::read(path)?;

        // Check the header before decoding the payload so foreign files fail clearly
        let header: serde_json::Value = serde_json::from_slice(&data)?;
        let format = header.get("format").and_then(|v| v.as_str()).unwrap_or("<none>");
        let version = header.get("format_version").and_then(|v| v.as_u64());
        if format != ARTIFACT_FORMAT || version != Some(u64::from(ARTIFACT_VERSION)) {
            return Err(ModelError::FormatMismatch {
                expected: format!("{} v{}", ARTIFACT_FORMAT, ARTIFACT_VERSION),
                found: match version {
                    Some(v) => format!("{} v{}", format, v),
                    None => format.to_string(),
                },
            });
        }

        let artifact: ArtifactIn = serde_json::from_value(header)?;

        let actual = checksum(&artifact.classifier)?;
        if actual != artifact.checksum {
            return Err(ModelError::ChecksumMismatch {
                expected: artifact.checksum,
                actual,
            });
        }

        artifact.classifier.validate()?;

        if let Some(created_at) = artifact.created_at {
            tracing::debug!("Loaded artifact created at {}", created_at.to_rfc3339());
        }
        Ok(artifact.classifier)
    }
}

fn checksum(classifier: &IrisClassifier) -> Result<String, ModelError> {
    let payload = serde_json::to_vec(classifier)?;
    Ok(hex::encode(Sha256::digest(&payload)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
