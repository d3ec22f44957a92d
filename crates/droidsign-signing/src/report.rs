//! Results of a signing run

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Result, SigningError};
use crate::package::PackageKind;

/// A signed, verified package on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedArtifact {
    /// Package the artifact was produced from
    pub source: PathBuf,

    /// Path of the signed artifact
    pub path: PathBuf,

    /// Package kind
    pub kind: PackageKind,

    /// Size in bytes
    pub size: u64,

    /// SHA256 hash (hex encoded)
    pub sha256: Option<String>,

    /// When signing finished
    pub signed_at: DateTime<Utc>,

    /// Copy placed in the output directory, if one was requested
    pub copied_to: Option<PathBuf>,
}

impl SignedArtifact {
    /// Describe the signed file at `path`, which must exist
    pub fn new(source: impl Into<PathBuf>, path: impl Into<PathBuf>, kind: PackageKind) -> Result<Self> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();

        Ok(Self {
            source: source.into(),
            path,
            kind,
            size,
            sha256: None,
            signed_at: Utc::now(),
            copied_to: None,
        })
    }

    /// Compute and set SHA256 hash
    pub fn with_sha256(mut self) -> Result<Self> {
        let content = std::fs::read(&self.path)?;
        self.sha256 = Some(format!("{:x}", Sha256::digest(&content)));
        Ok(self)
    }

    /// Copy the artifact into `output_dir`, creating it if absent
    pub async fn copy_to(&mut self, output_dir: &Path) -> Result<&Path> {
        tokio::fs::create_dir_all(output_dir).await?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| SigningError::UnsupportedFormat {
                path: self.path.clone(),
            })?;
        let destination = output_dir.join(file_name);

        // Copying a file onto itself truncates it
        if same_file(&self.path, &destination).await {
            debug!(path = %self.path.display(), "artifact already in output directory");
            return Ok(self.copied_to.insert(destination).as_path());
        }
        tokio::fs::copy(&self.path, &destination).await?;

        info!(
            from = %self.path.display(),
            to = %destination.display(),
            "copied signed artifact"
        );
        Ok(self.copied_to.insert(destination).as_path())
    }
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A package or directory that could not be processed
#[derive(Debug, Serialize)]
pub struct EntryFailure {
    /// Package or directory the failure belongs to
    pub target: PathBuf,

    /// What went wrong
    #[serde(serialize_with = "serialize_error")]
    pub error: SigningError,
}

fn serialize_error<S: Serializer>(error: &SigningError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Everything a run produced, in processing order
#[derive(Debug, Default, Serialize)]
pub struct SigningReport {
    /// Signed artifacts
    pub signed: Vec<SignedArtifact>,

    /// Failures, when the run was allowed to continue past them
    pub failures: Vec<EntryFailure>,
}

impl SigningReport {
    /// The last artifact signed, the value single-output consumers see
    pub fn last(&self) -> Option<&SignedArtifact> {
        self.signed.last()
    }

    /// Paths of all signed artifacts
    pub fn signed_paths(&self) -> Vec<&Path> {
        self.signed.iter().map(|a| a.path.as_path()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn the report into the signed artifacts, or the first failure
    pub fn into_result(self) -> Result<Vec<SignedArtifact>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.signed),
        }
    }
}
