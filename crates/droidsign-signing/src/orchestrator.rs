//! Signing orchestration
//!
//! Each package moves through a fixed sequence of stages:
//!
//! ```text
//! Located -> Aligned (APK only) -> Signed -> Verified -> [Relocated]
//! ```
//!
//! Directories are processed one after another and packages within a
//! directory one at a time; every tool invocation finishes before the next
//! stage starts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::credentials::SigningCredentials;
use crate::error::{Result, SigningError};
use crate::locator::locate;
use crate::package::{PackageEntry, PackageKind};
use crate::report::{EntryFailure, SignedArtifact, SigningReport};
use crate::tools::{PackageTools, SignTarget};

/// What a run does when a package cannot be signed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failure
    #[default]
    FailFast,
    /// Record the failure and move on to the next package
    Continue,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => write!(f, "fail-fast"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fail-fast" => Ok(Self::FailFast),
            "continue" => Ok(Self::Continue),
            _ => Err(format!(
                "unknown failure policy '{s}' (expected fail-fast or continue)"
            )),
        }
    }
}

/// Inputs of a multi-directory run
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Candidate directories, processed in order
    pub directories: Vec<PathBuf>,
    /// Credentials used for every package
    pub credentials: SigningCredentials,
    /// Directory receiving a copy of each signed artifact
    pub output: Option<PathBuf>,
    /// Behaviour on per-package failure
    pub failure_policy: FailurePolicy,
}

impl RunPlan {
    pub fn new(directories: Vec<PathBuf>, credentials: SigningCredentials) -> Self {
        Self {
            directories,
            credentials,
            output: None,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

/// Drives packages through the signing stages using injected tools
pub struct Orchestrator<T> {
    tools: T,
}

impl<T: PackageTools> Orchestrator<T> {
    pub fn new(tools: T) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    /// Sign one located package and return the verified artifact
    pub async fn sign(
        &self,
        entry: &PackageEntry,
        credentials: &SigningCredentials,
    ) -> Result<SignedArtifact> {
        info!(path = %entry.path().display(), kind = %entry.kind(), "signing release");
        self.tools.resolve(entry.kind()).await?;

        let signed = match entry.kind() {
            PackageKind::Apk => self.sign_apk(entry, credentials).await?,
            PackageKind::Aab => self.sign_aab(entry, credentials).await?,
        };

        let artifact = SignedArtifact::new(entry.path(), &signed, entry.kind())?.with_sha256()?;
        info!(path = %artifact.path.display(), "release signed");
        Ok(artifact)
    }

    /// Sign a single file given by path
    pub async fn sign_path(
        &self,
        path: &Path,
        credentials: &SigningCredentials,
    ) -> Result<SignedArtifact> {
        let entry = PackageEntry::from_path(path)?;
        self.sign(&entry, credentials).await
    }

    async fn sign_apk(
        &self,
        entry: &PackageEntry,
        credentials: &SigningCredentials,
    ) -> Result<PathBuf> {
        let aligned = entry.aligned_path();
        self.tools.align(entry.path(), &aligned).await?;
        debug!(path = %aligned.display(), "aligned");

        let signed = entry.signed_path();
        self.tools
            .sign(
                SignTarget::Apk {
                    input: &aligned,
                    output: &signed,
                },
                credentials,
            )
            .await?;
        if !signed.is_file() {
            return Err(SigningError::SigningFailed {
                path: entry.path().to_path_buf(),
                reason: format!("signer did not produce {}", signed.display()),
            });
        }
        debug!(path = %signed.display(), "signed");

        self.tools.verify(PackageKind::Apk, &signed).await?;
        debug!(path = %signed.display(), "verified");
        Ok(signed)
    }

    async fn sign_aab(
        &self,
        entry: &PackageEntry,
        credentials: &SigningCredentials,
    ) -> Result<PathBuf> {
        let bundle = entry.path();
        self.tools
            .sign(SignTarget::Aab { bundle }, credentials)
            .await?;
        debug!(path = %bundle.display(), "signed in place");

        self.tools.verify(PackageKind::Aab, bundle).await?;
        debug!(path = %bundle.display(), "verified");

        let signed = entry.signed_path();
        tokio::fs::rename(bundle, &signed).await?;
        debug!(from = %bundle.display(), to = %signed.display(), "renamed");
        Ok(signed)
    }

    /// Sign everything found in the plan's directories.
    ///
    /// Missing or invalid directories always abort the run. A directory
    /// without packages (`NoArtifact`) and per-package failures follow the
    /// plan's [`FailurePolicy`]. The report is returned either way so
    /// artifacts signed before an abort are still visible; the abort reason
    /// is its last failure.
    pub async fn run(&self, plan: &RunPlan) -> SigningReport {
        let mut report = SigningReport::default();

        for dir in &plan.directories {
            let entries = match locate(dir) {
                Ok(entries) => entries,
                Err(error) => {
                    report.failures.push(EntryFailure {
                        target: dir.clone(),
                        error,
                    });
                    return report;
                }
            };

            if entries.is_empty() {
                let error = SigningError::NoArtifact(dir.clone());
                if !Self::record(&mut report, plan.failure_policy, dir, error) {
                    return report;
                }
                continue;
            }

            for entry in &entries {
                match self.sign_and_relocate(entry, plan).await {
                    Ok(artifact) => report.signed.push(artifact),
                    Err(error) => {
                        if !Self::record(&mut report, plan.failure_policy, entry.path(), error) {
                            return report;
                        }
                    }
                }
            }
        }

        report
    }

    /// Copy a signed artifact into `output_dir`, creating it if absent
    pub async fn relocate(&self, artifact: &mut SignedArtifact, output_dir: &Path) -> Result<PathBuf> {
        let copied = artifact.copy_to(output_dir).await?;
        Ok(copied.to_path_buf())
    }

    async fn sign_and_relocate(&self, entry: &PackageEntry, plan: &RunPlan) -> Result<SignedArtifact> {
        let mut artifact = self.sign(entry, &plan.credentials).await?;
        if let Some(output) = &plan.output {
            self.relocate(&mut artifact, output).await?;
        }
        Ok(artifact)
    }

    /// Record a failure; returns whether the run may continue
    fn record(
        report: &mut SigningReport,
        policy: FailurePolicy,
        target: &Path,
        error: SigningError,
    ) -> bool {
        let keep_going = policy == FailurePolicy::Continue;
        if keep_going {
            warn!(target = %target.display(), %error, "continuing after failure");
        }
        report.failures.push(EntryFailure {
            target: target.to_path_buf(),
            error,
        });
        keep_going
    }
}
