//! Test doubles for the tool seams

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::credentials::SigningCredentials;
use crate::error::{Result, SigningError};
use crate::package::PackageKind;
use crate::runner::{ToolInvocation, ToolOutput, ToolRunner};
use crate::tools::{PackageTools, SignTarget};

/// Records every invocation and fakes the files real tools would write.
///
/// Invocations are keyed by `"<tool> <first arg>"`, e.g. `"apksigner sign"`
/// or `"zipalign -c"`; [`RecordingRunner::fail`] makes a key exit non-zero.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    failures: Mutex<HashMap<String, i32>>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(&self, key: &str, code: i32) {
        self.failures.lock().unwrap().insert(key.to_string(), code);
    }

    pub(crate) fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    fn key(invocation: &ToolInvocation) -> String {
        let first = invocation.args.first().map(String::as_str).unwrap_or("");
        format!("{} {}", invocation.tool_name(), first)
    }
}

#[async_trait::async_trait]
impl ToolRunner for RecordingRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        let key = Self::key(invocation);
        if let Some(code) = self.failures.lock().unwrap().get(&key) {
            return Ok(ToolOutput::exited(*code));
        }

        match key.as_str() {
            "apksigner sign" => {
                let out = invocation
                    .args
                    .iter()
                    .position(|a| a == "--out")
                    .and_then(|i| invocation.args.get(i + 1));
                if let Some(out) = out {
                    std::fs::write(out, b"signed apk")?;
                }
            }
            "zipalign -f" => {
                let n = invocation.args.len();
                std::fs::copy(&invocation.args[n - 2], &invocation.args[n - 1])?;
            }
            _ => {}
        }

        Ok(ToolOutput::exited(0))
    }
}

/// In-memory [`PackageTools`] that logs calls and touches the expected files
#[derive(Default)]
pub(crate) struct FakeTools {
    log: Mutex<Vec<String>>,
    fail_signing: Mutex<Vec<String>>,
    missing_toolchain: bool,
    silent_signer: bool,
}

impl FakeTools {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn without_toolchain() -> Self {
        Self {
            missing_toolchain: true,
            ..Self::default()
        }
    }

    /// Signer that reports success without writing its output file
    pub(crate) fn silent_signer() -> Self {
        Self {
            silent_signer: true,
            ..Self::default()
        }
    }

    /// Make signing fail for packages whose file name contains `needle`
    pub(crate) fn fail_signing(&self, needle: &str) {
        self.fail_signing.lock().unwrap().push(needle.to_string());
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn should_fail(&self, path: &Path) -> bool {
        let file = name(path);
        self.fail_signing
            .lock()
            .unwrap()
            .iter()
            .any(|needle| file.contains(needle.as_str()))
    }
}

fn name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl PackageTools for FakeTools {
    async fn resolve(&self, kind: PackageKind) -> Result<()> {
        self.record(format!("resolve {}", kind.extension()));
        if self.missing_toolchain {
            return Err(SigningError::ToolchainMissing {
                tool: "fake".to_string(),
                hint: String::new(),
            });
        }
        Ok(())
    }

    async fn align(&self, apk: &Path, aligned: &Path) -> Result<()> {
        self.record(format!("align {} {}", name(apk), name(aligned)));
        std::fs::copy(apk, aligned)?;
        Ok(())
    }

    async fn sign(&self, target: SignTarget<'_>, _credentials: &SigningCredentials) -> Result<()> {
        let package: PathBuf = match target {
            SignTarget::Apk { input, output } => {
                self.record(format!("sign {} {}", name(input), name(output)));
                if !self.silent_signer && !self.should_fail(input) {
                    std::fs::write(output, b"signed")?;
                }
                input.to_path_buf()
            }
            SignTarget::Aab { bundle } => {
                self.record(format!("sign {}", name(bundle)));
                bundle.to_path_buf()
            }
        };

        if self.should_fail(&package) {
            return Err(SigningError::SigningFailed {
                path: package,
                reason: "exit code 1".to_string(),
            });
        }
        Ok(())
    }

    async fn verify(&self, _kind: PackageKind, path: &Path) -> Result<()> {
        self.record(format!("verify {}", name(path)));
        Ok(())
    }
}
