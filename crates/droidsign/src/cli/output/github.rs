//! GitHub Actions bindings
//!
//! Signed paths are appended to the files named by `GITHUB_ENV` and
//! `GITHUB_OUTPUT` using the runner's `key=value` syntax, or the heredoc
//! form for multiline values.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment variable exported for later steps
pub const SIGNED_RELEASE_FILE_ENV: &str = "SIGNED_RELEASE_FILE";

/// Step output holding the last signed artifact
pub const SIGNED_RELEASE_FILE_OUTPUT: &str = "signedReleaseFile";

/// Step output holding every signed artifact, one per line
pub const SIGNED_RELEASE_FILES_OUTPUT: &str = "signedReleaseFiles";

/// Where the runner collects exported variables and step outputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GithubBindings {
    env_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl GithubBindings {
    pub fn new(env_file: Option<PathBuf>, output_file: Option<PathBuf>) -> Self {
        Self {
            env_file,
            output_file,
        }
    }

    /// Read `GITHUB_ENV` and `GITHUB_OUTPUT`; unset or empty means disabled
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };
        Self::new(file("GITHUB_ENV"), file("GITHUB_OUTPUT"))
    }

    /// Publish signed artifacts, in signing order. The single-value
    /// bindings receive the last one. Nothing is written for an empty list.
    pub fn export(&self, signed: &[&Path]) -> io::Result<()> {
        let Some(last) = signed.last() else {
            return Ok(());
        };
        let last = last.display().to_string();
        let all = signed
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        if let Some(env_file) = &self.env_file {
            debug!(path = %env_file.display(), "exporting {}", SIGNED_RELEASE_FILE_ENV);
            append(env_file, &[(SIGNED_RELEASE_FILE_ENV, &last)])?;
        }
        if let Some(output_file) = &self.output_file {
            debug!(path = %output_file.display(), "setting step outputs");
            append(
                output_file,
                &[
                    (SIGNED_RELEASE_FILE_OUTPUT, &last),
                    (SIGNED_RELEASE_FILES_OUTPUT, &all),
                ],
            )?;
        }
        Ok(())
    }
}

/// Emit an error annotation when running inside GitHub Actions
pub fn annotate_error(message: &str) {
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::error::{}", message.replace('\n', "%0A"));
    }
}

fn append(path: &Path, pairs: &[(&str, &str)]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (key, value) in pairs {
        write_pair(&mut file, key, value)?;
    }
    Ok(())
}

fn write_pair<W: Write>(out: &mut W, key: &str, value: &str) -> io::Result<()> {
    if value.contains('\n') {
        let mut delimiter = String::from("EOF");
        while value.contains(delimiter.as_str()) {
            delimiter.push('_');
        }
        writeln!(out, "{key}<<{delimiter}")?;
        writeln!(out, "{value}")?;
        writeln!(out, "{delimiter}")
    } else {
        writeln!(out, "{key}={value}")
    }
}
