//! External process execution

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SigningError};

/// Arguments whose following value is a secret
const SECRET_FLAGS: [&str; 4] = ["--ks-pass", "--key-pass", "-storepass", "-keypass"];

/// A single external tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Executable to run
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Short tool name, e.g. `apksigner`
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

/// Renders the command line with password values masked
impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                let masked = if arg.starts_with("pass:") { "pass:****" } else { "****" };
                write!(f, " {}", masked)?;
            } else {
                write!(f, " {}", arg)?;
            }
            mask_next = SECRET_FLAGS.contains(&arg.as_str());
        }
        Ok(())
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Output of a tool that exited with `code` and printed nothing
    pub fn exited(code: i32) -> Self {
        Self {
            status: Some(code),
            ..Default::default()
        }
    }

    /// Whether the tool exited with status zero
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Human-readable failure description: exit status plus whichever
    /// stream carries the diagnostics.
    pub fn failure_reason(&self) -> String {
        let status = match self.status {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if detail.is_empty() {
            status
        } else {
            format!("{status}: {detail}")
        }
    }
}

/// Something that can run an external tool to completion
#[async_trait::async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the invocation and wait for it to exit. A non-zero exit is not
    /// an error at this level; callers inspect [`ToolOutput::success`].
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;
}

/// Runs tools as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any invocation that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "running tool");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| SigningError::ToolTimeout {
                    tool: invocation.tool_name(),
                    seconds: limit.as_secs(),
                })?,
            None => command.output().await,
        };

        let output = output.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => SigningError::ToolchainMissing {
                tool: invocation.tool_name(),
                hint: format!("Could not execute {} ({e})", invocation.program.display()),
            },
            _ => SigningError::Io(e),
        })?;

        let result = ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(
            tool = %invocation.tool_name(),
            status = ?result.status,
            stdout = %result.stdout.trim(),
            "tool finished"
        );
        Ok(result)
    }
}
