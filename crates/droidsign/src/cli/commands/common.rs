//! Arguments shared by the commands that run Android tools

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use droidsign_core::{Config, ConfigError};
use droidsign_signing::{AlignMode, AndroidTools, FailurePolicy, ProcessRunner, SdkLocation};

/// Android SDK and JDK tool selection
#[derive(Debug, Clone, Default, Args)]
pub struct ToolchainArgs {
    /// Android SDK root [default: $ANDROID_HOME, then $ANDROID_SDK_ROOT]
    #[arg(long, value_name = "DIR")]
    pub sdk_root: Option<PathBuf>,

    /// Android build-tools version
    #[arg(long, env = "BUILD_TOOLS_VERSION", value_name = "VERSION")]
    pub build_tools_version: Option<String>,

    /// How APKs are aligned before signing (realign, copy)
    #[arg(long, value_name = "MODE")]
    pub align_mode: Option<AlignMode>,

    /// Kill any tool that runs longer than this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// jarsigner executable [default: search PATH]
    #[arg(long, value_name = "FILE")]
    pub jarsigner: Option<PathBuf>,
}

impl ToolchainArgs {
    /// Override configuration values with the flags that were given
    pub fn apply(&self, config: &mut Config) {
        if let Some(version) = non_empty(self.build_tools_version.as_deref()) {
            config.build_tools_version = version.to_string();
        }
        if let Some(mode) = self.align_mode {
            config.align_mode = mode.to_string();
        }
        if let Some(timeout) = self.timeout {
            config.tool_timeout_secs = Some(timeout);
        }
    }

    pub fn sdk_location(&self, config: &Config) -> SdkLocation {
        let root = self
            .sdk_root
            .clone()
            .or_else(SdkLocation::sdk_root_from_env);
        SdkLocation::new(root, config.build_tools_version.clone())
    }

    /// Build the real toolchain from validated configuration
    pub fn tools(&self, config: &Config) -> anyhow::Result<AndroidTools<ProcessRunner>> {
        let align_mode = config
            .align_mode
            .parse::<AlignMode>()
            .map_err(|message| invalid("align_mode", message))?;
        let runner =
            ProcessRunner::new().with_timeout(config.tool_timeout_secs.map(Duration::from_secs));

        Ok(AndroidTools::new(runner, self.sdk_location(config))
            .with_align_mode(align_mode)
            .with_jarsigner(self.jarsigner.clone()))
    }
}

/// Failure policy from configuration, unless `--continue-on-error` was given
pub fn failure_policy(config: &Config, continue_on_error: bool) -> anyhow::Result<FailurePolicy> {
    if continue_on_error {
        return Ok(FailurePolicy::Continue);
    }
    Ok(config
        .failure_policy
        .parse::<FailurePolicy>()
        .map_err(|message| invalid("failure_policy", message))?)
}

/// Trimmed value, or `None` when absent or blank
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message,
    }
}
