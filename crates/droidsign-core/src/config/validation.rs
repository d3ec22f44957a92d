//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Accepted values for `align_mode`
pub const ALIGN_MODES: [&str; 2] = ["realign", "copy"];

/// Accepted values for `failure_policy`
pub const FAILURE_POLICIES: [&str; 2] = ["fail-fast", "continue"];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_paths(config)?;
    validate_toolchain(config)?;
    validate_policies(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_paths(config: &Config) -> Result<()> {
    if config.build_directory.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "build_directory".to_string(),
            message: "build directory cannot be empty".to_string(),
        }
        .into());
    }

    if config
        .release_directories
        .iter()
        .any(|dir| dir.as_os_str().is_empty())
    {
        return Err(ConfigError::InvalidValue {
            field: "release_directories".to_string(),
            message: "entries cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_toolchain(config: &Config) -> Result<()> {
    if config.build_tools_version.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "build_tools_version".to_string(),
            message: "version cannot be empty".to_string(),
        }
        .into());
    }

    if config.tool_timeout_secs == Some(0) {
        return Err(ConfigError::InvalidValue {
            field: "tool_timeout_secs".to_string(),
            message: "timeout must be at least one second".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_policies(config: &Config) -> Result<()> {
    if !ALIGN_MODES.contains(&config.align_mode.as_str()) {
        return Err(ConfigError::InvalidValue {
            field: "align_mode".to_string(),
            message: format!("must be one of: {}", ALIGN_MODES.join(", ")),
        }
        .into());
    }

    if !FAILURE_POLICIES.contains(&config.failure_policy.as_str()) {
        return Err(ConfigError::InvalidValue {
            field: "failure_policy".to_string(),
            message: format!("must be one of: {}", FAILURE_POLICIES.join(", ")),
        }
        .into());
    }

    Ok(())
}
