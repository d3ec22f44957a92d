//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_ALIGN_MODE, DEFAULT_BUILD_DIRECTORY, DEFAULT_BUILD_TOOLS_VERSION,
    DEFAULT_FAILURE_POLICY, DEFAULT_OUTPUT_SUBDIR,
};

/// Main configuration for droidsign
///
/// Secrets (the encoded keystore and its passwords) are deliberately absent:
/// they only ever arrive through command-line flags or the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Scratch directory where the keystore is materialized
    pub build_directory: PathBuf,

    /// Directories scanned for packages, in processing order
    pub release_directories: Vec<PathBuf>,

    /// Key alias inside the keystore
    pub alias: Option<String>,

    /// Directory that receives a copy of every signed artifact
    pub output: Option<PathBuf>,

    /// Android build-tools version used to locate zipalign and apksigner
    pub build_tools_version: String,

    /// How APKs are aligned before signing (realign, copy)
    pub align_mode: String,

    /// What happens when one package fails (fail-fast, continue)
    pub failure_policy: String,

    /// Upper bound for a single external tool invocation, in seconds
    pub tool_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            build_directory: PathBuf::from(DEFAULT_BUILD_DIRECTORY),
            release_directories: Vec::new(),
            alias: None,
            output: None,
            build_tools_version: DEFAULT_BUILD_TOOLS_VERSION.to_string(),
            align_mode: DEFAULT_ALIGN_MODE.to_string(),
            failure_policy: DEFAULT_FAILURE_POLICY.to_string(),
            tool_timeout_secs: None,
        }
    }
}

impl Config {
    /// Default output directory, `{build_directory}/signed`
    pub fn default_output_dir(&self) -> PathBuf {
        self.build_directory.join(DEFAULT_OUTPUT_SUBDIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.build_directory, PathBuf::from("build"));
        assert_eq!(config.build_tools_version, "30.0.2");
        assert_eq!(config.align_mode, "realign");
        assert_eq!(config.failure_policy, "fail-fast");
        assert!(config.release_directories.is_empty());
        assert!(config.output.is_none());
    }

    #[test]
    fn test_default_output_dir_follows_build_directory() {
        let config = Config {
            build_directory: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(config.default_output_dir(), PathBuf::from("out/signed"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("alias = \"upload\"\n").unwrap();
        assert_eq!(config.alias.as_deref(), Some("upload"));
        assert_eq!(config.build_tools_version, "30.0.2");
    }
}
