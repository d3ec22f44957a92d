//! Android toolchain resolution

use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, SigningError};

/// Primary SDK root variable
pub const ANDROID_HOME_ENV: &str = "ANDROID_HOME";

/// Secondary SDK root variable, consulted when `ANDROID_HOME` is unset
pub const ANDROID_SDK_ROOT_ENV: &str = "ANDROID_SDK_ROOT";

/// Variable overriding the build-tools version
pub const BUILD_TOOLS_VERSION_ENV: &str = "BUILD_TOOLS_VERSION";

/// Build-tools version used when nothing overrides it
pub const DEFAULT_BUILD_TOOLS_VERSION: &str = "30.0.2";

/// Where zipalign and apksigner live: `{root}/build-tools/{version}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkLocation {
    /// Android SDK root, if known
    pub root: Option<PathBuf>,
    /// Build-tools version directory name
    pub build_tools_version: String,
}

impl SdkLocation {
    /// Create a location from explicit values
    pub fn new(root: Option<PathBuf>, build_tools_version: impl Into<String>) -> Self {
        Self {
            root,
            build_tools_version: build_tools_version.into(),
        }
    }

    /// Read the location from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read the location through an arbitrary variable lookup. Empty values
    /// count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let root = get(ANDROID_HOME_ENV)
            .or_else(|| get(ANDROID_SDK_ROOT_ENV))
            .map(PathBuf::from);
        let version =
            get(BUILD_TOOLS_VERSION_ENV).unwrap_or_else(|| DEFAULT_BUILD_TOOLS_VERSION.to_string());

        Self::new(root, version)
    }

    /// SDK root from `ANDROID_HOME`, falling back to `ANDROID_SDK_ROOT`
    pub fn sdk_root_from_env() -> Option<PathBuf> {
        Self::from_env().root
    }

    /// Resolve the build-tools directory.
    ///
    /// Fails when no SDK root is known. The directory itself is not checked;
    /// a missing one surfaces when a tool is spawned from it.
    pub fn build_tools_dir(&self) -> Result<PathBuf> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| SigningError::ToolchainMissing {
                tool: "Android SDK".to_string(),
                hint: format!("Set {ANDROID_HOME_ENV} to your Android SDK path"),
            })?;

        Ok(root.join("build-tools").join(&self.build_tools_version))
    }

    /// Path to zipalign
    pub fn zipalign(&self) -> Result<PathBuf> {
        let path = self.build_tools_dir()?.join("zipalign");
        debug!(path = %path.display(), "found 'zipalign'");
        Ok(path)
    }

    /// Path to apksigner
    pub fn apksigner(&self) -> Result<PathBuf> {
        let path = self.build_tools_dir()?.join("apksigner");
        debug!(path = %path.display(), "found 'apksigner'");
        Ok(path)
    }
}

impl Default for SdkLocation {
    fn default() -> Self {
        Self::new(None, DEFAULT_BUILD_TOOLS_VERSION)
    }
}

/// Find jarsigner on the search path
pub fn find_jarsigner() -> Result<PathBuf> {
    let path = which::which("jarsigner").map_err(|e| SigningError::ToolchainMissing {
        tool: "jarsigner".to_string(),
        hint: format!("Install a JDK and add its bin directory to PATH ({e})"),
    })?;
    debug!(path = %path.display(), "found 'jarsigner'");
    Ok(path)
}
