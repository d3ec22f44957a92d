//! Default configuration values

/// Default scratch directory
pub const DEFAULT_BUILD_DIRECTORY: &str = "build";

/// Subdirectory of the build directory used when `output` is requested without a path
pub const DEFAULT_OUTPUT_SUBDIR: &str = "signed";

/// Build-tools version used when neither config nor environment override it
pub const DEFAULT_BUILD_TOOLS_VERSION: &str = "30.0.2";

/// Default alignment mode
pub const DEFAULT_ALIGN_MODE: &str = "realign";

/// Default per-package failure policy
pub const DEFAULT_FAILURE_POLICY: &str = "fail-fast";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "droidsign.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "droidsign.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".droidsign.toml",
        ".droidsign.yaml",
    ]
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# droidsign configuration
# Secrets (keystore, passwords) are passed via flags or environment only.

build_directory = "build"
release_directories = ["app/build/outputs/apk/release"]
alias = "release"
build_tools_version = "30.0.2"

# realign: run `zipalign -f -v 4` to produce the aligned APK
# copy:    verbatim copy after the alignment check (legacy behaviour)
align_mode = "realign"

# fail-fast or continue
failure_policy = "fail-fast"
"#;
