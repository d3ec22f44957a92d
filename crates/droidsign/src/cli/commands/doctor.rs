//! Doctor command - check the Android SDK and JDK tools a release needs

use std::path::Path;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use droidsign_signing::{find_jarsigner, SdkLocation};

use super::common::ToolchainArgs;
use crate::cli::{Cli, OutputFormat};

/// Check the signing toolchain
#[derive(Debug, Args)]
pub struct DoctorCommand {
    /// Show suggestions for fixing issues
    #[arg(long)]
    pub fix: bool,

    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: Option<String>,
    pub fix_suggestion: Option<String>,
}

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
    Skip,
}

/// Summary of all checks
#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub checks: Vec<CheckResult>,
    pub ok_count: usize,
    pub warn_count: usize,
    pub fail_count: usize,
    pub skip_count: usize,
}

impl DoctorSummary {
    fn new(checks: Vec<CheckResult>) -> Self {
        let count = |status: CheckStatus| checks.iter().filter(|c| c.status == status).count();
        Self {
            ok_count: count(CheckStatus::Ok),
            warn_count: count(CheckStatus::Warn),
            fail_count: count(CheckStatus::Fail),
            skip_count: count(CheckStatus::Skip),
            checks,
        }
    }
}

impl CheckResult {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: Some(message.into()),
            fix_suggestion: None,
        }
    }

    fn failed(name: &str, status: CheckStatus, message: impl Into<String>, fix: &str) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
            fix_suggestion: Some(fix.to_string()),
        }
    }

    fn skipped(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Skip,
            message: Some(message.to_string()),
            fix_suggestion: None,
        }
    }
}

impl DoctorCommand {
    /// Execute the doctor command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(fix = self.fix, "executing doctor command");

        if !cli.quiet && cli.format == OutputFormat::Text {
            println!("{}", style("Checking signing toolchain...").bold());
            println!();
        }

        let mut checks = vec![self.check_config(cli)];
        let mut config = cli.load_config().unwrap_or_default();
        self.toolchain.apply(&mut config);
        checks.extend(check_sdk(&self.toolchain.sdk_location(&config)));
        checks.push(self.check_jarsigner());

        let summary = DoctorSummary::new(checks);

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    print_results(&summary.checks);
                    print_summary(&summary);
                }

                if self.fix && (summary.fail_count > 0 || summary.warn_count > 0) {
                    println!();
                    println!("{}", style("Suggested fixes:").bold());
                    for check in &summary.checks {
                        if matches!(check.status, CheckStatus::Fail | CheckStatus::Warn) {
                            if let Some(ref fix) = check.fix_suggestion {
                                println!(
                                    "  {} {}: {}",
                                    status_icon(check.status),
                                    style(&check.name).bold(),
                                    fix
                                );
                            }
                        }
                    }
                }
            }
        }

        if summary.fail_count > 0 {
            anyhow::bail!("{} check(s) failed", summary.fail_count);
        }

        Ok(())
    }

    fn check_config(&self, cli: &Cli) -> CheckResult {
        match cli.load_config() {
            Ok(config) if config.release_directories.is_empty() => CheckResult::skipped(
                "Configuration",
                "No release directories configured; pass --release-directory",
            ),
            Ok(config) => CheckResult::ok(
                "Configuration",
                format!("{} release director(ies)", config.release_directories.len()),
            ),
            Err(e) => CheckResult::failed(
                "Configuration",
                CheckStatus::Fail,
                format!("{e:#}"),
                "Fix or remove droidsign.toml",
            ),
        }
    }

    fn check_jarsigner(&self) -> CheckResult {
        let found = match &self.toolchain.jarsigner {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => Err(format!("{} does not exist", path.display())),
            None => find_jarsigner().map_err(|e| e.to_string()),
        };
        match found {
            Ok(path) => CheckResult::ok("jarsigner", path.display().to_string()),
            // Only bundles need jarsigner
            Err(message) => CheckResult::failed(
                "jarsigner",
                CheckStatus::Warn,
                message,
                "Install a JDK and add its bin directory to PATH",
            ),
        }
    }
}

/// SDK root, build-tools directory, zipalign and apksigner
fn check_sdk(sdk: &SdkLocation) -> Vec<CheckResult> {
    let Some(root) = &sdk.root else {
        return vec![CheckResult::failed(
            "Android SDK",
            CheckStatus::Fail,
            "ANDROID_HOME and ANDROID_SDK_ROOT are not set",
            "Set ANDROID_HOME to your Android SDK path or pass --sdk-root",
        )];
    };

    let mut results = Vec::new();
    if !root.is_dir() {
        results.push(CheckResult::failed(
            "Android SDK",
            CheckStatus::Fail,
            format!("{} does not exist", root.display()),
            "Point ANDROID_HOME at an installed Android SDK",
        ));
        return results;
    }
    results.push(CheckResult::ok("Android SDK", root.display().to_string()));

    let build_tools = root.join("build-tools").join(&sdk.build_tools_version);
    let name = format!("Build tools {}", sdk.build_tools_version);
    if !build_tools.is_dir() {
        results.push(CheckResult::failed(
            &name,
            CheckStatus::Fail,
            format!("{} does not exist", build_tools.display()),
            &format!(
                "Run 'sdkmanager \"build-tools;{}\"' or set BUILD_TOOLS_VERSION",
                sdk.build_tools_version
            ),
        ));
        return results;
    }
    results.push(CheckResult::ok(&name, build_tools.display().to_string()));

    for tool in ["zipalign", "apksigner"] {
        results.push(check_tool(tool, &build_tools.join(tool)));
    }
    results
}

fn check_tool(name: &str, path: &Path) -> CheckResult {
    if path.is_file() {
        CheckResult::ok(name, path.display().to_string())
    } else {
        CheckResult::failed(
            name,
            CheckStatus::Fail,
            format!("{} not found", path.display()),
            "Reinstall the Android build tools",
        )
    }
}

fn print_results(checks: &[CheckResult]) {
    for check in checks {
        let message = check.message.as_deref().unwrap_or("");
        println!(
            "{} {} {}",
            status_icon(check.status),
            style(&check.name).bold(),
            style(message).dim()
        );
    }
}

fn print_summary(summary: &DoctorSummary) {
    println!();
    println!(
        "{} {} ok, {} warnings, {} failed, {} skipped",
        style("Summary:").bold(),
        style(summary.ok_count).green(),
        style(summary.warn_count).yellow(),
        style(summary.fail_count).red(),
        style(summary.skip_count).dim()
    );
}

fn status_icon(status: CheckStatus) -> console::StyledObject<&'static str> {
    match status {
        CheckStatus::Ok => style("✓").green(),
        CheckStatus::Warn => style("!").yellow(),
        CheckStatus::Fail => style("✗").red(),
        CheckStatus::Skip => style("-").dim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_sdk_root() {
        let results = check_sdk(&SdkLocation::new(None, "30.0.2"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_missing_build_tools() {
        let temp = TempDir::new().unwrap();
        let results = check_sdk(&SdkLocation::new(Some(temp.path().to_path_buf()), "34.0.0"));

        assert_eq!(results[0].status, CheckStatus::Ok);
        assert_eq!(results[1].name, "Build tools 34.0.0");
        assert_eq!(results[1].status, CheckStatus::Fail);
    }

    #[test]
    fn test_complete_build_tools() {
        let temp = TempDir::new().unwrap();
        let build_tools = temp.path().join("build-tools").join("30.0.2");
        std::fs::create_dir_all(&build_tools).unwrap();
        std::fs::write(build_tools.join("zipalign"), b"").unwrap();

        let results = check_sdk(&SdkLocation::new(Some(temp.path().to_path_buf()), "30.0.2"));
        let summary = DoctorSummary::new(results);

        assert_eq!(summary.checks.len(), 4);
        assert_eq!(summary.ok_count, 3);
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.checks[3].name, "apksigner");
    }
}
