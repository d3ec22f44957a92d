//! Release command - decode the keystore and sign every release package

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use droidsign_core::config::validate_config;
use droidsign_core::{Config, ConfigError};
use droidsign_signing::{
    materialize_keystore, Orchestrator, RunPlan, SigningCredentials, SigningReport,
};

use super::common::{failure_policy, non_empty, ToolchainArgs};
use crate::cli::output::{self, github::GithubBindings};
use crate::cli::{Cli, OutputFormat};

/// Sign every package found in the release directories
#[derive(Debug, Args)]
pub struct ReleaseCommand {
    /// Directory the keystore is decoded into
    #[arg(long, env = "INPUT_BUILDDIRECTORY", value_name = "DIR")]
    pub build_directory: Option<PathBuf>,

    /// Directory to scan for .apk and .aab files (repeatable, newline-separated)
    #[arg(long = "release-directory", env = "INPUT_RELEASEDIRECTORY", value_name = "DIR")]
    pub release_directories: Vec<String>,

    /// Base64-encoded keystore
    #[arg(long, env = "INPUT_SIGNINGKEYBASE64", hide_env_values = true)]
    pub signing_key_base64: Option<String>,

    /// Key alias inside the keystore
    #[arg(long, env = "INPUT_ALIAS")]
    pub alias: Option<String>,

    /// Keystore password
    #[arg(long, env = "INPUT_KEYSTOREPASSWORD", hide_env_values = true)]
    pub keystore_password: Option<String>,

    /// Key password, when it differs from the keystore password
    #[arg(long, env = "INPUT_KEYPASSWORD", hide_env_values = true)]
    pub key_password: Option<String>,

    /// Copy signed artifacts into DIR [bare flag: <build-directory>/signed]
    #[arg(long, env = "INPUT_OUTPUT", num_args = 0..=1, value_name = "DIR")]
    pub output: Option<Option<String>>,

    /// Keep signing the remaining packages after a failure
    #[arg(long)]
    pub continue_on_error: bool,

    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

impl ReleaseCommand {
    /// Execute the release command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing release command");

        let mut config = cli.load_config()?;
        self.apply(&mut config);
        validate_config(&config)?;

        if config.release_directories.is_empty() {
            return Err(ConfigError::MissingField("release-directory".to_string()).into());
        }
        let encoded = required(self.signing_key_base64.as_deref(), "signing-key-base64")?;
        let alias = non_empty(self.alias.as_deref())
            .map(str::to_string)
            .or_else(|| config.alias.clone())
            .ok_or_else(|| ConfigError::MissingField("alias".to_string()))?;
        let keystore_password = required(self.keystore_password.as_deref(), "keystore-password")?;

        if cli.prints_text() {
            output::info("Preparing signing key");
        }
        let keystore = materialize_keystore(&config.build_directory, encoded)?;
        let credentials = SigningCredentials::new(keystore, alias, keystore_password)
            .with_key_password(self.key_password.as_deref());

        let plan = RunPlan::new(config.release_directories.clone(), credentials)
            .with_output(self.output_dir(&config))
            .with_failure_policy(failure_policy(&config, self.continue_on_error)?);
        let orchestrator = Orchestrator::new(self.toolchain.tools(&config)?);

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt.block_on(orchestrator.run(&plan));

        GithubBindings::from_env().export(&report.signed_paths())?;
        self.print_report(&report, cli)?;

        report.into_result()?;
        Ok(())
    }

    /// Layer flags and action inputs over the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = self.build_directory.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            config.build_directory = dir.clone();
        }

        let directories = split_directories(&self.release_directories);
        if !directories.is_empty() {
            config.release_directories = directories;
        }

        self.toolchain.apply(config);
    }

    /// `None` disables copying; a bare `--output` selects the default
    fn output_dir(&self, config: &Config) -> Option<PathBuf> {
        match &self.output {
            None => config.output.clone(),
            Some(None) => Some(config.default_output_dir()),
            Some(Some(dir)) => match non_empty(Some(dir)) {
                Some(dir) => Some(PathBuf::from(dir)),
                None => config.output.clone(),
            },
        }
    }

    fn print_report(&self, report: &SigningReport, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text if !cli.quiet => {
                for artifact in &report.signed {
                    output::success(&format!(
                        "Release signed: {}",
                        output::path_style().apply_to(artifact.path.display())
                    ));
                    if let Some(copy) = &artifact.copied_to {
                        println!("{}", output::key_value("copied to", &copy.display().to_string()));
                    }
                }
                if report.failures.len() > 1 {
                    for failure in &report.failures {
                        output::warning(&format!(
                            "{}: {}",
                            failure.target.display(),
                            failure.error
                        ));
                    }
                }
                if !report.signed.is_empty() {
                    println!();
                    println!(
                        "{} {} signed, {} failed",
                        style("Summary:").bold(),
                        report.signed.len(),
                        report.failures.len()
                    );
                }
            }
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

/// Split directory inputs on newlines, dropping blank entries
fn split_directories(values: &[String]) -> Vec<PathBuf> {
    values
        .iter()
        .flat_map(|value| value.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Secrets are passed through untrimmed; only blank values count as missing
fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingField(field.to_string()))
}
