//! Sign command - sign a single package with an existing keystore

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use droidsign_core::config::validate_config;
use droidsign_core::ConfigError;
use droidsign_signing::{Orchestrator, SigningCredentials};

use super::common::{non_empty, ToolchainArgs};
use crate::cli::output::{self, github::GithubBindings};
use crate::cli::{Cli, OutputFormat};

/// Sign one .apk or .aab file
#[derive(Debug, Args)]
pub struct SignCommand {
    /// Package to sign
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// Keystore file
    #[arg(long, env = "ANDROID_KEYSTORE", value_name = "FILE")]
    pub keystore: PathBuf,

    /// Key alias inside the keystore
    #[arg(long, env = "ANDROID_KEY_ALIAS")]
    pub alias: Option<String>,

    /// Keystore password
    #[arg(long, env = "ANDROID_KEYSTORE_PASSWORD", hide_env_values = true)]
    pub keystore_password: String,

    /// Key password, when it differs from the keystore password
    #[arg(long, env = "ANDROID_KEY_PASSWORD", hide_env_values = true)]
    pub key_password: Option<String>,

    /// Copy the signed artifact into DIR
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub toolchain: ToolchainArgs,
}

impl SignCommand {
    /// Execute the sign command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(file = %self.file.display(), "executing sign command");

        let mut config = cli.load_config()?;
        self.toolchain.apply(&mut config);
        validate_config(&config)?;

        let alias = non_empty(self.alias.as_deref())
            .map(str::to_string)
            .or_else(|| config.alias.clone())
            .ok_or_else(|| ConfigError::MissingField("alias".to_string()))?;
        let credentials = SigningCredentials::new(&self.keystore, alias, &self.keystore_password)
            .with_key_password(self.key_password.as_deref());
        let orchestrator = Orchestrator::new(self.toolchain.tools(&config)?);

        let rt = tokio::runtime::Runtime::new()?;
        let artifact = rt.block_on(async {
            let mut artifact = orchestrator.sign_path(&self.file, &credentials).await?;
            if let Some(dir) = &self.output {
                orchestrator.relocate(&mut artifact, dir).await?;
            }
            Ok::<_, droidsign_signing::SigningError>(artifact)
        })?;

        GithubBindings::from_env().export(&[artifact.path.as_path()])?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&artifact)?);
            }
            OutputFormat::Text if !cli.quiet => {
                output::success(&format!(
                    "Release signed: {}",
                    output::path_style().apply_to(artifact.path.display())
                ));
                if let Some(sha256) = &artifact.sha256 {
                    println!("{}", output::key_value("sha256", sha256));
                }
                if let Some(copy) = &artifact.copied_to {
                    println!("{}", output::key_value("copied to", &copy.display().to_string()));
                }
            }
            OutputFormat::Text => {}
        }
        Ok(())
    }
}
