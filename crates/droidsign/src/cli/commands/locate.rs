//! Locate command - list the packages a release would sign

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use droidsign_signing::{locate, PackageKind, SigningError};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// List release packages without signing them
#[derive(Debug, Args)]
pub struct LocateCommand {
    /// Directories to scan
    #[arg(required = true, value_name = "DIR")]
    pub directories: Vec<PathBuf>,
}

/// A package as reported by `locate`
#[derive(Debug, Serialize)]
struct LocatedPackage {
    directory: PathBuf,
    path: PathBuf,
    kind: PackageKind,
}

impl LocateCommand {
    /// Execute the locate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(directories = self.directories.len(), "executing locate command");
        let packages = self.scan()?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&packages)?);
            }
            OutputFormat::Text if !cli.quiet => {
                for dir in &self.directories {
                    println!("{}", output::header(&dir.display().to_string()));
                    for package in packages.iter().filter(|p| &p.directory == dir) {
                        println!(
                            "  {} {}",
                            package.kind,
                            output::path_style().apply_to(package.path.display())
                        );
                    }
                }
            }
            OutputFormat::Text => {}
        }
        Ok(())
    }

    /// Scan every directory in order; a directory without packages is an error
    fn scan(&self) -> Result<Vec<LocatedPackage>, SigningError> {
        let mut packages = Vec::new();
        for dir in &self.directories {
            let entries = locate(dir)?;
            if entries.is_empty() {
                return Err(SigningError::NoArtifact(dir.clone()));
            }
            packages.extend(entries.into_iter().map(|entry| LocatedPackage {
                directory: dir.clone(),
                path: entry.path().to_path_buf(),
                kind: entry.kind(),
            }));
        }
        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_lists_packages() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.apk"), b"apk").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"txt").unwrap();

        let cmd = LocateCommand {
            directories: vec![temp.path().to_path_buf()],
        };
        let packages = cmd.scan().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].path, temp.path().join("app.apk"));
        assert_eq!(packages[0].kind, PackageKind::Apk);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let cmd = LocateCommand {
            directories: vec![temp.path().to_path_buf()],
        };
        assert!(matches!(cmd.scan(), Err(SigningError::NoArtifact(_))));
    }

    #[test]
    fn test_scan_missing_directory() {
        let temp = TempDir::new().unwrap();
        let cmd = LocateCommand {
            directories: vec![temp.path().join("missing")],
        };
        assert!(matches!(cmd.scan(), Err(SigningError::NotFound(_))));
    }
}
