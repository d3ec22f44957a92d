//! Exit codes for the CLI

use droidsign_core::{ConfigError, CoreError};
use droidsign_signing::SigningError;

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Configuration or input error
pub const CONFIG_ERROR: u8 = 2;

/// Android SDK or JDK tool missing, or a tool hung
pub const TOOLCHAIN_ERROR: u8 = 3;

/// Alignment, signing or verification failed
pub const SIGNING_ERROR: u8 = 4;

/// Nothing to sign
pub const NO_ARTIFACT: u8 = 5;

/// Map an error to the process exit code, using the first cause that
/// carries a known error type.
pub fn for_error(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(err) = cause.downcast_ref::<SigningError>() {
            return for_signing_error(err);
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return CONFIG_ERROR;
        }
        if let Some(CoreError::Config(_)) = cause.downcast_ref::<CoreError>() {
            return CONFIG_ERROR;
        }
    }
    ERROR
}

fn for_signing_error(error: &SigningError) -> u8 {
    match error {
        SigningError::NotFound(_) | SigningError::NotADirectory(_) | SigningError::NoArtifact(_) => {
            NO_ARTIFACT
        }
        SigningError::ToolchainMissing { .. } | SigningError::ToolTimeout { .. } => TOOLCHAIN_ERROR,
        SigningError::AlignmentFailed { .. }
        | SigningError::SigningFailed { .. }
        | SigningError::VerificationFailed { .. }
        | SigningError::UnsupportedFormat { .. } => SIGNING_ERROR,
        SigningError::InvalidKeystore(_) => CONFIG_ERROR,
        SigningError::Io(_) => ERROR,
    }
}
