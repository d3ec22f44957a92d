//! Error types for signing operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Signing-related errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// Candidate directory does not exist
    #[error("Release directory not found: {0}")]
    NotFound(PathBuf),

    /// Candidate path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory yielded no packages to sign
    #[error("No release file (.apk or .aab) could be found in {0}")]
    NoArtifact(PathBuf),

    /// A file that is neither an APK nor an AAB reached dispatch
    #[error("Cannot sign {path}: unsupported file type")]
    UnsupportedFormat { path: PathBuf },

    /// Required external tool cannot be resolved
    #[error("Signing tool not found: {tool}. {hint}")]
    ToolchainMissing { tool: String, hint: String },

    /// Producing the aligned APK failed
    #[error("Failed to align {path}: {reason}")]
    AlignmentFailed { path: PathBuf, reason: String },

    /// Signer exited non-zero or produced no output
    #[error("Failed to sign {path}: {reason}")]
    SigningFailed { path: PathBuf, reason: String },

    /// Verifier rejected the signed file
    #[error("Signature verification failed for {path}: {reason}")]
    VerificationFailed { path: PathBuf, reason: String },

    /// External tool did not finish in time
    #[error("{tool} did not finish within {seconds} seconds")]
    ToolTimeout { tool: String, seconds: u64 },

    /// Encoded keystore could not be decoded
    #[error("Invalid signing key: {0}")]
    InvalidKeystore(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
