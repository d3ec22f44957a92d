//! Signing credentials and keystore materialization

use std::fmt;
use std::path::{Path, PathBuf};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::{debug, info};

use crate::error::{Result, SigningError};

/// File name of the decoded keystore inside the build directory
pub const KEYSTORE_FILE_NAME: &str = "signingKey.jks";

/// Keystore and key material used for every package in a run
#[derive(Clone)]
pub struct SigningCredentials {
    keystore: PathBuf,
    alias: String,
    keystore_password: String,
    key_password: Option<String>,
}

impl SigningCredentials {
    /// Create credentials without a separate key password
    pub fn new(
        keystore: impl Into<PathBuf>,
        alias: impl Into<String>,
        keystore_password: impl Into<String>,
    ) -> Self {
        Self {
            keystore: keystore.into(),
            alias: alias.into(),
            keystore_password: keystore_password.into(),
            key_password: None,
        }
    }

    /// Set the key password. An empty string means "no key password".
    pub fn with_key_password(mut self, key_password: Option<impl Into<String>>) -> Self {
        self.key_password = key_password
            .map(Into::into)
            .filter(|p: &String| !p.is_empty());
        self
    }

    pub fn keystore(&self) -> &Path {
        &self.keystore
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn keystore_password(&self) -> &str {
        &self.keystore_password
    }

    pub fn key_password(&self) -> Option<&str> {
        self.key_password.as_deref()
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("keystore", &self.keystore)
            .field("alias", &self.alias)
            .field("keystore_password", &"<redacted>")
            .field(
                "key_password",
                &self.key_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Decode a base64 keystore. Whitespace (including the line breaks CI
/// secrets tend to pick up) is ignored and padding is optional.
pub fn decode_keystore(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(SigningError::InvalidKeystore(
            "signing key is empty".to_string(),
        ));
    }

    let engine = GeneralPurpose::new(
        &alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    );

    engine
        .decode(compact.as_bytes())
        .map_err(|e| SigningError::InvalidKeystore(e.to_string()))
}

/// Decode `encoded` and write it to `{build_dir}/signingKey.jks`, creating
/// the build directory when needed. Returns the keystore path.
pub fn materialize_keystore(build_dir: &Path, encoded: &str) -> Result<PathBuf> {
    info!("preparing signing key");
    let bytes = decode_keystore(encoded)?;

    std::fs::create_dir_all(build_dir)?;
    let keystore = build_dir.join(KEYSTORE_FILE_NAME);
    std::fs::write(&keystore, &bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&keystore, std::fs::Permissions::from_mode(0o600))?;
    }

    debug!(path = %keystore.display(), bytes = bytes.len(), "keystore written");
    Ok(keystore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_debug_redacts_passwords() {
        let creds = SigningCredentials::new("key.jks", "mykey", "pw1").with_key_password(Some("pw2"));
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("mykey"));
        assert!(!rendered.contains("pw1"));
        assert!(!rendered.contains("pw2"));
    }

    #[test]
    fn test_empty_key_password_is_absent() {
        let creds = SigningCredentials::new("key.jks", "mykey", "pw1").with_key_password(Some(""));
        assert_eq!(creds.key_password(), None);

        let creds = SigningCredentials::new("key.jks", "mykey", "pw1").with_key_password(None::<String>);
        assert_eq!(creds.key_password(), None);
    }

    #[test]
    fn test_decode_tolerates_whitespace_and_missing_padding() {
        assert_eq!(decode_keystore("aGVs\nbG8=\n").unwrap(), b"hello");
        assert_eq!(decode_keystore("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_keystore("not base64!"),
            Err(SigningError::InvalidKeystore(_))
        ));
        assert!(matches!(
            decode_keystore("  \n"),
            Err(SigningError::InvalidKeystore(_))
        ));
    }

    #[test]
    fn test_materialize_creates_build_dir() {
        let temp = TempDir::new().unwrap();
        let build_dir = temp.path().join("build");

        let keystore = materialize_keystore(&build_dir, "AAECAw==").unwrap();
        assert_eq!(keystore, build_dir.join("signingKey.jks"));
        assert_eq!(std::fs::read(&keystore).unwrap(), vec![0, 1, 2, 3]);
    }
}
