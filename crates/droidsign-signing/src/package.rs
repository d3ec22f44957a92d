//! Package entries and the file naming rules applied while signing

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigningError};

/// Marker inserted before the extension of a signed package
pub const SIGNED_MARKER: &str = "-signed";

/// Marker inserted before the extension of the aligned intermediate APK
pub const ALIGNED_MARKER: &str = "-aligned";

/// Kind of Android package, decided solely by file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// Installable package (.apk)
    Apk,
    /// Publishing bundle (.aab)
    Aab,
}

impl PackageKind {
    /// Classify a file name. The match is an exact, case-sensitive suffix
    /// check: `app.APK` is not a package.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".apk") {
            Some(Self::Apk)
        } else if name.ends_with(".aab") {
            Some(Self::Aab)
        } else {
            None
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Aab => "aab",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Apk => ".apk",
            Self::Aab => ".aab",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apk => write!(f, "APK"),
            Self::Aab => write!(f, "AAB"),
        }
    }
}

/// A package file found in a candidate directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    path: PathBuf,
    file_name: String,
    kind: PackageKind,
}

impl PackageEntry {
    /// Create an entry for `file_name` inside `dir`
    pub fn new(dir: &Path, file_name: impl Into<String>, kind: PackageKind) -> Self {
        let file_name = file_name.into();
        Self {
            path: dir.join(&file_name),
            file_name,
            kind,
        }
    }

    /// Build an entry from an arbitrary path, rejecting anything that is
    /// not an APK or AAB.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        let kind = file_name.as_deref().and_then(PackageKind::from_file_name);

        match (file_name, kind) {
            (Some(file_name), Some(kind)) => Ok(Self {
                path,
                file_name,
                kind,
            }),
            _ => Err(SigningError::UnsupportedFormat { path }),
        }
    }

    /// Full path of the package
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the package
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Package kind
    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// Path of the aligned intermediate, `{stem}-aligned.{ext}`
    pub fn aligned_path(&self) -> PathBuf {
        self.marked_path(ALIGNED_MARKER)
    }

    /// Path of the signed output, `{stem}-signed.{ext}`.
    ///
    /// Not idempotent: an entry already named `x-signed.apk` maps to
    /// `x-signed-signed.apk`.
    pub fn signed_path(&self) -> PathBuf {
        self.marked_path(SIGNED_MARKER)
    }

    fn marked_path(&self, marker: &str) -> PathBuf {
        let suffix = self.kind.suffix();
        let stem = self
            .file_name
            .strip_suffix(suffix)
            .unwrap_or(&self.file_name);
        self.path
            .with_file_name(format!("{stem}{marker}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_file_name() {
        assert_eq!(PackageKind::from_file_name("app.apk"), Some(PackageKind::Apk));
        assert_eq!(PackageKind::from_file_name("app.aab"), Some(PackageKind::Aab));
        assert_eq!(PackageKind::from_file_name("app.APK"), None);
        assert_eq!(PackageKind::from_file_name("app.apk.idsig"), None);
        assert_eq!(PackageKind::from_file_name("mapping.txt"), None);
    }

    #[test]
    fn test_signed_and_aligned_names() {
        let entry = PackageEntry::new(
            Path::new("release"),
            "app-release-unsigned.apk",
            PackageKind::Apk,
        );
        assert_eq!(
            entry.signed_path(),
            PathBuf::from("release/app-release-unsigned-signed.apk")
        );
        assert_eq!(
            entry.aligned_path(),
            PathBuf::from("release/app-release-unsigned-aligned.apk")
        );

        let bundle = PackageEntry::new(Path::new("release"), "app-release.aab", PackageKind::Aab);
        assert_eq!(
            bundle.signed_path(),
            PathBuf::from("release/app-release-signed.aab")
        );
    }

    #[test]
    fn test_marker_only_touches_file_name() {
        let entry = PackageEntry::new(Path::new("out.apk.d/release"), "app.apk", PackageKind::Apk);
        assert_eq!(
            entry.signed_path(),
            PathBuf::from("out.apk.d/release/app-signed.apk")
        );
    }

    #[test]
    fn test_signing_is_not_idempotent() {
        let entry = PackageEntry::new(Path::new("release"), "x-signed.apk", PackageKind::Apk);
        assert_eq!(
            entry.signed_path(),
            PathBuf::from("release/x-signed-signed.apk")
        );
    }

    #[test]
    fn test_from_path() {
        let entry = PackageEntry::from_path("dist/app.aab").unwrap();
        assert_eq!(entry.kind(), PackageKind::Aab);
        assert_eq!(entry.file_name(), "app.aab");
        assert_eq!(entry.path(), Path::new("dist/app.aab"));

        let err = PackageEntry::from_path("dist/app.ipa").unwrap_err();
        assert!(matches!(err, SigningError::UnsupportedFormat { .. }));
    }
}
