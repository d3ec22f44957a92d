//! Artifact discovery in candidate directories

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SigningError};
use crate::package::{PackageEntry, PackageKind};

/// List the packages directly inside `dir`.
///
/// Only direct children are considered and subdirectories are skipped,
/// even when their name ends in a package suffix. Entries come back in
/// directory-listing order. A directory without packages yields an empty
/// vector; deciding whether that is fatal is up to the caller.
pub fn locate(dir: &Path) -> Result<Vec<PackageEntry>> {
    let metadata = match std::fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SigningError::NotFound(dir.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Err(SigningError::NotADirectory(dir.to_path_buf()));
    }

    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir)? {
        let item = item?;
        if item.file_type()?.is_dir() {
            continue;
        }

        let name = item.file_name();
        let Some(name) = name.to_str() else {
            debug!(name = ?name, "skipping non UTF-8 file name");
            continue;
        };

        if let Some(kind) = PackageKind::from_file_name(name) {
            debug!(dir = %dir.display(), name, %kind, "found release to sign");
            entries.push(PackageEntry::new(dir, name, kind));
        }
    }

    Ok(entries)
}
