//! Document Storage
//!
//! The document is read whole before the run and written back once after
//! it. Writes go to a temporary file in the target's directory which is
//! then renamed over the original, so a failed or interrupted write never
//! leaves a truncated document behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::error::MigrateError;

/// A text document held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Where the document was read from and will be written to
    pub path: PathBuf,
    /// Full document text
    pub content: String,
}

impl Document {
    /// Reads the whole document into memory.
    ///
    /// Fails with [`MigrateError::DocumentLoad`] if the file is missing,
    /// unreadable, or not valid UTF-8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MigrateError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|source| MigrateError::DocumentLoad {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded document: {} ({} bytes)", path.display(), content.len());

        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Atomically replaces the document at `path` with `content`.
    ///
    /// Existing file permissions are carried over to the new file.
    pub fn persist(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let permissions = fs::metadata(path).ok().map(|m| m.permissions());

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.as_file().sync_all()?;

        if let Some(permissions) = permissions {
            temp.as_file().set_permissions(permissions)?;
        }

        debug!("Renaming {} over {}", temp.path().display(), path.display());
        temp.persist(path).map_err(|e| e.error)?;

        info!("Wrote document: {} ({} bytes)", path.display(), content.len());
        Ok(())
    }
}
