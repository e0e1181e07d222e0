//! Protected file storage.
//!
//! Files for sale live directly inside one root directory. The vault resolves
//! catalog file names against that root and opens them for streaming.

use crate::config::is_plain_file_name;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, trace};

/// An opened file ready to be streamed.
#[derive(Debug)]
pub struct VaultFile {
    /// Open handle positioned at the start.
    pub file: fs::File,
    /// Size in bytes.
    pub len: u64,
}

/// Read-only view over the protected-file root.
#[derive(Debug, Clone)]
pub struct FileVault {
    root: PathBuf,
}

impl FileVault {
    /// Create a vault rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a catalog file name to its full path.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `filename` would leave the root.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if !is_plain_file_name(filename) {
            return Err(Error::NotFound(format!("file not found: {filename}")));
        }
        Ok(self.root.join(filename))
    }

    /// Whether a regular file exists at `path`.
    pub async fn exists(&self, path: &Path) -> bool {
        let found = fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        trace!("exists({}) = {found}", path.display());
        found
    }

    /// Open the file at `path` for reading.
    ///
    /// Returns `None` if nothing readable is there.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures other than the file being absent.
    pub async fn open(&self, path: &Path) -> Result<Option<VaultFile>> {
        let file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Ok(None);
        }
        debug!("Opened {} ({} bytes)", path.display(), meta.len());
        Ok(Some(VaultFile {
            file,
            len: meta.len(),
        }))
    }
}
