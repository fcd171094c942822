//! Staging of uploaded bytes in a temporary file.
//!
//! Converters need a filesystem path, so every upload is written to a
//! uniquely named `upload-*.pdf` file first. [`StagedUpload`] owns that file:
//! [`StagedUpload::remove`] is the single, explicit deletion attempt on the
//! normal path, and `Drop` covers a request future that is cancelled before
//! reaching it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A PDF written to disk for the duration of one request.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    removal_attempted: bool,
}

impl StagedUpload {
    /// Write `bytes` to a new temp file in `dir` (system temp dir when `None`).
    ///
    /// Runs on the blocking pool; uploads can be large.
    pub async fn write(
        dir: Option<&Path>,
        bytes: impl AsRef<[u8]> + Send + 'static,
    ) -> io::Result<Self> {
        let dir = dir.map(Path::to_path_buf);
        let path =
            tokio::task::spawn_blocking(move || stage_blocking(dir.as_deref(), bytes.as_ref()))
                .await
                .map_err(|e| io::Error::other(format!("staging task panicked: {e}")))??;

        debug!("Staged upload at {}", path.display());
        Ok(Self {
            path,
            removal_attempted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file if it still exists.
    ///
    /// Returns `Ok(false)` when the file was already gone.
    pub async fn remove(mut self) -> io::Result<bool> {
        self.removal_attempted = true;
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        tokio::fs::remove_file(&self.path).await?;
        debug!("Removed staged upload {}", self.path.display());
        Ok(true)
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removal_attempted {
            return;
        }
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove staged upload {}: {}", self.path.display(), e);
            }
        }
    }
}

fn stage_blocking(dir: Option<&Path>, bytes: &[u8]) -> io::Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("upload-").suffix(".pdf");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    // On a failed write the NamedTempFile is dropped here, deleting it.
    file.write_all(bytes)?;
    file.flush()?;
    let (_file, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}
