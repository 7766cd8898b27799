use std::fs;
use std::path::{Path, PathBuf};

use super::resource_error::ResourceError;

/// A rendered video that outlives its job so it can be streamed back.
///
/// Whoever holds the artifact owns the file: dropping it deletes the file
/// unless [`OutputArtifact::keep`] was called.
#[derive(Debug)]
pub struct OutputArtifact {
    path: PathBuf,
    keep: bool,
}

impl OutputArtifact {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detach the file from the artifact; the caller becomes responsible for it.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for OutputArtifact {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = remove_if_present(&self.path) {
            log::warn!("{e}");
        }
    }
}

fn remove_if_present(path: &Path) -> Result<(), ResourceError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ResourceError::Release {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
