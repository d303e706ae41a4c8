//! Artifact output

use apiingest_common::{IngestError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Receives named generated artifacts
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactSink {
    fn write_artifact(&mut self, name: &str, contents: &[u8]) -> Result<()>;
}

/// Writes artifacts as files under one directory
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create the directory (and parents) if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            IngestError::Generation(format!(
                "Failed to create output directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    fn write_artifact(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.root.join(name);
        fs::write(&path, contents).map_err(|e| {
            IngestError::Generation(format!("Failed to write {}: {}", path.display(), e))
        })?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }
}
