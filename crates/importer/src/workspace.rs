//! Transient working storage for a single import run
//!
//! Created once by the pipeline and handed to every component that needs
//! scratch space. Dropping the workspace removes the directory and
//! everything left inside it.

use crate::error::{FileOperation, ImportError, Result};
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

const WORKSPACE_PREFIX: &str = ".mcutmp";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace directory under `root`
    pub fn init(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            std::fs::create_dir_all(root)
                .map_err(|e| ImportError::fs(root, FileOperation::CreateDir, e))?;
        }
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(|e| ImportError::fs(root, FileOperation::CreateDir, e))?;
        debug!("Created workspace at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A new empty file that is deleted when the handle is dropped
    pub fn temp_file(&self, prefix: &str) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(self.path())
            .map_err(|e| ImportError::fs(self.path(), FileOperation::Create, e))
    }

    /// A new empty directory that is deleted when the handle is dropped
    pub fn temp_dir(&self, prefix: &str) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(self.path())
            .map_err(|e| ImportError::fs(self.path(), FileOperation::CreateDir, e))
    }
}
