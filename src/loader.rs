use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Capability to resolve files against the pipeline's working root, supplied
/// by the host pipeline.
pub trait DocumentLoader {
    /// Root that relative paths are resolved against.
    fn root(&self) -> &Path;

    /// Returns the raw bytes of the file at `path`.
    fn load(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Filesystem-backed loader rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FsLoader { root: root.into() }
    }
}

impl DocumentLoader for FsLoader {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read file {}", path.display()))
    }
}
