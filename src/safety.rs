use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keeps located files inside the platform tree they were found in.
///
/// A symlinked `index.html` or `config.xml` could otherwise redirect a rewrite
/// to a file outside the project.
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// Canonical root that every accepted path must live under
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside platform tree: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl PathGuard {
    /// Create a guard for `root`, canonicalized to handle symlinks correctly.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    /// Check if a path is safe to rewrite.
    ///
    /// Returns the canonical absolute path if it stays under the root.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = absolute.canonicalize()?;
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.root.clone(),
            });
        }

        Ok(canonical)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
