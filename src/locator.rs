//! Per-platform file discovery.
//!
//! Every patch operation asks the locator for the files matching one pattern
//! under either the web root or the config root of each enabled platform.

use crate::platform::{Platform, RootKind};
use crate::safety::PathGuard;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Directory name whose subtree never holds patch targets.
const BUILD_DIR: &str = "build";

/// A resolved file plus the platform whose tree it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    pub path: PathBuf,
    pub platform: Platform,
}

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// File pattern of the form `**/<name-glob>` or `<name-glob>`.
///
/// `*` in the name glob matches any run of characters. The `**/` prefix
/// matches any directory depth, including the base itself.
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    recursive: bool,
    name: Regex,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self, LocateError> {
        let invalid = |message: &str| LocateError::InvalidPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        };

        let (recursive, name_glob) = match pattern.strip_prefix("**/") {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };
        if name_glob.is_empty() {
            return Err(invalid("empty file name"));
        }
        if name_glob.contains('/') || name_glob.contains("**") {
            return Err(invalid("only a leading '**/' directory wildcard is supported"));
        }

        let body = name_glob
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let name = Regex::new(&format!("^{body}$")).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            recursive,
            name,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches_name(&self, file_name: &str) -> bool {
        self.name.is_match(file_name)
    }
}

/// Resolves patterns against `<root>/platforms/<platform>/<base>`.
#[derive(Debug, Clone)]
pub struct FileLocator {
    root: PathBuf,
    platforms: Vec<Platform>,
}

impl FileLocator {
    pub fn new(root: impl Into<PathBuf>, platforms: Vec<Platform>) -> Self {
        Self {
            root: root.into(),
            platforms,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Base directory that `kind` resolves to for `platform`.
    pub fn base_dir(&self, platform: Platform, kind: RootKind) -> PathBuf {
        let base = self.root.join(platform.tree());
        match platform.dir(kind) {
            "." => base,
            dir => base.join(dir),
        }
    }

    /// Find every file matching `pattern` across the configured platforms.
    ///
    /// A platform whose base directory is missing contributes nothing, and
    /// entries that cannot be read are logged and skipped.
    pub fn find(&self, pattern: &FilePattern, kind: RootKind) -> Result<Vec<PatchTarget>, LocateError> {
        let mut targets = Vec::new();
        for &platform in &self.platforms {
            targets.extend(self.find_in(platform, pattern, kind)?);
        }
        Ok(targets)
    }

    fn find_in(
        &self,
        platform: Platform,
        pattern: &FilePattern,
        kind: RootKind,
    ) -> Result<Vec<PatchTarget>, LocateError> {
        let base = self.base_dir(platform, kind);
        if !base.is_dir() {
            tracing::debug!(%platform, base = %base.display(), "base directory missing, nothing to patch");
            return Ok(Vec::new());
        }

        // The base exists, so its platform tree does too.
        let guard = match PathGuard::new(self.root.join(platform.tree())) {
            Ok(guard) => guard,
            Err(err) => {
                tracing::warn!(%platform, "cannot resolve platform tree: {err}");
                return Ok(Vec::new());
            }
        };

        let walker = WalkDir::new(&base)
            .max_depth(if pattern.recursive { usize::MAX } else { 1 })
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded(entry));

        let mut targets = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(&base).display().to_string();
                    tracing::warn!(%platform, %path, "skipping unreadable entry: {err}");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !pattern.matches_name(name) {
                continue;
            }

            match guard.validate_path(entry.path()) {
                Ok(path) => {
                    tracing::debug!(%platform, path = %path.display(), pattern = pattern.as_str(), "located");
                    targets.push(PatchTarget { path, platform });
                }
                Err(err) => {
                    tracing::warn!(%platform, path = %entry.path().display(), "skipping file: {err}");
                }
            }
        }

        Ok(targets)
    }
}

/// Build output and hidden entries are never descended into or matched.
fn is_excluded(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && name == BUILD_DIR)
}
