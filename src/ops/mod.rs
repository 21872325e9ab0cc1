//! Patch operations, one module per targeted file kind.
//!
//! Every operation runs the same loop: ask the locator for targets, load each
//! one with an explicitly chosen [`Format`], mutate it, and write it back only
//! when the bytes changed.

pub mod ats;
pub mod config_xml;
pub mod content_policy;
pub mod electron_main;
pub mod manifest_json;
pub mod start_page;
pub mod windows_appx;

use crate::edit::{write_atomic, EditError};
use crate::format::{Format, FormatError};
use crate::locator::{FilePattern, LocateError, PatchTarget};
use crate::platform::Platform;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StartPage,
    ContentPolicy,
    ConfigXml,
    ManifestJson,
    TransportSecurity,
    WindowsAppx,
    ElectronMain,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::StartPage => "start-page",
            Operation::ContentPolicy => "content-security-policy",
            Operation::ConfigXml => "config.xml",
            Operation::ManifestJson => "manifest.json",
            Operation::TransportSecurity => "app-transport-security",
            Operation::WindowsAppx => "appxmanifest",
            Operation::ElectronMain => "electron-main",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    /// File was rewritten (or created)
    Applied,
    /// File already held the patched content; nothing was written
    Unchanged,
    /// File matched the pattern but is not a target for this operation
    Skipped { reason: String },
    /// The operation tolerated a failure on this file and moved on
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for success/failure"]
pub struct PatchOutcome {
    pub operation: Operation,
    pub platform: Platform,
    pub file: PathBuf,
    pub status: PatchStatus,
}

impl PatchOutcome {
    fn new(operation: Operation, target: &PatchTarget, status: PatchStatus) -> Self {
        Self {
            operation,
            platform: target.platform,
            file: target.path.clone(),
            status,
        }
    }

    fn written(operation: Operation, target: &PatchTarget, written: bool) -> Self {
        let status = if written {
            PatchStatus::Applied
        } else {
            PatchStatus::Unchanged
        };
        Self::new(operation, target, status)
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.display();
        match &self.status {
            PatchStatus::Applied => write!(f, "[{}] {}: patched {}", self.platform, self.operation, file),
            PatchStatus::Unchanged => {
                write!(f, "[{}] {}: already patched {}", self.platform, self.operation, file)
            }
            PatchStatus::Skipped { reason } => {
                write!(f, "[{}] {}: skipped {} ({})", self.platform, self.operation, file, reason)
            }
            PatchStatus::Failed { reason } => {
                write!(f, "[{}] {}: failed on {}: {}", self.platform, self.operation, file, reason)
            }
        }
    }
}

/// Outcomes of one lifecycle call, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    outcomes: Vec<PatchOutcome>,
}

impl PatchReport {
    pub fn outcomes(&self) -> &[PatchOutcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatchOutcome> {
        self.outcomes.iter()
    }

    pub fn for_operation(&self, operation: Operation) -> impl Iterator<Item = &PatchOutcome> {
        self.outcomes
            .iter()
            .filter(move |outcome| outcome.operation == operation)
    }

    pub fn applied(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Applied))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, PatchStatus::Failed { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub(crate) fn extend(&mut self, outcomes: Vec<PatchOutcome>) {
        self.outcomes.extend(outcomes);
    }

    fn count(&self, pred: impl Fn(&PatchStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

impl IntoIterator for PatchReport {
    type Item = PatchOutcome;
    type IntoIter = std::vec::IntoIter<PatchOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot patch {path}: {source}")]
    Format { path: PathBuf, source: FormatError },

    #[error("edit error: {0}")]
    Edit(#[from] EditError),
}

impl PatchError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            PatchError::Io { path, .. } | PatchError::Format { path, .. } => Some(path.as_path()),
            PatchError::Edit(EditError::Io { path, .. })
            | PatchError::Edit(EditError::BeforeTextMismatch { file: path, .. }) => {
                Some(path.as_path())
            }
            _ => None,
        }
    }
}

/// Compile one of the fixed patterns the operations use.
pub(crate) fn pattern(glob: &str) -> Result<FilePattern, PatchError> {
    Ok(FilePattern::new(glob)?)
}

/// Load `path` as `F`, let `mutate` edit it, and write it back if it changed.
///
/// Returns whether the file was written.
pub(crate) fn rewrite_document<F, M>(path: &Path, mutate: M) -> Result<bool, PatchError>
where
    F: Format,
    M: FnOnce(&mut F::Document) -> Result<(), PatchError>,
{
    let bytes = fs::read(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let format_error = |source: FormatError| PatchError::Format {
        path: path.to_path_buf(),
        source,
    };

    let mut document = F::parse(&bytes).map_err(format_error)?;
    mutate(&mut document)?;
    let output = F::serialize(&document).map_err(format_error)?;

    if output == bytes {
        return Ok(false);
    }
    write_atomic(path, &output)?;
    tracing::info!(path = %path.display(), format = F::NAME, "rewrote");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::JsonFormat;

    fn target(path: &str) -> PatchTarget {
        PatchTarget {
            path: PathBuf::from(path),
            platform: Platform::Ios,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = PatchReport::default();
        report.extend(vec![
            PatchOutcome::written(Operation::ConfigXml, &target("/a"), true),
            PatchOutcome::written(Operation::ConfigXml, &target("/b"), false),
            PatchOutcome::new(
                Operation::TransportSecurity,
                &target("/c"),
                PatchStatus::Failed {
                    reason: "bad plist".to_string(),
                },
            ),
        ]);

        assert_eq!(report.applied(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 0);
        assert_eq!(report.for_operation(Operation::ConfigXml).count(), 2);
    }

    #[test]
    fn test_outcome_display() {
        let failed = PatchOutcome::new(
            Operation::TransportSecurity,
            &target("/x/Info.plist"),
            PatchStatus::Failed {
                reason: "parse error".to_string(),
            },
        );
        let text = failed.to_string();
        assert!(text.contains("[ios]"));
        assert!(text.contains("failed on /x/Info.plist"));

        let applied = PatchOutcome::written(Operation::StartPage, &target("/x/s.html"), true);
        assert!(applied.to_string().contains("patched"));
    }

    #[test]
    fn test_rewrite_document_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{ broken").unwrap();

        let err = rewrite_document::<JsonFormat, _>(&path, |_| Ok(())).unwrap_err();
        assert!(matches!(err, PatchError::Format { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn test_rewrite_document_skips_identical_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{\n  \"a\": 1\n}").unwrap();

        assert!(!rewrite_document::<JsonFormat, _>(&path, |_| Ok(())).unwrap());
        assert!(rewrite_document::<JsonFormat, _>(&path, |doc| {
            doc["a"] = 2.into();
            Ok(())
        })
        .unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"a\": 2\n}");
    }

    #[test]
    fn test_rewrite_document_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            rewrite_document::<JsonFormat, _>(&dir.path().join("nope.json"), |_| Ok(())).unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
    }
}
