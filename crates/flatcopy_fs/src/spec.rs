//! Copy specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cancel::CancelToken;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing destination file conflict policy.
///
/// Flattening can map two source paths onto one destination name
/// (`a_b/x.md` and `a/b_x.md` both become `a_b_x.md`), so this also decides
/// what happens on such collisions inside a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyFileConflictStrategy {
    /// Replace destination file with source file. Last copy wins.
    #[default]
    Overwrite,
    /// Keep destination file and skip current source file.
    Skip,
    /// Record an error and skip this file.
    Error,
}

/// Pattern matching mode for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `copy_tree`.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Character joining relative path components into the flat name.
    pub separator: char,
    /// Conflict behavior for destination files.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Do not write files; record what would be copied.
    pub if_dry_run: bool,
    /// Checked between files; once set, the run stops early.
    pub token_cancel: CancelToken,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            separator: '_',
            rule_conflict_file: EnumCopyFileConflictStrategy::default(),
            if_dry_run: false,
            token_cancel: CancelToken::new(),
        }
    }
}

/// One copy failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// "Top-level call failed" errors (input validation / setup stage).
///
/// Nothing has been copied when one of these is returned.
#[derive(Debug, Error)]
pub enum CopyTreeError {
    /// Separator is a path separator and would rebuild the nesting.
    #[error("Separator {0:?} must not be a path separator")]
    InvalidSeparator(char),
    /// Invalid include/exclude pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Source path does not exist.
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    /// Source path could not be inspected or listed.
    #[error("Failed to inspect source {}: {source}", .path.display())]
    SourceUnreadable {
        /// Source path that failed inspection.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Source path exists but is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Destination is the source directory or lies inside it.
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        .source_dir.display(),
        .destination.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized destination directory.
        destination: PathBuf,
    },
    /// Destination directory could not be created for lack of permission.
    #[error("Permission denied creating destination {}: {source}", .path.display())]
    DestinationPermissionDenied {
        /// Destination path that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Destination directory initialization failed.
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

impl CopyTreeError {
    /// Closest [`io::ErrorKind`] for callers that classify failures.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::InvalidSeparator(_) => io::ErrorKind::InvalidInput,
            Self::InvalidPattern(_) => io::ErrorKind::InvalidInput,
            Self::SourceNotFound(_) => io::ErrorKind::NotFound,
            Self::SourceUnreadable { source, .. } => source.kind(),
            Self::SourceNotDirectory(_) => io::ErrorKind::InvalidInput,
            Self::SourceDestinationOverlap { .. } => io::ErrorKind::InvalidInput,
            Self::DestinationPermissionDenied { .. } => io::ErrorKind::PermissionDenied,
            Self::DestinationInitFailed { .. } => io::ErrorKind::Other,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
