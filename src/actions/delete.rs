//! Deletion of duplicate candidate files.
//!
//! # Overview
//!
//! Deletion is an explicit step that runs after classification, never inside
//! it. Only outcomes classified as duplicates are touched, and each one is
//! checked again right before removal:
//! - the path must not lie inside the protected reference root
//! - the path must resolve to somewhere inside the candidate root, so a
//!   symlink out of the candidate tree never removes a foreign file
//! - the file is re-hashed and must still match the digest it was
//!   classified with
//!
//! Files go to the system trash unless permanent deletion is configured.
//! Failures are collected and recorded, and never stop the batch. When
//! several candidate paths resolve to the same file, the first deletion
//! handles all of them and the later aliases are skipped.
//!
//! # Example
//!
//! ```no_run
//! use refdupe::actions::delete::{delete_duplicates, DeleteConfig};
//! use refdupe::duplicates::DuplicateClassifier;
//! use refdupe::error_sink::ErrorSink;
//! use std::path::Path;
//!
//! let classifier = DuplicateClassifier::with_defaults();
//! let mut sink = ErrorSink::new();
//! let run = classifier
//!     .classify(Path::new("/originals"), Path::new("/recovered"), &mut sink)
//!     .unwrap();
//!
//! let config = DeleteConfig::trash()
//!     .with_protected_root("/originals")
//!     .with_candidate_root("/recovered");
//! let result = delete_duplicates(&run.outcomes, classifier.hasher(), &config, &mut sink);
//! println!("{}", result.summary());
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::ClassificationOutcome;
use crate::error_sink::{ErrorKind, ErrorSink};
use crate::scanner::{HashError, Hasher};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File content changed since it was classified.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// File lies inside the reference tree.
    #[error("refusing to delete {0}: inside the reference tree")]
    Protected(PathBuf),

    /// File resolves to somewhere outside the candidate tree.
    #[error("refusing to delete {0}: resolves outside the candidate tree")]
    OutsideCandidate(PathBuf),

    /// Outcome is not a duplicate.
    #[error("refusing to delete {0}: not a duplicate")]
    NotDuplicate(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Path the error relates to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::Protected(p)
            | Self::OutsideCandidate(p)
            | Self::NotDuplicate(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

impl From<HashError> for DeleteError {
    fn from(e: HashError) -> Self {
        match e {
            HashError::NotFound(p) => Self::NotFound(p),
            HashError::PermissionDenied(p) => Self::PermissionDenied(p),
            HashError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Paths skipped because the file they resolve to was already deleted
    /// through another path.
    pub aliases: Vec<PathBuf>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Configuration for deletion.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
    /// Canonical root that must never be touched.
    pub protected_root: Option<PathBuf>,
    /// Canonical root every deleted file must resolve into.
    pub candidate_root: Option<PathBuf>,
}

impl DeleteConfig {
    /// Move files to the system trash.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Remove files permanently.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            ..Self::default()
        }
    }

    /// Refuse to delete anything inside `root`.
    ///
    /// The root is canonicalised when possible so it compares equal to
    /// canonicalised file paths.
    #[must_use]
    pub fn with_protected_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.protected_root = Some(canonical_or_given(root));
        self
    }

    /// Refuse to delete anything that does not resolve into `root`.
    #[must_use]
    pub fn with_candidate_root(mut self, root: impl AsRef<Path>) -> Self {
        self.candidate_root = Some(canonical_or_given(root.as_ref()));
        self
    }
}

fn canonical_or_given(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({})", path.display(), ByteSize::b(size));
    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: false,
    })
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `PermanentDeleteFailed` if the removal fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Permanently deleted: {} ({})", path.display(), ByteSize::b(size));
    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        permanent: true,
    })
}

/// Fail with `Protected` if `path` resolves to somewhere inside `root`.
///
/// `root` is expected to be canonical.
///
/// # Errors
///
/// `Protected` for paths inside `root`; `NotFound` and friends if `path`
/// cannot be resolved.
pub fn ensure_unprotected(path: &Path, root: &Path) -> Result<(), DeleteError> {
    let resolved = fs::canonicalize(path).map_err(|e| DeleteError::from_io(path, e))?;
    if resolved.starts_with(root) {
        log::warn!(
            "Refusing to delete {}: resolves into reference tree {}",
            path.display(),
            root.display()
        );
        return Err(DeleteError::Protected(path.to_path_buf()));
    }
    Ok(())
}

/// Fail with `OutsideCandidate` unless `path` resolves to somewhere inside
/// `root`.
///
/// `root` is expected to be canonical.
///
/// # Errors
///
/// `OutsideCandidate` for paths that escape `root`; `NotFound` and friends
/// if `path` cannot be resolved.
pub fn ensure_inside(path: &Path, root: &Path) -> Result<(), DeleteError> {
    let resolved = fs::canonicalize(path).map_err(|e| DeleteError::from_io(path, e))?;
    if !resolved.starts_with(root) {
        log::warn!(
            "Refusing to delete {}: resolves to {} outside candidate tree {}",
            path.display(),
            resolved.display(),
            root.display()
        );
        return Err(DeleteError::OutsideCandidate(path.to_path_buf()));
    }
    Ok(())
}

/// Delete one classified duplicate after re-checking it.
///
/// # Errors
///
/// - `NotDuplicate` unless the outcome is a duplicate with a digest
/// - `Protected` if the file resolves into the protected root
/// - `OutsideCandidate` if the file resolves outside the candidate root
/// - `Modified` if the file's digest no longer matches
/// - Any error from the deletion itself
pub fn delete_verified(
    outcome: &ClassificationOutcome,
    hasher: &Hasher,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    let path = outcome.path.as_path();
    let expected = match outcome.digest {
        Some(digest) if outcome.is_duplicate => digest,
        _ => return Err(DeleteError::NotDuplicate(path.to_path_buf())),
    };

    if let Some(ref root) = config.protected_root {
        ensure_unprotected(path, root)?;
    }
    if let Some(ref root) = config.candidate_root {
        ensure_inside(path, root)?;
    }

    let current = hasher.full_hash(path)?;
    if current != expected {
        log::warn!(
            "File modified since scan: {} ({} -> {})",
            path.display(),
            expected,
            current
        );
        return Err(DeleteError::Modified(path.to_path_buf()));
    }

    if config.permanent {
        permanent_delete(path)
    } else {
        delete_to_trash(path)
    }
}

/// Delete every duplicate in `outcomes`.
///
/// Non-duplicates are skipped silently. Each failure is kept in the result
/// and recorded in `sink` (kind `Delete`); the batch always runs to the end.
///
/// Every path is resolved before anything is removed. A path whose target
/// was already deleted through an earlier path is listed in
/// [`BatchDeleteResult::aliases`] instead of failing.
pub fn delete_duplicates(
    outcomes: &[ClassificationOutcome],
    hasher: &Hasher,
    config: &DeleteConfig,
    sink: &mut ErrorSink,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    let targets: Vec<(&ClassificationOutcome, Option<PathBuf>)> = outcomes
        .iter()
        .filter(|o| o.is_duplicate)
        .map(|o| (o, fs::canonicalize(&o.path).ok()))
        .collect();
    let mut removed: HashSet<PathBuf> = HashSet::new();

    for (outcome, target) in targets {
        if let Some(ref target) = target {
            if removed.contains(target) {
                log::debug!(
                    "Already deleted through another path: {} -> {}",
                    outcome.path.display(),
                    target.display()
                );
                result.aliases.push(outcome.path.clone());
                continue;
            }
        }

        match delete_verified(outcome, hasher, config) {
            Ok(deleted) => {
                // Removing a symlink leaves its target in place.
                if let Some(target) = target {
                    if fs::symlink_metadata(&target).is_err() {
                        removed.insert(target);
                    }
                }
                result.bytes_freed += deleted.size;
                result.successes.push(deleted);
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Failed to delete {}: {}", outcome.path.display(), message);
                sink.record(ErrorKind::Delete, &outcome.path, message.clone());
                result.failures.push((outcome.path.clone(), message));
            }
        }
    }

    log::info!("{}", result.summary());
    result
}
