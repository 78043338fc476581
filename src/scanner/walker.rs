//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! [`Walker`] recursively lists every regular file under a root. It is
//! deliberately single-threaded: paths are produced in discovery order
//! (children sorted by file name, so unchanged trees enumerate identically on
//! every run).
//!
//! Per-entry failures (permission denied, vanished entries, symlink loops) are
//! yielded as [`ScanError`] values and never stop the walk. Only a failure to
//! open the root itself ends enumeration.
//!
//! # Example
//!
//! ```no_run
//! use refdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/mnt/recovered"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ScanError, WalkerConfig};
use crate::error_sink::ErrorSink;

/// Files discovered under one root, in discovery order.
///
/// The same file may appear more than once when symlinks lead back into the
/// tree; the enumerator does not de-duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// The root that was walked
    pub root: PathBuf,
    /// Regular files found under the root
    pub files: Vec<PathBuf>,
    /// Entries that could not be visited
    pub errors: usize,
}

impl ScanResult {
    /// Number of files found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Recursive file enumerator for one root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// The root is not validated here; that is the caller's job.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// The root this walker visits.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory tree, yielding file paths.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A failure on the root itself is yielded as
    /// [`ScanError::RootUnreadable`] and, since there is nothing below it to
    /// visit, is the only item produced.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    // Skip the root directory itself
                    if entry.depth() == 0 {
                        return None;
                    }

                    // With follow_links this is the target's type, so
                    // symlinked files are emitted and symlinked directories
                    // are only descended into.
                    if entry.file_type().is_file() {
                        Some(Ok(entry.into_path()))
                    } else {
                        if entry.path_is_symlink() && !self.config.follow_symlinks {
                            log::trace!("Skipping symlink: {}", entry.path().display());
                        }
                        None
                    }
                }
                Err(e) => Some(Err(self.convert_error(e))),
            })
    }

    /// Enumerate every regular file, recording per-entry failures in `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::RootUnreadable`] if the root cannot be opened. In
    /// that case exactly one record (kind `Path`) is added to `sink` and no
    /// files are returned.
    pub fn enumerate(&self, sink: &mut ErrorSink) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult {
            root: self.root.clone(),
            ..ScanResult::default()
        };

        for item in self.walk() {
            match item {
                Ok(path) => result.files.push(path),
                Err(e @ ScanError::RootUnreadable { .. }) => {
                    log::error!("{}", e);
                    sink.record(e.kind(), e.path(), e.to_string());
                    return Err(e);
                }
                Err(e) => {
                    result.errors += 1;
                    sink.record(e.kind(), e.path(), e.to_string());
                }
            }
        }

        log::debug!(
            "Enumerated {} files under {} ({} entries skipped)",
            result.files.len(),
            self.root.display(),
            result.errors
        );
        Ok(result)
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.depth() == 0 {
            return ScanError::RootUnreadable {
                path,
                message: error
                    .io_error()
                    .map_or_else(|| error.to_string(), ToString::to_string),
            };
        }

        if let Some(ancestor) = error.loop_ancestor() {
            log::warn!(
                "Symlink loop: {} -> {}",
                path.display(),
                ancestor.display()
            );
            return ScanError::Loop {
                ancestor: ancestor.to_path_buf(),
                path,
            };
        }

        let kind = error.io_error().map(io::Error::kind);
        match kind {
            Some(io::ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(io::ErrorKind::NotFound) => {
                log::debug!("Entry vanished during walk: {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("walk error"));
                ScanError::Io { path, source }
            }
        }
    }
}
