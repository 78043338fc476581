//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Recursive, discovery-ordered file enumeration using walkdir
//! - Chunked content hashing (BLAKE3 or MD5, 128-bit digests)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Streaming content digests
//!
//! # Example
//!
//! ```no_run
//! use refdupe::error_sink::ErrorSink;
//! use refdupe::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let mut sink = ErrorSink::new();
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let scan = walker.enumerate(&mut sink).unwrap();
//!
//! let hasher = Hasher::new();
//! for path in &scan.files {
//!     match hasher.full_hash(path) {
//!         Ok(digest) => println!("{digest}  {}", path.display()),
//!         Err(e) => eprintln!("Warning: {e}"),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

use crate::error_sink::ErrorKind;

// Re-export main types
pub use hasher::{
    hash_to_hex, hex_to_hash, Digest, HashAlgorithm, Hasher, DEFAULT_CHUNK_SIZE, DIGEST_LEN,
};
pub use walker::{ScanResult, Walker};

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    ///
    /// Symlinked directories are descended into and symlinked files are
    /// emitted. Cycles are reported as traversal errors by walkdir.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
        }
    }
}

impl WalkerConfig {
    /// Set symlink following.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root directory itself could not be opened.
    #[error("Cannot open root directory {path}: {message}")]
    RootUnreadable {
        /// The root that failed
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry vanished between discovery and access.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symbolic link points back at one of its ancestors.
    #[error("Symlink loop: {path} points to ancestor {ancestor}")]
    Loop {
        /// The link that closes the loop
        path: PathBuf,
        /// The ancestor it points to
        ancestor: PathBuf,
    },

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Path the error relates to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootUnreadable { path, .. }
            | Self::Loop { path, .. }
            | Self::Io { path, .. } => path,
            Self::PermissionDenied(p) | Self::NotFound(p) => p,
        }
    }

    /// ErrorSink category for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RootUnreadable { .. } => ErrorKind::Path,
            _ => ErrorKind::Traversal,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed to hash.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
