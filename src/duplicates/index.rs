//! Sharded digest index for the reference tree.
//!
//! # Overview
//!
//! [`HashIndex`] holds the digests of every reference file that hashed
//! successfully, split into 256 shards by the digest's leading byte. Each
//! shard is sorted and de-duplicated when the build finishes, so a lookup is a
//! binary search inside a single shard and never touches the others.
//!
//! The index is only ever produced by [`HashIndex::build`] (or
//! [`HashIndex::from_digests`]) and exposes no mutation afterwards, which
//! makes shared read access from several threads safe without locking.
//!
//! # Example
//!
//! ```no_run
//! use refdupe::duplicates::HashIndex;
//! use refdupe::error_sink::ErrorSink;
//! use refdupe::scanner::Hasher;
//! use std::path::PathBuf;
//!
//! let files = vec![PathBuf::from("ref/a.txt"), PathBuf::from("ref/b.txt")];
//! let hasher = Hasher::new();
//! let mut sink = ErrorSink::new();
//!
//! let index = HashIndex::build(&files, &hasher, &mut sink, None);
//! let probe = hasher.full_hash(std::path::Path::new("candidate/a.txt")).unwrap();
//! println!("duplicate: {}", index.contains(&probe));
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::error_sink::{ErrorKind, ErrorSink};
use crate::progress::ProgressCallback;
use crate::scanner::{Digest, HashAlgorithm, Hasher};

/// Number of shards: one per possible leading byte.
pub const SHARD_COUNT: usize = 256;

/// Counters from building an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Reference files offered to the build
    pub input_files: usize,
    /// Files hashed and inserted
    pub hashed_files: usize,
    /// Files that could not be hashed
    pub failed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
}

/// Immutable set of reference digests, sharded by leading byte.
#[derive(Debug, Clone)]
pub struct HashIndex {
    shards: Vec<Vec<Digest>>,
    algorithm: HashAlgorithm,
    len: usize,
    stats: IndexStats,
}

impl HashIndex {
    /// Hash every reference file and index the successful digests.
    ///
    /// A file that fails to hash is recorded in `sink` (kind `Read`) and
    /// skipped; one bad file never aborts the build.
    pub fn build(
        files: &[PathBuf],
        hasher: &Hasher,
        sink: &mut ErrorSink,
        progress: Option<&Arc<dyn ProgressCallback>>,
    ) -> Self {
        let mut builder = IndexBuilder::new(hasher.algorithm());
        let mut stats = IndexStats {
            input_files: files.len(),
            ..IndexStats::default()
        };

        if let Some(callback) = progress {
            callback.on_phase_start("index", files.len());
        }

        for (i, path) in files.iter().enumerate() {
            match hasher.hash_file(path) {
                Ok(hashed) => {
                    builder.insert(hashed.digest);
                    stats.hashed_files += 1;
                    stats.bytes_hashed += hashed.bytes;
                }
                Err(e) => {
                    log::warn!("Failed to hash reference file: {}", e);
                    sink.record(ErrorKind::Read, path, e.to_string());
                    stats.failed_files += 1;
                }
            }

            if let Some(callback) = progress {
                callback.on_progress(i + 1, &path.to_string_lossy());
            }
        }

        if let Some(callback) = progress {
            callback.on_phase_end("index");
        }

        let mut index = builder.finish();
        index.stats = stats;
        log::info!(
            "Index built: {} distinct digests from {} files ({} failed)",
            index.len(),
            stats.hashed_files,
            stats.failed_files
        );
        index
    }

    /// Build an index directly from digests.
    pub fn from_digests<I>(algorithm: HashAlgorithm, digests: I) -> Self
    where
        I: IntoIterator<Item = Digest>,
    {
        let mut builder = IndexBuilder::new(algorithm);
        for digest in digests {
            builder.insert(digest);
        }
        builder.finish()
    }

    /// Whether `digest` was inserted during the build.
    ///
    /// Only the shard selected by the digest's leading byte is searched.
    #[must_use]
    pub fn contains(&self, digest: &Digest) -> bool {
        self.shards[usize::from(digest.shard())]
            .binary_search(digest)
            .is_ok()
    }

    /// Algorithm every digest in this index was produced with.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no digests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of digests in one shard.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= SHARD_COUNT`.
    #[must_use]
    pub fn shard_len(&self, shard: usize) -> usize {
        self.shards[shard].len()
    }

    /// Size of the fullest shard.
    #[must_use]
    pub fn largest_shard(&self) -> usize {
        self.shards.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Counters from the build (zeroed for [`HashIndex::from_digests`]).
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

/// Mutable phase of an index; consumed by [`IndexBuilder::finish`].
struct IndexBuilder {
    shards: Vec<Vec<Digest>>,
    algorithm: HashAlgorithm,
}

impl IndexBuilder {
    fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            shards: vec![Vec::new(); SHARD_COUNT],
            algorithm,
        }
    }

    fn insert(&mut self, digest: Digest) {
        self.shards[usize::from(digest.shard())].push(digest);
    }

    fn finish(mut self) -> HashIndex {
        for shard in &mut self.shards {
            shard.sort_unstable();
            shard.dedup();
            shard.shrink_to_fit();
        }
        let len = self.shards.iter().map(Vec::len).sum();
        HashIndex {
            shards: self.shards,
            algorithm: self.algorithm,
            len,
            stats: IndexStats::default(),
        }
    }
}
