//! Reference/candidate duplicate classification.
//!
//! # Overview
//!
//! [`DuplicateClassifier`] runs the whole scan-hash-compare pipeline:
//! 1. **Enumerate** both trees (failing fast if either root cannot be opened)
//! 2. **Index** every reference file into a [`HashIndex`]
//! 3. **Classify** each candidate file: duplicate if and only if its digest is
//!    in the index
//!
//! A candidate that cannot be hashed is recorded in the [`ErrorSink`] and
//! reported as [`OutcomeStatus::Unknown`]. It never counts as a duplicate or
//! as unique.
//!
//! The classifier neither deletes nor prints; callers act on the returned
//! [`ClassificationOutcome`]s.
//!
//! # Example
//!
//! ```no_run
//! use refdupe::duplicates::{ClassifierConfig, DuplicateClassifier};
//! use refdupe::error_sink::ErrorSink;
//! use std::path::Path;
//!
//! let classifier = DuplicateClassifier::new(ClassifierConfig::default());
//! let mut sink = ErrorSink::new();
//! let result = classifier
//!     .classify(Path::new("/data/originals"), Path::new("/data/recovered"), &mut sink)
//!     .unwrap();
//!
//! for outcome in result.duplicates() {
//!     println!("{}", outcome.path.display());
//! }
//! println!("{} duplicates, {} errors", result.summary.duplicates, result.summary.errors);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::index::HashIndex;
use crate::error_sink::{ErrorKind, ErrorSink};
use crate::progress::ProgressCallback;
use crate::scanner::{Digest, HashAlgorithm, Hasher, ScanError, ScanResult, Walker, WalkerConfig};

/// Which side of the comparison a tree is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeRole {
    /// The authoritative tree, never modified
    Reference,
    /// The tree checked against the reference
    Candidate,
}

impl fmt::Display for TreeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeRole::Reference => write!(f, "reference"),
            TreeRole::Candidate => write!(f, "candidate"),
        }
    }
}

/// Configuration for the classifier.
#[derive(Clone)]
pub struct ClassifierConfig {
    /// Digest algorithm for both trees.
    pub algorithm: HashAlgorithm,
    /// Files larger than this are hashed in chunks of this size.
    pub chunk_size: usize,
    /// Directory walk settings, shared by both trees.
    pub walker_config: WalkerConfig,
    /// Optional progress observer.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("algorithm", &self.algorithm)
            .field("chunk_size", &self.chunk_size)
            .field("walker_config", &self.walker_config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: crate::scanner::DEFAULT_CHUNK_SIZE,
            walker_config: WalkerConfig::default(),
            progress_callback: None,
        }
    }
}

impl ClassifierConfig {
    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the chunk threshold in bytes.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Classification of one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Content already present in the reference tree
    Duplicate,
    /// Content not present in the reference tree
    Unique,
    /// The file could not be hashed
    Unknown,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Duplicate => write!(f, "duplicate"),
            OutcomeStatus::Unique => write!(f, "unique"),
            OutcomeStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result for a single candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationOutcome {
    /// Candidate file path
    pub path: PathBuf,
    /// Content digest, `None` if hashing failed
    pub digest: Option<Digest>,
    /// Whether the digest is present in the reference index
    pub is_duplicate: bool,
}

impl ClassificationOutcome {
    /// Three-way status derived from the digest and the duplicate flag.
    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        match (self.digest, self.is_duplicate) {
            (None, _) => OutcomeStatus::Unknown,
            (Some(_), true) => OutcomeStatus::Duplicate,
            (Some(_), false) => OutcomeStatus::Unique,
        }
    }
}

/// Summary counts for one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifySummary {
    /// Files found under the reference root
    pub reference_files: usize,
    /// Files found under the candidate root
    pub candidate_files: usize,
    /// Reference files successfully hashed into the index
    pub reference_hashed: usize,
    /// Candidate files successfully hashed
    pub candidate_hashed: usize,
    /// Distinct digests in the reference index
    pub index_entries: usize,
    /// Candidates whose content exists in the reference tree
    pub duplicates: usize,
    /// Candidates whose content does not exist in the reference tree
    pub unique: usize,
    /// Candidates that could not be hashed
    pub unknown: usize,
    /// Errors recorded during this run (all stages)
    pub errors: usize,
    /// Bytes read while hashing both trees
    pub bytes_hashed: u64,
    /// Wall-clock duration of the run
    #[serde(serialize_with = "serialize_millis", rename = "duration_ms")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Output of [`DuplicateClassifier::classify`].
#[derive(Debug, Clone)]
pub struct Classification {
    /// One outcome per candidate file, in enumeration order
    pub outcomes: Vec<ClassificationOutcome>,
    /// Summary counts
    pub summary: ClassifySummary,
    /// Algorithm used for every digest in this run
    pub algorithm: HashAlgorithm,
}

impl Classification {
    /// Outcomes classified as duplicates.
    pub fn duplicates(&self) -> impl Iterator<Item = &ClassificationOutcome> {
        self.outcomes.iter().filter(|o| o.is_duplicate)
    }
}

/// Errors that abort a classification run.
#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    /// A root directory could not be opened.
    #[error("Cannot scan {role} tree: {source}")]
    Root {
        /// Which tree failed
        role: TreeRole,
        /// The underlying scan error
        #[source]
        source: ScanError,
    },
}

/// Orchestrates enumeration, index build and candidate classification.
pub struct DuplicateClassifier {
    config: ClassifierConfig,
    hasher: Hasher,
}

impl DuplicateClassifier {
    /// Create a classifier with the given configuration.
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        let hasher = Hasher::new()
            .with_algorithm(config.algorithm)
            .with_chunk_size(config.chunk_size);
        Self { config, hasher }
    }

    /// Create a classifier with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ClassifierConfig::default())
    }

    /// The hasher used for both trees.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Classify every file under `candidate` against the content of
    /// `reference`.
    ///
    /// Both roots are expected to be distinct, existing directories; that is
    /// checked by [`crate::config::RunConfig::validate`] before this runs.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Root`] if either root cannot be opened. Every
    /// other failure is recorded in `sink` and the run continues.
    pub fn classify(
        &self,
        reference: &Path,
        candidate: &Path,
        sink: &mut ErrorSink,
    ) -> Result<Classification, ClassifyError> {
        let start_time = Instant::now();
        let errors_before = sink.total();

        log::info!(
            "Comparing {} against reference {} ({})",
            candidate.display(),
            reference.display(),
            self.hasher.algorithm()
        );

        let reference_scan = self.enumerate(reference, TreeRole::Reference, sink)?;
        let candidate_scan = self.enumerate(candidate, TreeRole::Candidate, sink)?;

        log::info!(
            "Found {} reference files and {} candidate files",
            reference_scan.len(),
            candidate_scan.len()
        );

        let index = HashIndex::build(
            &reference_scan.files,
            &self.hasher,
            sink,
            self.config.progress_callback.as_ref(),
        );

        let (outcomes, candidate_bytes) = self.classify_files(&index, &candidate_scan.files, sink);

        let mut summary = ClassifySummary {
            reference_files: reference_scan.len(),
            candidate_files: candidate_scan.len(),
            reference_hashed: index.stats().hashed_files,
            index_entries: index.len(),
            bytes_hashed: index.stats().bytes_hashed + candidate_bytes,
            ..ClassifySummary::default()
        };
        for outcome in &outcomes {
            match outcome.status() {
                OutcomeStatus::Duplicate => summary.duplicates += 1,
                OutcomeStatus::Unique => summary.unique += 1,
                OutcomeStatus::Unknown => summary.unknown += 1,
            }
        }
        summary.candidate_hashed = summary.duplicates + summary.unique;
        summary.errors = sink.total() - errors_before;
        summary.duration = start_time.elapsed();

        log::info!(
            "Duplicate search complete: {} duplicates, {} unique, {} unknown, {} errors",
            summary.duplicates,
            summary.unique,
            summary.unknown,
            summary.errors
        );

        Ok(Classification {
            outcomes,
            summary,
            algorithm: self.hasher.algorithm(),
        })
    }

    /// Classify already-enumerated candidate files against a built index.
    ///
    /// Returns one outcome per input path, in input order, plus the number of
    /// bytes hashed. Hash failures are recorded in `sink` (kind `Read`).
    ///
    /// # Panics
    ///
    /// Debug builds assert that `index` was built with this classifier's
    /// algorithm.
    pub fn classify_files(
        &self,
        index: &HashIndex,
        files: &[PathBuf],
        sink: &mut ErrorSink,
    ) -> (Vec<ClassificationOutcome>, u64) {
        debug_assert_eq!(index.algorithm(), self.hasher.algorithm());

        let callback = self.config.progress_callback.as_ref();
        if let Some(callback) = callback {
            callback.on_phase_start("classify", files.len());
        }

        let mut outcomes = Vec::with_capacity(files.len());
        let mut duplicates = 0usize;
        let mut bytes = 0u64;

        for (i, path) in files.iter().enumerate() {
            let outcome = match self.hasher.hash_file(path) {
                Ok(hashed) => {
                    bytes += hashed.bytes;
                    let is_duplicate = index.contains(&hashed.digest);
                    if is_duplicate {
                        duplicates += 1;
                        log::debug!("Duplicate: {}", path.display());
                        if let Some(callback) = callback {
                            callback.on_duplicate(duplicates);
                        }
                    }
                    ClassificationOutcome {
                        path: path.clone(),
                        digest: Some(hashed.digest),
                        is_duplicate,
                    }
                }
                Err(e) => {
                    log::warn!("Failed to hash candidate file: {}", e);
                    sink.record(ErrorKind::Read, path, e.to_string());
                    ClassificationOutcome {
                        path: path.clone(),
                        digest: None,
                        is_duplicate: false,
                    }
                }
            };
            outcomes.push(outcome);

            if let Some(callback) = callback {
                callback.on_progress(i + 1, &path.to_string_lossy());
            }
        }

        if let Some(callback) = callback {
            callback.on_phase_end("classify");
        }

        (outcomes, bytes)
    }

    fn enumerate(
        &self,
        root: &Path,
        role: TreeRole,
        sink: &mut ErrorSink,
    ) -> Result<ScanResult, ClassifyError> {
        let callback = self.config.progress_callback.as_ref();
        if let Some(callback) = callback {
            callback.on_phase_start("enumerate", 0);
            callback.on_message(&format!("Scanning {} tree {}", role, root.display()));
        }

        let walker = Walker::new(root, self.config.walker_config.clone());
        let result = walker
            .enumerate(sink)
            .map_err(|source| ClassifyError::Root { role, source });

        if let Some(callback) = callback {
            if let Ok(ref scan) = result {
                callback.on_progress(scan.len(), &root.to_string_lossy());
            }
            callback.on_phase_end("enumerate");
        }
        result
    }
}
