//! Content hasher with bounded-memory chunked reads.
//!
//! # Overview
//!
//! [`Hasher`] turns a file's bytes into a 128-bit [`Digest`]. Files no larger
//! than the chunk threshold are read in one call; larger files are streamed in
//! chunks of exactly that size into an incremental accumulator, so peak memory
//! never exceeds one chunk. Both paths produce identical digests for identical
//! bytes.
//!
//! # Algorithms
//!
//! - [`HashAlgorithm::Blake3`] (default): the first 16 bytes of the BLAKE3
//!   output.
//! - [`HashAlgorithm::Md5`]: plain MD5, matching the uppercase-hex digests of
//!   older duplicate reports.
//!
//! A run must use a single algorithm; digests from different algorithms are
//! never comparable.
//!
//! # Example
//!
//! ```no_run
//! use refdupe::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_algorithm(HashAlgorithm::Md5);
//! let digest = hasher.full_hash(Path::new("photo.jpg")).unwrap();
//! println!("{digest}"); // 32 uppercase hex characters
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use md5::{Digest as _, Md5};
use serde::{Deserialize, Serialize, Serializer};

use super::HashError;

/// Length of a digest in bytes (128 bits).
pub const DIGEST_LEN: usize = 16;

/// Default chunk threshold: 128^4 bytes (256 MiB).
///
/// Files strictly larger than this are streamed in chunks of this size.
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 128 * 128 * 128;

/// A 128-bit content fingerprint.
///
/// Ordered and hashable so it can be used directly as an index key. Renders
/// as 32 uppercase hexadecimal characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Leading byte, used to pick the index shard (0-255).
    #[must_use]
    pub fn shard(&self) -> u8 {
        self.0[0]
    }

    /// Uppercase hexadecimal rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hash_to_hex(self)
    }

    /// Parse a 32-character hex string (either case).
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        hex_to_hash(hex)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Convert a digest to its uppercase hex string.
#[must_use]
pub fn hash_to_hex(digest: &Digest) -> String {
    digest.to_string()
}

/// Parse a hex string back into a digest.
///
/// Returns `None` unless the input is exactly 32 hex digits.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Digest> {
    if hex.len() != DIGEST_LEN * 2 || !hex.is_ascii() {
        return None;
    }
    let mut bytes = [0u8; DIGEST_LEN];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(Digest(bytes))
}

/// Digest function used for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 truncated to 128 bits
    #[default]
    Blake3,
    /// MD5 (compatible with legacy reports)
    Md5,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake3 => write!(f, "blake3"),
            HashAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blake3" => Ok(Self::Blake3),
            "md5" => Ok(Self::Md5),
            other => Err(format!("Unknown hash algorithm: '{other}'")),
        }
    }
}

/// Incremental digest state for one file.
enum Accumulator {
    Blake3(Box<blake3::Hasher>),
    Md5(Md5),
}

impl Accumulator {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Md5(h) => h.update(data),
        }
    }

    fn finalize(self) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        match self {
            Self::Blake3(h) => out.copy_from_slice(&h.finalize().as_bytes()[..DIGEST_LEN]),
            Self::Md5(h) => out.copy_from_slice(&h.finalize()),
        }
        Digest(out)
    }
}

/// A digest together with the number of bytes that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDigest {
    /// Content digest
    pub digest: Digest,
    /// Bytes read from the file
    pub bytes: u64,
}

/// File content hasher.
///
/// Cheap to construct and holds no per-file state, so one instance can be
/// shared across the whole run (and across threads).
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a BLAKE3 hasher with the default chunk threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the chunk threshold (and chunk size) in bytes. Clamped to at least 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured chunk threshold in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Digest an in-memory buffer with the configured algorithm.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Digest {
        let mut acc = Accumulator::new(self.algorithm);
        acc.update(data);
        acc.finalize()
    }

    /// Compute the digest of a file's entire content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, its size cannot be
    /// determined, or a read fails part-way through.
    pub fn full_hash(&self, path: &Path) -> Result<Digest, HashError> {
        self.hash_file(path).map(|f| f.digest)
    }

    /// Compute the digest of a file and report how many bytes were read.
    ///
    /// # Errors
    ///
    /// See [`Hasher::full_hash`].
    pub fn hash_file(&self, path: &Path) -> Result<FileDigest, HashError> {
        let size = fs::metadata(path)
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        if size > self.chunk_size as u64 {
            log::trace!(
                "Streaming {} ({} bytes) in {} byte chunks",
                path.display(),
                size,
                self.chunk_size
            );
            self.hash_streamed(path)
        } else {
            let data = fs::read(path).map_err(|e| HashError::from_io(path, e))?;
            Ok(FileDigest {
                digest: self.hash_bytes(&data),
                bytes: data.len() as u64,
            })
        }
    }

    fn hash_streamed(&self, path: &Path) -> Result<FileDigest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut buffer = vec![0u8; self.chunk_size];
        let mut acc = Accumulator::new(self.algorithm);
        let mut total = 0u64;

        loop {
            let n = read_chunk(&mut file, &mut buffer).map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            acc.update(&buffer[..n]);
            total += n as u64;
        }

        Ok(FileDigest {
            digest: acc.finalize(),
            bytes: total,
        })
    }
}

/// Fill `buf` as far as possible; returns fewer bytes only at end of file.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
