//! Layered configuration and the input validation boundary.
//!
//! [`Config`] is assembled by `figment` from, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. The user config file (`config.toml` in the platform config directory)
//! 3. An explicit `--config FILE`
//! 4. `REFDUPE_*` environment variables (e.g. `REFDUPE_ALGORITHM=md5`)
//! 5. Command-line flags ([`Config::apply_cli`])
//!
//! [`RunConfig::validate`] then checks the two roots and produces the only
//! configuration the core ever sees.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::ClassifierConfig;
use crate::error::ConfigError;
use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_CHUNK_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "REFDUPE_";

/// Default error log file name, relative to the working directory.
pub const DEFAULT_ERROR_LOG: &str = "Errors.log";

/// User-adjustable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Chunk threshold in bytes.
    pub chunk_size: usize,
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Error log destination.
    pub error_log: PathBuf,
    /// Keep at most this many error records (all are still counted).
    pub error_cap: Option<usize>,
    /// Report format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            follow_symlinks: true,
            error_log: PathBuf::from(DEFAULT_ERROR_LOG),
            error_cap: None,
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Platform-specific user config file path, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "refdupe", "refdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment with every layer below the command line.
    ///
    /// Missing files are skipped by the TOML provider.
    #[must_use]
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user) = Self::default_path() {
            figment = figment.merge(Toml::file(user));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults, the user file, `explicit` and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] for malformed TOML or mistyped values,
    /// and [`ConfigError::NotFound`] if `explicit` names a missing file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }
        let config: Config = Self::figment(explicit).extract().map_err(Box::new)?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Load defaults plus a single TOML file, ignoring the user file and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] for malformed TOML or mistyped values.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Render the settings as a TOML document suitable for `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value has no TOML representation.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply command-line flags on top of the loaded layers.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(chunk_size) = cli.chunk_size {
            self.chunk_size = usize::try_from(chunk_size).unwrap_or(usize::MAX);
        }
        if cli.no_follow_symlinks {
            self.follow_symlinks = false;
        }
        if let Some(ref error_log) = cli.error_log {
            self.error_log.clone_from(error_log);
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Reference root as given
    pub reference: PathBuf,
    /// Candidate root as given
    pub candidate: PathBuf,
    /// Canonical reference root, used to protect it from deletion
    pub reference_canonical: PathBuf,
    /// Canonical candidate root
    pub candidate_canonical: PathBuf,
    /// Settings that passed validation
    pub settings: Config,
}

impl RunConfig {
    /// Check both roots and the settings.
    ///
    /// Both roots must exist and be directories. They must not be the same
    /// directory (compared literally and after canonicalisation) and neither
    /// may contain the other.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(
        reference: &Path,
        candidate: &Path,
        settings: Config,
    ) -> Result<Self, ConfigError> {
        if settings.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chunk_size",
                message: "must be at least 1 byte".to_string(),
            });
        }
        if settings.error_cap == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "error_cap",
                message: "must be at least 1 record".to_string(),
            });
        }

        if reference == candidate {
            return Err(ConfigError::SamePath(reference.to_path_buf()));
        }

        let reference_canonical = resolve_dir(reference)?;
        let candidate_canonical = resolve_dir(candidate)?;

        if reference_canonical == candidate_canonical {
            return Err(ConfigError::SamePath(reference_canonical));
        }
        if candidate_canonical.starts_with(&reference_canonical) {
            return Err(ConfigError::Nested {
                outer: reference.to_path_buf(),
                inner: candidate.to_path_buf(),
            });
        }
        if reference_canonical.starts_with(&candidate_canonical) {
            return Err(ConfigError::Nested {
                outer: candidate.to_path_buf(),
                inner: reference.to_path_buf(),
            });
        }

        Ok(Self {
            reference: reference.to_path_buf(),
            candidate: candidate.to_path_buf(),
            reference_canonical,
            candidate_canonical,
            settings,
        })
    }

    /// Classifier configuration for these settings.
    #[must_use]
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::default()
            .with_algorithm(self.settings.algorithm)
            .with_chunk_size(self.settings.chunk_size)
            .with_walker_config(
                WalkerConfig::default().with_follow_symlinks(self.settings.follow_symlinks),
            )
    }
}

fn resolve_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let metadata = fs::metadata(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Unresolvable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    fs::canonicalize(path).map_err(|source| ConfigError::Unresolvable {
        path: path.to_path_buf(),
        source,
    })
}
