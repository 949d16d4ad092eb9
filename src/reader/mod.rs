//! Configuration readers
//!
//! A reader takes the configuration built so far plus the extras handed on
//! by the previous step, and returns the next configuration and the extras
//! for the step after it. Readers:
//! - [`FileReader`]: merges a section of a YAML / TOML / JSON file
//! - [`ArgReader`]: overrides flattened keys from command-line flags

mod args;
mod file;

pub use args::ArgReader;
pub use file::{FileReader, EXTRA_FILE, EXTRA_FOLDER, EXTRA_SECTION};

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

/// Reader errors
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("section '{section}' not found in {path}")]
    MissingSection { section: String, path: PathBuf },

    #[error("invalid configuration in {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("flattened key '{key}' appears more than once")]
    DuplicateKey { key: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("command line: {0}")]
    CommandLine(#[from] clap::Error),

    #[error("command line: {0}")]
    Matches(#[from] clap::parser::MatchesError),
}

/// Result type for reader operations
pub type ReaderResult<T> = Result<T, ReaderError>;

/// What a reader hands to the next step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderOutput {
    /// Configuration so far; `None` until some reader produced one
    pub config: Option<Config>,

    /// Side-channel values for the next reader
    pub extras: Config,
}

impl ReaderOutput {
    pub fn new(config: Option<Config>, extras: Config) -> Self {
        Self { config, extras }
    }
}

/// One step of a [`crate::Pipeline`]
pub trait ConfigReader: fmt::Display {
    /// Read this layer on top of `config`.
    fn read(&mut self, config: Option<Config>, extras: Config) -> ReaderResult<ReaderOutput>;

    /// Where the last successful read took its values from.
    fn source(&self) -> Option<&ConfigSource> {
        None
    }
}

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOrigin {
    File,
    CommandLine,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::File => write!(f, "file"),
            ConfigOrigin::CommandLine => write!(f, "command line"),
        }
    }
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSource {
    /// Origin of this layer
    pub origin: ConfigOrigin,

    /// Resolved file path (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Selected top-level section (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// SHA-256 digest of the raw file bytes (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Flattened keys overridden by this layer (command line only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl ConfigSource {
    pub fn file(path: String, section: Option<String>, digest: String) -> Self {
        Self {
            origin: ConfigOrigin::File,
            path: Some(path),
            section,
            digest: Some(digest),
            keys: Vec::new(),
        }
    }

    pub fn command_line(keys: Vec<String>) -> Self {
        Self {
            origin: ConfigOrigin::CommandLine,
            path: None,
            section: None,
            digest: None,
            keys,
        }
    }
}
