//! Structured configuration files
//!
//! Reads one file, optionally narrows it to a named top-level section, and
//! merges the result onto the configuration built so far.
//!
//! Format is picked by extension: `.toml`, `.json`, and YAML for `.yaml`,
//! `.yml` or anything else.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{ConfigReader, ConfigSource, ReaderError, ReaderOutput, ReaderResult};
use crate::config::Config;

/// Extra naming the file to read, overriding the reader's own.
pub const EXTRA_FILE: &str = "config_file";
/// Extra naming the section to select.
pub const EXTRA_SECTION: &str = "config_name";
/// Extra naming the directory relative paths resolve against.
pub const EXTRA_FOLDER: &str = "config_folder";

/// Reads a configuration layer from a structured file
#[derive(Debug, Clone)]
pub struct FileReader {
    file: Option<PathBuf>,
    section: Option<String>,
    base_dir: PathBuf,
    source: Option<ConfigSource>,
}

impl Default for FileReader {
    fn default() -> Self {
        Self {
            file: None,
            section: None,
            base_dir: PathBuf::from("."),
            source: None,
        }
    }
}

impl FileReader {
    /// Reader for `file`, resolved against the current directory.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    /// Only use this top-level section of the file.
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Resolve a relative file path against `dir`.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Path the next read will open, if any.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.file.as_ref().map(|file| self.base_dir.join(file))
    }

    /// Take `config_file`, `config_name` and `config_folder` from the extras.
    ///
    /// Null or non-string values leave the reader's setting alone. Values
    /// that are used stick for later reads.
    fn apply_extras(&mut self, extras: &Config) {
        if let Some(file) = extras.get(EXTRA_FILE).and_then(Value::as_str) {
            self.file = Some(PathBuf::from(file));
        }
        if let Some(section) = extras.get(EXTRA_SECTION).and_then(Value::as_str) {
            self.section = Some(section.to_string());
        }
        if let Some(folder) = extras.get(EXTRA_FOLDER).and_then(Value::as_str) {
            self.base_dir = PathBuf::from(folder);
        }
    }

    /// Load the file and select the section, without merging.
    pub fn load(&self) -> ReaderResult<Option<(Config, ConfigSource)>> {
        let Some(path) = self.resolved_path() else {
            return Ok(None);
        };

        let bytes = fs::read(&path).map_err(|source| ReaderError::Io {
            path: path.clone(),
            source,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes).map_err(|e| ReaderError::Parse {
            path: path.clone(),
            reason: format!("invalid UTF-8: {}", e),
        })?;

        let mut document = parse_document(&path, &contents)?;

        if let Some(section) = &self.section {
            document = match document {
                Value::Object(mut map) => map.remove(section),
                _ => None,
            }
            .ok_or_else(|| ReaderError::MissingSection {
                section: section.clone(),
                path: path.clone(),
            })?;
        }

        let config = Config::from_value(document).map_err(|source| ReaderError::InvalidDocument {
            path: path.clone(),
            source,
        })?;

        let source = ConfigSource::file(path.display().to_string(), self.section.clone(), digest);
        Ok(Some((config, source)))
    }
}

impl ConfigReader for FileReader {
    fn read(&mut self, config: Option<Config>, extras: Config) -> ReaderResult<ReaderOutput> {
        self.apply_extras(&extras);

        let Some((loaded, source)) = self.load()? else {
            tracing::debug!("no configuration file set, passing configuration through");
            return Ok(ReaderOutput::new(config, Config::new()));
        };

        tracing::info!(
            path = source.path.as_deref().unwrap_or_default(),
            section = source.section.as_deref().unwrap_or_default(),
            keys = loaded.len(),
            "loaded configuration file"
        );
        self.source = Some(source);

        let merged = match config {
            Some(existing) => existing.merged(loaded),
            None => loaded,
        };

        Ok(ReaderOutput::new(Some(merged), Config::new()))
    }

    fn source(&self) -> Option<&ConfigSource> {
        self.source.as_ref()
    }
}

impl fmt::Display for FileReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FileReader with config_file={}, config_name={}, config_folder={}",
            self.file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "None".to_string()),
            self.section.as_deref().unwrap_or("None"),
            self.base_dir.display()
        )
    }
}

fn parse_document(path: &Path, contents: &str) -> ReaderResult<Value> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parse_error = |reason: String| ReaderError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    match ext.as_str() {
        "toml" => {
            let table: toml::Table = toml::from_str(contents)
                .map_err(|e| parse_error(format!("TOML parse error: {}", e)))?;
            Ok(toml_to_json(toml::Value::Table(table)))
        }
        "json" => serde_json::from_str(contents)
            .map_err(|e| parse_error(format!("JSON parse error: {}", e))),
        _ => serde_yaml::from_str(contents)
            .map_err(|e| parse_error(format!("YAML parse error: {}", e))),
    }
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
