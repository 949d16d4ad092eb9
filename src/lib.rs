//! configstack - layered configuration from files and the command line
//!
//! A configuration is composed by a [`Pipeline`] of readers. Each reader
//! layers its values over the configuration built so far:
//! - [`FileReader`] merges a section of a YAML, TOML or JSON file
//! - [`ArgReader`] overrides any flattened key with a `--dotted.key` flag
//!
//! Command-line strings are turned back into typed values by
//! [`configstack_infer`], guided by the value they replace.

pub mod config;
pub mod pipeline;
pub mod reader;
pub mod report;

pub use config::{Config, ConfigError};
pub use configstack_infer::{CoerceError, Coercer, InferMode, ValueKind};
pub use pipeline::{Pipeline, PipelineError, PipelineResult};
pub use reader::{
    ArgReader, ConfigOrigin, ConfigReader, ConfigSource, FileReader, ReaderError, ReaderOutput,
};
pub use report::PipelineReport;
