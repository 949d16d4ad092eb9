//! Pipeline orchestration
//!
//! Runs readers in order, threading the configuration and the extras from
//! one step to the next:
//! - the first step starts from no configuration and no extras
//! - each step's output is the next step's input
//! - the first failing step aborts the run; nothing is rolled back
//!
//! A typical pipeline reads defaults from a file, applies command-line
//! overrides, then reads a second file section named on the command line.

use thiserror::Error;

use crate::config::Config;
use crate::reader::{ConfigReader, ReaderError};
use crate::report::PipelineReport;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step {index} ({step}) failed: {source}")]
    Step {
        /// 1-based position of the failing step
        index: usize,
        step: String,
        #[source]
        source: ReaderError,
    },

    #[error("pipeline has not run")]
    NotRun,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Step {
                source: ReaderError::CommandLine(_) | ReaderError::Matches(_),
                ..
            } => 2,
            PipelineError::Step { .. } => 1,
            PipelineError::NotRun => 1,
            PipelineError::Serialization(_) => 1,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// An ordered list of configuration readers
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn ConfigReader>>,
    config: Option<Config>,
}

impl Pipeline {
    /// Create a pipeline from boxed readers
    pub fn new(steps: Vec<Box<dyn ConfigReader>>) -> Self {
        Self {
            steps,
            config: None,
        }
    }

    /// Append a reader
    pub fn step(mut self, reader: impl ConfigReader + 'static) -> Self {
        self.steps.push(Box::new(reader));
        self
    }

    pub fn steps(&self) -> &[Box<dyn ConfigReader>] {
        &self.steps
    }

    /// Configuration produced by the last successful run
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// Run every step in order and return the final configuration.
    ///
    /// A run in which no step produced a configuration yields an empty one.
    pub fn run(&mut self) -> PipelineResult<Config> {
        self.config = None;

        let mut config: Option<Config> = None;
        let mut extras = Config::new();

        for (i, step) in self.steps.iter_mut().enumerate() {
            let index = i + 1;
            tracing::debug!(step = index, reader = %step, "running configuration step");

            let out = step
                .read(config.take(), std::mem::take(&mut extras))
                .map_err(|source| PipelineError::Step {
                    index,
                    step: step.to_string(),
                    source,
                })?;

            config = out.config;
            extras = out.extras;
        }

        if !extras.is_empty() {
            tracing::debug!(
                extras = ?extras.keys().collect::<Vec<_>>(),
                "extras left over after the last step"
            );
        }

        let config = config.unwrap_or_default();
        self.config = Some(config.clone());
        Ok(config)
    }

    /// Describe the last run: steps, sources and the (redacted) result.
    pub fn report(&self) -> PipelineResult<PipelineReport> {
        let config = self.config.as_ref().ok_or(PipelineError::NotRun)?;
        let steps = self.steps.iter().map(|s| s.to_string()).collect();
        let sources = self
            .steps
            .iter()
            .filter_map(|s| s.source().cloned())
            .collect();
        Ok(PipelineReport::new(steps, sources, config))
    }
}
