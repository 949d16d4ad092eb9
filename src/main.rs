//! configstack CLI
//!
//! Composes a configuration from a file named on the command line plus
//! `--dotted.key VALUE` overrides, and prints the result.
//!
//! ```text
//! configstack --config_file params.yaml --config_name train --opt.lr 0.01
//! ```

use std::process;

use clap::error::ErrorKind;
use configstack::reader::{EXTRA_FILE, EXTRA_FOLDER, EXTRA_SECTION};
use configstack::{ArgReader, FileReader, Pipeline, PipelineError, ReaderError};
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn file_selection(reader: ArgReader) -> ArgReader {
    reader
        .with_extra(EXTRA_FILE, Value::Null)
        .with_extra(EXTRA_SECTION, Value::Null)
        .with_extra(EXTRA_FOLDER, Value::Null)
}

fn main() {
    // RUST_LOG in the environment takes precedence over the WARN default.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::WARN.into()));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let mut pipeline = Pipeline::default()
        .step(file_selection(ArgReader::new().allow_unknown(true)))
        .step(FileReader::default())
        .step(file_selection(ArgReader::new().overwrite_subtrees(true)));

    if let Err(e) = pipeline.run() {
        if let PipelineError::Step {
            source: ReaderError::CommandLine(clap_error),
            ..
        } = &e
        {
            if matches!(
                clap_error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                let _ = clap_error.print();
                process::exit(0);
            }
        }
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }

    match pipeline.report() {
        Ok(report) => print!("{}", report.to_human()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}
