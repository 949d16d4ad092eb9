//! Pipeline composition tests
//!
//! File defaults, then command-line overrides, then a second file section
//! picked on the command line.

use std::fs;
use std::path::Path;

use configstack::{ArgReader, Config, ConfigOrigin, FileReader, InferMode, Pipeline};
use serde_json::{json, Value};
use tempfile::TempDir;

const CONFIG_FILE: &str = "\
default:
  opt:
    optimizer: 'adam'
    lr: 0.1
  data:
    dataset: 'ns'
    batch_size: 12

test:
  opt:
    optimizer: 'SGD'
";

fn write_config(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.display().to_string()
}

fn file_selection(reader: ArgReader) -> ArgReader {
    reader
        .with_extra("config_file", Value::Null)
        .with_extra("config_name", Value::Null)
}

#[test]
fn test_defaults_overrides_then_named_section() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "config.yaml", CONFIG_FILE);

    let mut pipeline = Pipeline::default()
        .step(FileReader::new(&path).section("default"))
        .step(file_selection(ArgReader::new()).with_args([
            "test",
            "--data.batch_size",
            "24",
            "--config_file",
            path.as_str(),
            "--config_name",
            "test",
        ]))
        .step(FileReader::default());
    let config = pipeline.run().unwrap();

    let expected = Config::from_value(json!({
        "opt": {"optimizer": "SGD", "lr": 0.1},
        "data": {"dataset": "ns", "batch_size": 24}
    }))
    .unwrap();
    assert_eq!(config, expected);
    assert!(!config.contains_key("config_file"));
    assert!(!config.contains_key("config_name"));
}

#[test]
fn test_config_folder_resolves_relative_file() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "params.yml", CONFIG_FILE);
    let folder = dir.path().display().to_string();

    let mut pipeline = Pipeline::default()
        .step(
            file_selection(ArgReader::new())
                .with_extra("config_folder", Value::Null)
                .with_args([
                    "test",
                    "--config_folder",
                    folder.as_str(),
                    "--config_file",
                    "params.yml",
                    "--config_name",
                    "default",
                ]),
        )
        .step(FileReader::default());
    let config = pipeline.run().unwrap();

    assert_eq!(config["opt"]["optimizer"], "adam");
    assert_eq!(config["data"]["batch_size"], 12);
}

#[test]
fn test_pre_parse_then_full_parse() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "config.yaml", CONFIG_FILE);
    let argv = [
        "test",
        "--config_file",
        path.as_str(),
        "--config_name",
        "default",
        "--opt.lr",
        "0.01",
    ];

    let mut pipeline = Pipeline::default()
        .step(file_selection(ArgReader::new().allow_unknown(true)).with_args(argv))
        .step(FileReader::default())
        .step(file_selection(ArgReader::new()).with_args(argv));
    let config = pipeline.run().unwrap();

    assert_eq!(config["opt"]["lr"], 0.01);
    assert_eq!(config["opt"]["optimizer"], "adam");
    assert_eq!(config.len(), 2);
}

#[test]
fn test_mixed_formats_merge() {
    let dir = TempDir::new().unwrap();
    let base = write_config(
        dir.path(),
        "base.toml",
        "[server]\nhost = \"localhost\"\nport = 8080\n\n[server.tls]\nenabled = false\n",
    );
    let local = write_config(
        dir.path(),
        "local.json",
        r#"{"server": {"port": 9090, "tls": {"enabled": true}}}"#,
    );

    let mut pipeline = Pipeline::default()
        .step(FileReader::new(&base))
        .step(FileReader::new(&local))
        .step(
            ArgReader::new()
                .infer_types(InferMode::Strict)
                .with_args(["test", "--server.host", "0.0.0.0"]),
        );
    let config = pipeline.run().unwrap();

    assert_eq!(
        config.into_value(),
        json!({"server": {"host": "0.0.0.0", "port": 9090, "tls": {"enabled": true}}})
    );
}

#[test]
fn test_report_carries_provenance() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "config.yaml", CONFIG_FILE);

    let mut pipeline = Pipeline::default()
        .step(FileReader::new(&path).section("default"))
        .step(ArgReader::new().with_args(["test", "--opt.optimizer", "sgd"]));
    pipeline.run().unwrap();
    let report = pipeline.report().unwrap();

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].origin, ConfigOrigin::File);
    assert_eq!(report.sources[0].section.as_deref(), Some("default"));
    assert_eq!(report.sources[0].digest.as_ref().map(String::len), Some(64));
    assert_eq!(report.sources[1].origin, ConfigOrigin::CommandLine);
    assert_eq!(report.sources[1].keys, vec!["opt.optimizer".to_string()]);

    let text = report.to_human();
    assert!(text.contains(" (1) FileReader with config_file="));
    assert!(text.contains(" (2) ArgReader with infer_types=lenient"));
    assert!(text.contains("opt.optimizer=sgd\n"));
}

#[test]
fn test_failure_names_the_step() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "config.yaml", CONFIG_FILE);

    let mut pipeline = Pipeline::default()
        .step(FileReader::new(&path).section("default"))
        .step(FileReader::new(&path).section("missing"));
    let err = pipeline.run().unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("step 2 (FileReader"), "{message}");
    assert!(message.contains("section 'missing' not found"), "{message}");
}
