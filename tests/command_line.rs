//! Command-line reader tests through the public API

use configstack::{ArgReader, Config, ConfigReader, InferMode};
use serde_json::{json, Value};

fn training_config() -> Config {
    Config::from_value(json!({
        "opt": {"optimizer": "adam", "lr": 0.1, "regularizer": true},
        "data": {"dataset": "ns", "batch_size": 12, "test_resolutions": [16, 32]}
    }))
    .unwrap()
}

fn config_name_extra() -> Config {
    std::iter::once(("config_name", json!("test"))).collect()
}

#[test]
fn test_single_override_without_extras() {
    let mut reader = ArgReader::new()
        .infer_types(InferMode::Lenient)
        .with_args(["test", "--data.batch_size", "24"]);
    let out = reader.read(Some(training_config()), Config::new()).unwrap();

    let mut expected = training_config();
    expected.set_path("data.batch_size", json!(24)).unwrap();
    assert_eq!(out.config, Some(expected));
    assert!(out.extras.is_empty());
}

#[test]
fn test_infers_none_iterables_and_booleans() {
    let mut reader = ArgReader::new()
        .with_extra("config_name", Value::Null)
        .with_args([
            "test",
            "--data.batch_size",
            "24",
            "--data.test_resolutions",
            "[8, None]",
            "--opt.regularizer",
            "False",
            "--config_name",
            "test",
        ]);
    let out = reader.read(Some(training_config()), Config::new()).unwrap();
    let config = out.config.unwrap();

    assert_eq!(config["data"]["batch_size"], 24);
    assert_eq!(config["data"]["test_resolutions"], json!([8, null]));
    assert_eq!(config["opt"]["regularizer"], false);
    assert_eq!(config["opt"]["lr"], 0.1);
    assert_eq!(out.extras, config_name_extra());
}

#[test]
fn test_whole_subtree_override() {
    let mut reader = ArgReader::new()
        .overwrite_subtrees(true)
        .with_extra("config_name", Value::Null)
        .with_args(["test", "--data", "0", "--config_name", "test"]);
    let out = reader.read(Some(training_config()), Config::new()).unwrap();

    let mut expected = training_config();
    expected.insert("data", 0);
    assert_eq!(out.config, Some(expected));
    assert_eq!(out.extras, config_name_extra());
}
