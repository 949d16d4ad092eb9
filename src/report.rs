//! Pipeline report with provenance
//!
//! Captures the composed configuration together with the steps that built
//! it and the files and flags each step took values from.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::{flatten, render_value, Config, SEPARATOR};
use crate::reader::ConfigSource;

/// Schema version for serialized reports
pub const SCHEMA_VERSION: u32 = 1;

const BANNER: &str = "###############################";

/// Key names that hold secrets and should be redacted, on their own or as
/// the last `_`-separated word (`db_password`, `auth_token`).
const SECRET_KEYS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "secret",
    "private_key",
    "api_key",
    "credential",
    "credentials",
];

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Schema version
    pub schema_version: u32,

    /// When this report was built
    pub created_at: DateTime<Utc>,

    /// Description of each step, in order
    pub steps: Vec<String>,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// The composed configuration, secrets redacted
    pub config: Value,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

impl PipelineReport {
    pub fn new(steps: Vec<String>, sources: Vec<ConfigSource>, config: &Config) -> Self {
        let mut config = config.clone().into_value();
        let redactions = redact_secrets(&mut config);

        Self {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
            steps,
            sources,
            config,
            redactions,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Banner, numbered steps, then one `key=value` line per leaf.
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{BANNER}");
        let _ = writeln!(out, "#####    CONFIGURATION    #####");
        let _ = writeln!(out, "{BANNER}");
        let _ = writeln!(out, "\nSteps:");
        let _ = writeln!(out, "------");
        for (i, step) in self.steps.iter().enumerate() {
            let _ = writeln!(out, " ({}) {}", i + 1, step);
        }
        let _ = writeln!(out, "\n-------------------------------");
        let _ = writeln!(out, "\nConfiguration:");
        let _ = writeln!(out, "--------------\n");
        if let Value::Object(map) = &self.config {
            for (key, value) in flatten(map, SEPARATOR, false) {
                let _ = writeln!(out, "{}={}", key, render_value(&value));
            }
        }
        let _ = writeln!(out, "\n{BANNER}");
        out
    }
}

/// Redact secrets in the config, returning list of redacted paths
fn redact_secrets(value: &mut Value) -> Vec<String> {
    let mut redactions = Vec::new();
    redact_recursive(value, String::new(), &mut redactions);
    redactions
}

/// Whole-word match, so `tokenizer` or `max_tokens` are left alone.
fn is_secret_key(key: &str) -> bool {
    let key = key.to_lowercase().replace('-', "_");
    SECRET_KEYS.iter().any(|secret| {
        key == *secret
            || key
                .strip_suffix(secret)
                .is_some_and(|head| head.ends_with('_'))
    })
}

fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let current_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}{}{}", path, SEPARATOR, key)
                };

                if is_secret_key(key) && !val.is_object() && !val.is_array() && !val.is_null() {
                    *val = Value::String("[REDACTED]".to_string());
                    redactions.push(current_path);
                } else {
                    redact_recursive(val, current_path, redactions);
                }
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter_mut().enumerate() {
                redact_recursive(val, format!("{}[{}]", path, i), redactions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(config: Value) -> PipelineReport {
        let config = Config::from_value(config).unwrap();
        PipelineReport::new(vec!["step one".to_string()], Vec::new(), &config)
    }

    #[test]
    fn test_secrets_are_redacted() {
        let report = report(json!({
            "db": {"host": "localhost", "password": "hunter2"},
            "API_KEY": "abc",
            "tokens": [{"auth_token": "t"}],
            "secret_dir": {"path": "/tmp"},
            "credential": null
        }));

        assert_eq!(report.config["db"]["password"], "[REDACTED]");
        assert_eq!(report.config["db"]["host"], "localhost");
        assert_eq!(report.config["API_KEY"], "[REDACTED]");
        assert_eq!(report.config["tokens"][0]["auth_token"], "[REDACTED]");
        assert_eq!(report.config["secret_dir"]["path"], "/tmp");
        assert!(report.config["credential"].is_null());
        assert_eq!(
            report.redactions,
            vec!["db.password", "API_KEY", "tokens[0].auth_token"]
        );
    }

    #[test]
    fn test_ordinary_keys_are_not_redacted() {
        let report = report(json!({
            "tokenizer": "bpe",
            "model": {"max_tokens": 512, "secret_sauce_dim": 8, "api-key": "k"},
            "db_password": "hunter2"
        }));

        assert_eq!(report.config["tokenizer"], "bpe");
        assert_eq!(report.config["model"]["max_tokens"], 512);
        assert_eq!(report.config["model"]["secret_sauce_dim"], 8);
        assert_eq!(report.config["model"]["api-key"], "[REDACTED]");
        assert_eq!(report.config["db_password"], "[REDACTED]");
        assert_eq!(report.redactions, vec!["model.api-key", "db_password"]);

        let text = report.to_human();
        assert!(text.contains("tokenizer=bpe\n"));
        assert!(text.contains("model.max_tokens=512\n"));
    }

    #[test]
    fn test_human_rendering() {
        let report = report(json!({"opt": {"name": "adam", "lr": 0.1}, "seed": null}));
        let text = report.to_human();

        assert!(text.starts_with("###############################\n#####    CONFIGURATION    #####\n"));
        assert!(text.contains("\nSteps:\n------\n (1) step one\n"));
        assert!(text.contains("--------------\n\nopt.name=adam\nopt.lr=0.1\nseed=None\n"));
        assert!(text.ends_with("\n###############################\n"));
    }

    #[test]
    fn test_json_rendering() {
        let report = report(json!({"a": {"b": 1}}));
        let parsed: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(parsed["schema_version"], SCHEMA_VERSION);
        assert_eq!(parsed["steps"], json!(["step one"]));
        assert_eq!(parsed["config"], json!({"a": {"b": 1}}));
        assert_eq!(parsed["redactions"], json!([]));
        assert!(parsed["created_at"].is_string());
    }
}
