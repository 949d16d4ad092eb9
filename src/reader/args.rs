//! Command-line overrides
//!
//! Every flattened key of the configuration becomes a `--dotted.key` flag
//! whose default is the current value. Supplied strings are coerced back to
//! the kind of the value they replace (see [`configstack_infer`]) and written
//! into the tree.
//!
//! With subtree overrides enabled, nested mappings get a flag of their own:
//! `--data 0` replaces the whole `data` mapping.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};
use configstack_infer::{Coercer, InferMode};
use serde_json::Value;

use super::{ConfigReader, ConfigSource, ReaderError, ReaderOutput, ReaderResult};
use crate::config::{normalize_value, Config, SEPARATOR};

const HELP_FLAG: &str = "help";

/// Reads configuration overrides from command-line flags
#[derive(Debug, Clone, Default)]
pub struct ArgReader {
    infer: InferMode,
    overwrite_subtrees: bool,
    allow_unknown: bool,
    extras: Config,
    args: Option<Vec<OsString>>,
    source: Option<ConfigSource>,
}

impl ArgReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// How supplied strings are turned back into typed values.
    pub fn infer_types(mut self, mode: InferMode) -> Self {
        self.infer = mode;
        self
    }

    /// Register a flag for every nested mapping too, so one flag can replace
    /// a whole subtree.
    pub fn overwrite_subtrees(mut self, enabled: bool) -> Self {
        self.overwrite_subtrees = enabled;
        self
    }

    /// Skip flags that match no key instead of failing. `--help` is skipped
    /// too, leaving it to a later reader.
    pub fn allow_unknown(mut self, enabled: bool) -> Self {
        self.allow_unknown = enabled;
        self
    }

    /// Declare an extra: a flag whose value is handed to the next reader
    /// instead of staying in the configuration.
    ///
    /// Extras declared here win over both the incoming configuration and the
    /// incoming extras.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let extra: Config = std::iter::once((key.into(), value.into())).collect();
        self.extras.merge(extra);
        self
    }

    /// Parse these arguments (program name first) instead of the process
    /// arguments.
    pub fn with_args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    fn command(&self, entries: &[(String, Value)]) -> Command {
        let mut command = Command::new(env!("CARGO_PKG_NAME"))
            .about("Read the configuration from the command line.")
            .args_override_self(true)
            .disable_help_flag(true);

        if !entries.iter().any(|(key, _)| key == HELP_FLAG) {
            command = command.arg(
                Arg::new(HELP_FLAG)
                    .long(HELP_FLAG)
                    .action(ArgAction::Help)
                    .help("Print help"),
            );
        }

        for (key, value) in entries {
            let coercer = Coercer::for_value(value, self.infer);
            command = command.arg(
                Arg::new(key.clone())
                    .long(key.clone())
                    .value_name(coercer.kind().name().to_uppercase())
                    .help(format!("default: {}", value))
                    .action(ArgAction::Set)
                    .num_args(1)
                    .allow_negative_numbers(true)
                    .value_parser(move |raw: &str| coercer.coerce(raw)),
            );
        }

        command
    }

    fn argv(&self, known: &HashSet<&str>) -> Vec<OsString> {
        let argv = self
            .args
            .clone()
            .unwrap_or_else(|| std::env::args_os().collect());

        if self.allow_unknown {
            known_args(argv, known)
        } else {
            argv
        }
    }
}

impl ConfigReader for ArgReader {
    fn read(&mut self, config: Option<Config>, extras: Config) -> ReaderResult<ReaderOutput> {
        let extras = extras.merged(self.extras.clone());
        let mut config = config.unwrap_or_default().merged(self.extras.clone());

        let entries = config.flatten(self.overwrite_subtrees);
        let mut known: HashSet<&str> = HashSet::with_capacity(entries.len());
        for (key, _) in &entries {
            if !known.insert(key.as_str()) {
                return Err(ReaderError::DuplicateKey { key: key.clone() });
            }
        }

        let command = self.command(&entries);
        tracing::debug!(
            flags = entries.len(),
            infer = %self.infer,
            overwrite_subtrees = self.overwrite_subtrees,
            "parsing command line"
        );
        let matches = command.try_get_matches_from(self.argv(&known))?;

        let mut supplied = Vec::new();
        for (key, _) in &entries {
            if matches.value_source(key) != Some(ValueSource::CommandLine) {
                continue;
            }
            if let Some(value) = matches.try_get_one::<Value>(key)? {
                // Same sentinel as loaded mappings, whatever the inference mode
                let mut value = value.clone();
                normalize_value(&mut value);
                supplied.push((key.clone(), value));
            }
        }

        if self.overwrite_subtrees {
            supplied = drop_shadowed(supplied);
        }

        for (key, value) in &supplied {
            config.set_path(key, value.clone())?;
        }

        let mut side_channel = Config::new();
        for (key, value) in extras.iter() {
            let resolved = config.remove(key).unwrap_or_else(|| value.clone());
            side_channel.insert(key.clone(), resolved);
        }

        let keys: Vec<String> = supplied.into_iter().map(|(key, _)| key).collect();
        tracing::debug!(overrides = ?keys, "applied command-line overrides");
        self.source = Some(ConfigSource::command_line(keys));

        Ok(ReaderOutput::new(Some(config), side_channel))
    }

    fn source(&self) -> Option<&ConfigSource> {
        self.source.as_ref()
    }
}

impl fmt::Display for ArgReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArgReader with infer_types={}, overwrite_subtrees={}, extras={}",
            self.infer,
            self.overwrite_subtrees,
            Value::Object(self.extras.as_map().clone())
        )
    }
}

fn is_descendant(key: &str, ancestor: &str) -> bool {
    key.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// When a key and one of its ancestors were both supplied, the outermost
/// supplied key replaces the subtree and the deeper overrides are dropped.
fn drop_shadowed(supplied: Vec<(String, Value)>) -> Vec<(String, Value)> {
    let keys: Vec<String> = supplied.iter().map(|(key, _)| key.clone()).collect();

    supplied
        .into_iter()
        .filter(|(key, _)| match keys.iter().find(|other| is_descendant(key, other)) {
            Some(ancestor) => {
                tracing::debug!("--{} is replaced by --{}, dropping it", key, ancestor);
                false
            }
            None => true,
        })
        .collect()
}

/// Keep the program name and the flags in `known` (with their values).
///
/// Accepts `--key value` and `--key=value`. An unknown flag also takes the
/// following token with it unless that token is itself a flag.
fn known_args(argv: Vec<OsString>, known: &HashSet<&str>) -> Vec<OsString> {
    let mut args = argv.into_iter().peekable();
    let mut kept: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let text = arg.to_string_lossy().into_owned();
        let Some(flag) = text.strip_prefix("--") else {
            tracing::debug!("ignoring stray argument '{}'", text);
            continue;
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag, false),
        };

        if known.contains(name) {
            kept.push(arg);
            if !inline_value {
                if let Some(value) = args.next() {
                    kept.push(value);
                }
            }
        } else {
            tracing::debug!("ignoring unknown flag --{}", name);
            let next_is_value = args
                .peek()
                .is_some_and(|next| !next.to_string_lossy().starts_with("--"));
            if !inline_value && next_is_value {
                args.next();
            }
        }
    }

    kept
}
