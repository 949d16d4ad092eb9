//! Configuration tree and merge system
//!
//! A [`Config`] is a nested, string-keyed tree. Layers are combined with a
//! deep merge, and command-line flags address leaves through flattened,
//! dot-separated keys.

mod flatten;
mod merge;
mod tree;

pub use flatten::{flatten, unflatten, unflatten_set, SEPARATOR};
pub use merge::{deep_merge, merge_into, merge_layers};
pub use tree::{render_value, Config, ConfigError};
pub(crate) use tree::normalize_value;
