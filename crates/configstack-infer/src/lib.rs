//! Type inference for command-line configuration overrides.
//!
//! Every override arrives as a string. The value it replaces tells us what
//! the string is supposed to be: a [`ValueKind`] is derived from the existing
//! value, and a [`Coercer`] built from that kind and an [`InferMode`] turns
//! the raw string back into a typed [`serde_json::Value`].

mod coerce;
mod error;
mod kind;
mod literal;

pub use coerce::{infer_boolean, infer_iterable, infer_numeric, infer_string, native_cast, Coercer};
pub use error::CoerceError;
pub use kind::{InferMode, ValueKind};
pub use literal::parse_literal;
