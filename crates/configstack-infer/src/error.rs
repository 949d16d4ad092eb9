//! Coercion errors.

use crate::kind::ValueKind;

/// Raised when a raw command-line string cannot be turned into the value
/// kind it is meant to override.
///
/// Only strict inference and the native casts of disabled inference produce
/// these; lenient inference falls back to the raw string instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoerceError {
    #[error("expected a boolean (true/false/none), got '{0}'")]
    InvalidBoolean(String),

    #[error("expected a number (digits, digits.digits or none), got '{0}'")]
    InvalidNumber(String),

    #[error("invalid literal '{input}': {reason}")]
    InvalidLiteral { input: String, reason: String },

    #[error("cannot convert '{input}' to {kind}")]
    NativeCast { input: String, kind: ValueKind },

    #[error("unknown inference mode '{0}' (expected off, lenient or strict)")]
    UnknownMode(String),
}
