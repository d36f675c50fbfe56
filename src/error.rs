//! Error types for the noisy-channel spell checker.
//!
//! Every fallible operation returns [`Result`], whose error side is [`SpellError`].
//! Missing confusion-matrix or character statistics are deliberately absent from
//! this enum: those lookups fall back to a neutral value and are never surfaced.

use std::io;

use thiserror::Error;

/// The main error type for spell checker operations.
#[derive(Error, Debug)]
pub enum SpellError {
    /// I/O errors while reading corpora or persisted checkers.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON errors while reading configurations or confusion matrices.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary (de)serialization errors of a persisted checker.
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// An invalid regular expression was compiled.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An error-corpus record does not reduce to a single canonical edit.
    #[error("Malformed training record at line {line}: {reason}")]
    MalformedRecord {
        /// One-based line (or record) number.
        line: usize,
        /// What is wrong with the record.
        reason: String,
    },

    /// Correction or evaluation was requested before a language model was attached.
    #[error("No language model attached")]
    UnattachedModel,

    /// `alpha` is outside `[0, 1]`.
    #[error("Invalid alpha {0}: expected a probability in [0, 1]")]
    InvalidAlpha(f64),

    /// The configuration holds inconsistent values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for operations that may fail with [`SpellError`].
pub type Result<T> = std::result::Result<T, SpellError>;

impl SpellError {
    /// Create a new malformed record error.
    pub fn malformed<S: Into<String>>(line: usize, reason: S) -> Self {
        SpellError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Create a new invalid configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SpellError::InvalidConfig(msg.into())
    }
}

/// Rejects `alpha` values that are not probabilities, NaN included.
pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(SpellError::InvalidAlpha(alpha))
    }
}
