//! Configuration of a [`SpellChecker`](crate::SpellChecker).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{check_alpha, Result, SpellError};

fn alpha() -> f64 {
    0.95
}

fn ngram_order() -> usize {
    3
}

fn log_base() -> f64 {
    std::f64::consts::E
}

fn alphabet() -> String {
    String::from("abcdefghijklmnopqrstuvwxyz")
}

/// What the error-table learner does with a record that is not a single edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log the record and keep learning.
    #[default]
    Skip,
    /// Stop at the first malformed record with [`SpellError::MalformedRecord`].
    Reject,
}

/// Tunables of the noisy-channel checker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Probability that an observed word is already correct.
    #[serde(default = "alpha")]
    pub alpha: f64,

    /// Order `n` of the n-gram model built by [`SpellChecker::train`](crate::SpellChecker::train).
    #[serde(default = "ngram_order")]
    pub ngram_order: usize,

    /// Logarithm base of the language model scores.
    #[serde(default = "log_base")]
    pub log_base: f64,

    /// Letters tried by deletion and substitution edits.
    #[serde(default = "alphabet")]
    pub alphabet: String,

    /// Handling of malformed error-corpus records.
    #[serde(default)]
    pub malformed_records: MalformedPolicy,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            alpha: alpha(),
            ngram_order: ngram_order(),
            log_base: log_base(),
            alphabet: alphabet(),
            malformed_records: MalformedPolicy::default(),
        }
    }
}

impl CheckerConfig {
    /// Parse a (possibly partial) JSON configuration. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the values do not pass [`CheckerConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`CheckerConfig::from_json_str`] fails.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SpellError::InvalidAlpha`] or [`SpellError::InvalidConfig`].
    pub fn validate(&self) -> Result<()> {
        check_alpha(self.alpha)?;

        if self.ngram_order == 0 {
            return Err(SpellError::invalid_config("ngram_order must be at least 1"));
        }
        if self.log_base.is_nan()
            || self.log_base <= 0.0
            || (self.log_base - 1.0).abs() < f64::EPSILON
        {
            return Err(SpellError::invalid_config(format!(
                "log_base must be positive and different from 1, got {}",
                self.log_base
            )));
        }
        if self.alphabet.is_empty() {
            return Err(SpellError::invalid_config("alphabet must not be empty"));
        }

        Ok(())
    }
}
