//! Context-sensitive spelling corrector in Rust.
//! The implementation follows the noisy channel model: a correction `c` of an observed
//! text `w` maximizes `P(c) * P(w | c)`, where `P(c)` comes from a word n-gram language
//! model and `P(w | c)` from confusion matrices learned from an error corpus
//! ([Kernighan, Church and Gale, 1990](https://aclanthology.org/C90-2036/)).
//!
//! # Example
//!
//! ```
//! use noisy_spell::{CheckerConfig, ErrorTables, MalformedPolicy, SpellChecker};
//!
//! fn main() -> Result<(), anyhow::Error> {
//!     let mut checker: SpellChecker = SpellChecker::new(CheckerConfig::default())?;
//!     checker.train("a cat sat on the mat. the cat sat on the hat.")?;
//!
//!     let errors = [("dat", "cat"), ("teh", "the"), ("hte", "the")];
//!     let (tables, _) = ErrorTables::learn(errors, MalformedPolicy::Skip)?;
//!     checker.add_error_tables(tables);
//!
//!     assert_eq!(checker.spell_check("The dat sat", 0.5)?, "the cat sat");
//!     Ok(())
//! }
//! ```

#![warn(clippy::all, clippy::pedantic, missing_docs)]

pub mod candidates;
pub mod checker;
pub mod config;
pub mod error;
pub mod error_tables;
pub mod language_model;
pub mod normalize;
pub mod scorer;
pub mod stats;

pub use candidates::{Candidate, CandidateGenerator};
pub use checker::SpellChecker;
pub use config::{CheckerConfig, MalformedPolicy};
pub use error::{Result, SpellError};
pub use error_tables::{classify, EditKind, ErrorTables, LearnReport, WORD_START};
pub use language_model::{LanguageModel, NgramModel};
pub use normalize::normalize_text;
pub use scorer::ScoredText;
pub use stats::CharStats;
