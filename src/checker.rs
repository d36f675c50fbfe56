//! The spell checker façade: model, vocabulary, statistics and error tables.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use fnv::FnvHashSet;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::candidates::{Candidate, CandidateGenerator};
use crate::config::CheckerConfig;
use crate::error::{check_alpha, Result, SpellError};
use crate::error_tables::{ErrorTables, LearnReport};
use crate::language_model::{LanguageModel, NgramModel};
use crate::normalize::{is_correctable, normalize_text, tokens};
use crate::scorer;
use crate::stats::CharStats;

/// `SpellChecker` corrects texts in the noisy-channel framework, combining a language
/// model prior with confusion-matrix error probabilities.
///
/// Attaching a model or error tables takes `&mut self` while correcting takes `&self`,
/// so tables are never replaced under an in-flight correction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpellChecker<M = NgramModel> {
    config: CheckerConfig,
    lm: Option<M>,
    vocabulary: FnvHashSet<String>,
    char_stats: CharStats,
    error_tables: ErrorTables,
}

impl<M> Default for SpellChecker<M> {
    fn default() -> Self {
        Self {
            config: CheckerConfig::default(),
            lm: None,
            vocabulary: FnvHashSet::default(),
            char_stats: CharStats::default(),
            error_tables: ErrorTables::default(),
        }
    }
}

impl SpellChecker<NgramModel> {
    /// `build_model` builds an n-gram model of the configured order over `text` and
    /// recomputes the character statistics from it.
    ///
    /// The returned model is not attached; pass it to [`SpellChecker::add_language_model`].
    ///
    /// # Errors
    ///
    /// Returns error if the text cannot be normalized.
    pub fn build_model(&mut self, text: &str) -> Result<NgramModel> {
        self.learn_char_stats(&text.to_lowercase());
        let mut lm = NgramModel::new(self.config.ngram_order, self.config.log_base);
        lm.build(&normalize_text(text)?);
        Ok(lm)
    }

    /// `train` builds a model over `text` and attaches it.
    ///
    /// # Errors
    ///
    /// See [`SpellChecker::build_model`].
    ///
    /// # Example
    ///
    /// ```
    /// use noisy_spell::{CheckerConfig, ErrorTables, SpellChecker};
    ///
    /// fn main() -> Result<(), anyhow::Error> {
    ///     let mut checker: SpellChecker = SpellChecker::new(CheckerConfig::default())?;
    ///     checker.train("a cat sat on the mat. a fat cat sat on the mat.")?;
    ///     let tables = ErrorTables::from_json_str(r#"{"substitution": {"dc": 100}}"#)?;
    ///     checker.add_error_tables(tables);
    ///
    ///     let corrected = checker.spell_check("a dat sat on the mat.", 0.95)?;
    ///     assert_eq!(corrected, "a cat sat on the mat.");
    ///     Ok(())
    /// }
    /// ```
    pub fn train(&mut self, text: &str) -> Result<()> {
        let lm = self.build_model(text)?;
        self.add_language_model(lm);
        Ok(())
    }
}

impl<M: LanguageModel> SpellChecker<M> {
    /// `new` creates a checker with no model and empty error tables.
    ///
    /// # Errors
    ///
    /// Returns error if `config` does not validate.
    pub fn new(config: CheckerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// `with_language_model` creates a checker around an existing model and the character
    /// statistics of the text it was trained on.
    ///
    /// # Errors
    ///
    /// Returns error if `config` does not validate.
    pub fn with_language_model(
        config: CheckerConfig,
        lm: M,
        char_stats: CharStats,
    ) -> Result<Self> {
        let mut checker = Self::new(config)?;
        checker.char_stats = char_stats;
        checker.add_language_model(lm);
        Ok(checker)
    }

    /// Attach `lm`, replacing any previous model, and derive the vocabulary from its unigrams.
    pub fn add_language_model(&mut self, lm: M) {
        self.vocabulary = lm.unigram_counts().keys().cloned().collect();
        tracing::debug!(
            vocabulary = self.vocabulary.len(),
            corpus_len = lm.corpus_len(),
            "attached language model"
        );
        self.lm = Some(lm);
    }

    /// Recompute the character statistics from a lower-cased training `text`.
    pub fn learn_char_stats(&mut self, text: &str) {
        self.char_stats = CharStats::from_text(text);
        tracing::debug!(
            chars = self.char_stats.char_counts.len(),
            pairs = self.char_stats.two_char_counts.len(),
            "computed character statistics"
        );
    }

    /// Replace the confusion matrices.
    pub fn add_error_tables(&mut self, error_tables: ErrorTables) {
        self.error_tables = error_tables;
    }

    /// `learn_error_tables` learns confusion matrices from a tab-separated error corpus
    /// and attaches them, following the configured malformed-record policy.
    ///
    /// # Errors
    ///
    /// See [`ErrorTables::learn_tsv_file`].
    pub fn learn_error_tables<P: AsRef<Path>>(&mut self, path: P) -> Result<LearnReport> {
        let (tables, report) =
            ErrorTables::learn_tsv_file(path, self.config.malformed_records)?;
        self.add_error_tables(tables);
        Ok(report)
    }

    /// `evaluate` returns the log-likelihood of `text` under the attached model.
    ///
    /// # Errors
    ///
    /// Returns [`SpellError::UnattachedModel`] if no model is attached.
    pub fn evaluate(&self, text: &str) -> Result<f64> {
        Ok(self.model()?.evaluate(&normalize_text(text)?))
    }

    /// `get_candidates` returns, for each token of the normalized `text`, its candidate
    /// corrections. Tokens that are not purely alphabetic get no candidates.
    ///
    /// # Errors
    ///
    /// Returns [`SpellError::InvalidAlpha`] or [`SpellError::UnattachedModel`].
    pub fn get_candidates(&self, text: &str, alpha: f64) -> Result<Vec<Vec<Candidate>>> {
        check_alpha(alpha)?;
        let lm = self.model()?;
        let text = normalize_text(text)?;
        Ok(self.candidates(lm, &tokens(&text), alpha))
    }

    /// `spell_check` returns the most probable correction of `text`, changing at most one word.
    ///
    /// The result is the normalized text, unchanged if no correction scores higher.
    ///
    /// # Errors
    ///
    /// Returns [`SpellError::InvalidAlpha`] if `alpha` is not in `[0, 1]` and
    /// [`SpellError::UnattachedModel`] if no model is attached.
    ///
    /// # Arguments
    ///
    /// * `text` - The text to spell check.
    /// * `alpha` - The probability of keeping a lexical word as is.
    pub fn spell_check(&self, text: &str, alpha: f64) -> Result<String> {
        check_alpha(alpha)?;
        let lm = self.model()?;
        let text = normalize_text(text)?;
        let words = tokens(&text);

        let candidates = self.candidates(lm, &words, alpha);
        let best = scorer::best_text(lm, &words, &candidates);

        if best.text != text {
            tracing::debug!(
                original = ?text,
                corrected = ?best.text,
                log_prob = best.log_prob,
                "corrected text"
            );
        }

        Ok(best.text)
    }

    /// `correct` is [`SpellChecker::spell_check`] with the configured `alpha`.
    ///
    /// # Errors
    ///
    /// See [`SpellChecker::spell_check`].
    pub fn correct(&self, text: &str) -> Result<String> {
        self.spell_check(text, self.config.alpha)
    }

    fn model(&self) -> Result<&M> {
        self.lm.as_ref().ok_or(SpellError::UnattachedModel)
    }

    fn candidates(&self, lm: &M, words: &[&str], alpha: f64) -> Vec<Vec<Candidate>> {
        let generator = CandidateGenerator::new(
            &self.char_stats,
            &self.error_tables,
            &self.vocabulary,
            lm.corpus_len(),
            &self.config.alphabet,
        );

        words
            .par_iter()
            .map(|word| {
                if is_correctable(word) {
                    generator.generate(word, alpha)
                } else {
                    Vec::new()
                }
            })
            .collect()
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// The attached language model, if any.
    #[must_use]
    pub fn language_model(&self) -> Option<&M> {
        self.lm.as_ref()
    }

    /// Words admissible as corrections.
    #[must_use]
    pub fn vocabulary(&self) -> &FnvHashSet<String> {
        &self.vocabulary
    }

    /// Character statistics of the training text.
    #[must_use]
    pub fn char_stats(&self) -> &CharStats {
        &self.char_stats
    }

    /// The confusion matrices in use.
    #[must_use]
    pub fn error_tables(&self) -> &ErrorTables {
        &self.error_tables
    }
}

impl<M: LanguageModel + Serialize + DeserializeOwned> SpellChecker<M> {
    /// `save` writes the whole checker to `path` as one binary blob.
    ///
    /// The blob is written to a temporary file in the same directory and then moved over `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(&temp_file);
            bincode::serialize_into(&mut writer, self)?;
            writer.flush()?;
        }
        temp_file.persist(path).map_err(|e| e.error)?;

        tracing::debug!(?path, "saved spell checker");
        Ok(())
    }

    /// `load` restores a checker written by [`SpellChecker::save`].
    ///
    /// # Errors
    ///
    /// Returns an I/O or deserialization error, or a configuration error if the stored
    /// configuration does not validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let checker: Self = bincode::deserialize_from(reader)?;
        checker.config.validate()?;
        Ok(checker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MalformedPolicy;
    use tempfile::{NamedTempFile, TempDir};

    const CORPUS: &str = "A cat sat on the mat. A fat cat sat on the mat. \
                          A rat sat on the mat. The rat sat on the cat.";

    fn trained() -> SpellChecker {
        let mut checker: SpellChecker = SpellChecker::new(CheckerConfig::default()).unwrap();
        checker.train(CORPUS).unwrap();
        checker
    }

    #[test]
    fn test_unattached_model() {
        let checker: SpellChecker = SpellChecker::default();
        assert!(matches!(
            checker.spell_check("a cat", 0.95),
            Err(SpellError::UnattachedModel)
        ));
        assert!(matches!(
            checker.evaluate("a cat"),
            Err(SpellError::UnattachedModel)
        ));
        assert!(matches!(
            checker.get_candidates("a cat", 0.95),
            Err(SpellError::UnattachedModel)
        ));
    }

    #[test]
    fn test_invalid_alpha_is_rejected_first() {
        let checker: SpellChecker = SpellChecker::default();
        assert!(matches!(
            checker.spell_check("a cat", 1.5),
            Err(SpellError::InvalidAlpha(_))
        ));
        let checker = trained();
        assert!(matches!(
            checker.spell_check("a cat", -0.5),
            Err(SpellError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = CheckerConfig {
            ngram_order: 0,
            ..CheckerConfig::default()
        };
        assert!(SpellChecker::<NgramModel>::new(config).is_err());
    }

    #[test]
    fn test_with_language_model() {
        let text = "a cat sat on the mat a fat cat sat on the mat";
        let mut lm = NgramModel::new(2, std::f64::consts::E);
        lm.build(text);
        let config = CheckerConfig {
            ngram_order: 2,
            ..CheckerConfig::default()
        };

        let mut checker =
            SpellChecker::with_language_model(config, lm, CharStats::from_text(text)).unwrap();
        assert!(checker.vocabulary().contains("fat"));
        assert_eq!(checker.char_stats().char_counts[&'c'], 2);
        assert_eq!(checker.language_model().unwrap().corpus_len(), 13);

        checker.add_error_tables(
            ErrorTables::from_json_str(r#"{"substitution": {"dc": 40}}"#).unwrap(),
        );
        assert_eq!(checker.spell_check("a dat sat", 0.95).unwrap(), "a cat sat");
    }

    #[test]
    fn test_train_sets_vocabulary_and_stats() {
        let checker = trained();
        assert!(checker.vocabulary().contains("cat"));
        assert!(checker.vocabulary().contains("mat."));
        assert!(!checker.vocabulary().contains("dat"));
        assert_eq!(checker.char_stats().char_counts[&'c'], 3);
        assert_eq!(checker.language_model().unwrap().corpus_len(), 25);
    }

    #[test]
    fn test_get_candidates_per_token() {
        let mut checker = trained();
        checker.add_error_tables(
            ErrorTables::from_json_str(r#"{"substitution": {"dc": 8}}"#).unwrap(),
        );

        let candidates = checker.get_candidates("A dat 42 sat.", 0.9).unwrap();
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0][0].word, "a");
        let words: Vec<_> = candidates[1].iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["cat"]);
        assert!(candidates[2].is_empty());
        assert!(candidates[3].is_empty());
    }

    #[test]
    fn test_spell_check_without_error_tables_keeps_text() {
        let checker = trained();
        assert_eq!(
            checker.spell_check("A  dat sat on the MAT.", 0.95).unwrap(),
            "a dat sat on the mat."
        );
    }

    #[test]
    fn test_correct_uses_configured_alpha() {
        let mut checker = trained();
        checker.add_error_tables(
            ErrorTables::from_json_str(r#"{"substitution": {"dc": 40}}"#).unwrap(),
        );
        assert_eq!(checker.correct("a dat sat").unwrap(), "a cat sat");
    }

    #[test]
    fn test_learn_error_tables_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dat\tcat").unwrap();
        writeln!(file, "teh\tthe").unwrap();
        writeln!(file, "xyz\tcat").unwrap();
        file.flush().unwrap();

        let mut checker = trained();
        let report = checker.learn_error_tables(file.path()).unwrap();
        assert_eq!(report, LearnReport { learned: 2, skipped: 1 });
        assert_eq!(checker.error_tables().substitution["dc"], 1);

        let config = CheckerConfig {
            malformed_records: MalformedPolicy::Reject,
            ..CheckerConfig::default()
        };
        let mut strict: SpellChecker = SpellChecker::new(config).unwrap();
        assert!(matches!(
            strict.learn_error_tables(file.path()),
            Err(SpellError::MalformedRecord { line: 3, .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let mut checker = trained();
        checker.add_error_tables(
            ErrorTables::from_json_str(r#"{"substitution": {"dc": 40}}"#).unwrap(),
        );

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("checker.bin");
        checker.save(&path).unwrap();

        let restored: SpellChecker = SpellChecker::load(&path).unwrap();
        assert_eq!(restored.config(), checker.config());
        assert_eq!(restored.vocabulary(), checker.vocabulary());
        assert_eq!(restored.char_stats(), checker.char_stats());
        assert_eq!(restored.error_tables(), checker.error_tables());
        assert_eq!(
            restored.spell_check("a dat sat", 0.95).unwrap(),
            checker.spell_check("a dat sat", 0.95).unwrap()
        );
        assert!(
            (restored.evaluate("a cat sat").unwrap() - checker.evaluate("a cat sat").unwrap())
                .abs()
                < 1e-12
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SpellChecker::<NgramModel>::load(dir.path().join("missing.bin")),
            Err(SpellError::Io(_))
        ));
    }
}
