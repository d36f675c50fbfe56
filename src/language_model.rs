//! Language model prior used by the noisy-channel scorer.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::normalize::tokens;

/// A word-level language model that scores whole texts.
pub trait LanguageModel: Send + Sync {
    /// Log-likelihood of `text` (normalized, space separated) in base [`LanguageModel::log_base`].
    ///
    /// Must tolerate out-of-vocabulary words.
    fn evaluate(&self, text: &str) -> f64;

    /// Base of the logarithms returned by [`LanguageModel::evaluate`].
    fn log_base(&self) -> f64;

    /// Number of tokens in the training corpus.
    fn corpus_len(&self) -> usize;

    /// Unigram frequencies keyed by token.
    fn unigram_counts(&self) -> &FnvHashMap<String, u64>;
}

/// A Laplace-smoothed word n-gram model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NgramModel {
    n: usize,
    log_base: f64,
    /// `counts[k]` holds the (k+1)-grams, keyed by their space-joined tokens.
    counts: Vec<FnvHashMap<String, u64>>,
    corpus_len: usize,
}

impl NgramModel {
    /// `new` creates an empty model of order `n` (at least 1).
    #[must_use]
    pub fn new(n: usize, log_base: f64) -> Self {
        let n = n.max(1);
        Self {
            n,
            log_base,
            counts: vec![FnvHashMap::default(); n],
            corpus_len: 0,
        }
    }

    /// `build` counts every 1..=n gram of the normalized `text`, replacing previous counts.
    pub fn build(&mut self, text: &str) {
        let words = tokens(text);
        self.counts = vec![FnvHashMap::default(); self.n];
        self.corpus_len = words.len();

        for end in 1..=words.len() {
            for len in 1..=self.n.min(end) {
                let gram = words[end - len..end].join(" ");
                *self.counts[len - 1].entry(gram).or_insert(0) += 1;
            }
        }

        tracing::debug!(
            order = self.n,
            corpus_len = self.corpus_len,
            vocabulary = self.counts[0].len(),
            "built n-gram model"
        );
    }

    /// Order of the model.
    #[must_use]
    pub fn order(&self) -> usize {
        self.n
    }

    /// Count of a space-joined n-gram, zero when unseen.
    #[must_use]
    pub fn count(&self, gram: &str) -> u64 {
        let len = tokens(gram).len();
        if len == 0 || len > self.n {
            return 0;
        }
        self.counts[len - 1].get(gram).copied().unwrap_or(0)
    }

    fn context_count(&self, context: &[&str]) -> u64 {
        if context.is_empty() {
            self.corpus_len as u64
        } else {
            self.counts[context.len() - 1]
                .get(&context.join(" "))
                .copied()
                .unwrap_or(0)
        }
    }
}

impl LanguageModel for NgramModel {
    fn evaluate(&self, text: &str) -> f64 {
        let words = tokens(text);
        let vocabulary = self.counts[0].len() as f64;
        let ln_base = self.log_base.ln();

        let mut log_prob = 0.0;
        for i in 0..words.len() {
            let start = (i + 1).saturating_sub(self.n);
            let context = &words[start..i];
            let gram = words[start..=i].join(" ");

            let numerator = self.counts[context.len()].get(&gram).copied().unwrap_or(0) as f64 + 1.0;
            let denominator = (self.context_count(context) as f64 + vocabulary).max(1.0);
            log_prob += (numerator / denominator).ln() / ln_base;
        }

        log_prob
    }

    fn log_base(&self) -> f64 {
        self.log_base
    }

    fn corpus_len(&self) -> usize {
        self.corpus_len
    }

    fn unigram_counts(&self) -> &FnvHashMap<String, u64> {
        &self.counts[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> NgramModel {
        let mut lm = NgramModel::new(3, std::f64::consts::E);
        lm.build("a cat sat on the mat a fat cat sat on the mat");
        lm
    }

    #[test]
    fn test_counts() {
        let lm = model();
        assert_eq!(lm.corpus_len(), 13);
        assert_eq!(lm.count("cat"), 2);
        assert_eq!(lm.count("cat sat"), 2);
        assert_eq!(lm.count("a cat sat"), 1);
        assert_eq!(lm.count("dog"), 0);
        assert_eq!(lm.count("a b c d"), 0);
        assert_eq!(lm.unigram_counts().len(), 7);
    }

    #[test]
    fn test_evaluate_prefers_seen_text() {
        let lm = model();
        let seen = lm.evaluate("a cat sat on the mat");
        let unseen = lm.evaluate("a dat sat on the mat");
        assert!(seen.is_finite());
        assert!(unseen.is_finite());
        assert!(seen > unseen);
    }

    #[test]
    fn test_evaluate_empty_text() {
        let lm = model();
        assert!(lm.evaluate("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_base() {
        let mut lm = NgramModel::new(2, 10.0);
        lm.build("a cat sat");
        let natural = {
            let mut lm = NgramModel::new(2, std::f64::consts::E);
            lm.build("a cat sat");
            lm.evaluate("cat sat")
        };
        assert!((lm.evaluate("cat sat") - natural / 10f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_model_does_not_divide_by_zero() {
        let lm = NgramModel::new(3, std::f64::consts::E);
        assert!(lm.evaluate("anything at all").is_finite());
    }
}
