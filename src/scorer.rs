//! Noisy-channel scoring of whole-text hypotheses.

use rayon::prelude::*;

use crate::candidates::Candidate;
use crate::language_model::LanguageModel;

/// A reconstructed text and its combined log-probability.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredText {
    /// The full text with at most one word replaced.
    pub text: String,
    /// `log P(observed | candidate) + log P(text)` in the model's log base.
    pub log_prob: f64,
}

/// `best_text` substitutes each candidate at its token position, one substitution per
/// hypothesis, and returns the most probable text.
///
/// The search starts from the unchanged text at `-inf`, so it is returned only when no
/// hypothesis was scored. On equal scores the hypothesis enumerated first wins: token
/// positions left to right, candidates in generation order.
///
/// # Arguments
///
/// * `lm` - The language model prior.
/// * `words` - Tokens of the normalized text.
/// * `candidates` - Candidates per token position, empty for tokens that are not corrected.
#[must_use]
pub fn best_text<M>(lm: &M, words: &[&str], candidates: &[Vec<Candidate>]) -> ScoredText
where
    M: LanguageModel + ?Sized,
{
    let ln_base = lm.log_base().ln();

    let hypotheses: Vec<(usize, &Candidate)> = candidates
        .iter()
        .enumerate()
        .flat_map(|(idx, per_word)| per_word.iter().map(move |candidate| (idx, candidate)))
        .collect();

    // Collecting keeps enumeration order, so the sequential reduction below is deterministic.
    let scored: Vec<ScoredText> = hypotheses
        .par_iter()
        .map(|&(idx, candidate)| {
            let text = substitute(words, idx, &candidate.word);
            let prior_log_prob = lm.evaluate(&text);
            let channel_log_prob = candidate.probability.ln() / ln_base;
            tracing::trace!(
                ?text,
                prior_log_prob,
                channel_log_prob,
                "scored hypothesis"
            );
            ScoredText {
                text,
                log_prob: channel_log_prob + prior_log_prob,
            }
        })
        .collect();

    let mut best = ScoredText {
        text: words.join(" "),
        log_prob: f64::NEG_INFINITY,
    };
    for hypothesis in scored {
        if hypothesis.log_prob > best.log_prob {
            best = hypothesis;
        }
    }

    best
}

fn substitute(words: &[&str], idx: usize, replacement: &str) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| if i == idx { replacement } else { *word })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnv::FnvHashMap;

    /// Scores a text by ten times the number of occurrences of `good`.
    struct Counting {
        good: &'static str,
        unigrams: FnvHashMap<String, u64>,
    }

    impl Counting {
        fn new(good: &'static str) -> Self {
            Self {
                good,
                unigrams: FnvHashMap::default(),
            }
        }
    }

    impl LanguageModel for Counting {
        fn evaluate(&self, text: &str) -> f64 {
            10.0 * text.split(' ').filter(|w| *w == self.good).count() as f64
        }

        fn log_base(&self) -> f64 {
            std::f64::consts::E
        }

        fn corpus_len(&self) -> usize {
            0
        }

        fn unigram_counts(&self) -> &FnvHashMap<String, u64> {
            &self.unigrams
        }
    }

    fn candidate(word: &str, probability: f64) -> Candidate {
        Candidate {
            word: word.to_string(),
            probability,
        }
    }

    #[test]
    fn test_no_candidates_returns_original() {
        let lm = Counting::new("cat");
        let best = best_text(&lm, &["a", "dat", "sat."], &[vec![], vec![], vec![]]);
        assert_eq!(best.text, "a dat sat.");
        assert_eq!(best.log_prob, f64::NEG_INFINITY);
    }

    #[test]
    fn test_prior_beats_channel() {
        let lm = Counting::new("cat");
        let candidates = vec![
            vec![candidate("a", 0.95)],
            vec![candidate("dat", 0.95), candidate("cat", 0.05)],
        ];
        let best = best_text(&lm, &["a", "dat"], &candidates);
        assert_eq!(best.text, "a cat");
        assert!((best.log_prob - (0.05f64.ln() + 10.0)).abs() < 1e-12);
    }

    #[test]
    fn test_channel_decides_without_prior() {
        let lm = Counting::new("zzz");
        let candidates = vec![vec![candidate("dat", 0.9), candidate("cat", 0.05)]];
        let best = best_text(&lm, &["dat"], &candidates);
        assert_eq!(best.text, "dat");
    }

    #[test]
    fn test_ties_keep_first_hypothesis() {
        let lm = Counting::new("zzz");
        let candidates = vec![
            vec![candidate("bat", 0.5), candidate("cat", 0.5)],
            vec![candidate("mat", 0.5)],
        ];
        for _ in 0..10 {
            let best = best_text(&lm, &["dat", "hat"], &candidates);
            assert_eq!(best.text, "bat hat");
        }
    }
}
