//! Candidate corrections of a single word, with their channel probabilities.
//!
//! Candidates are found by a breadth-limited search over the edit graph: the word
//! itself (distance 0), every single-character edit of it (distance 1) and every
//! single-character edit of those (distance 2). A visited set guarantees that each
//! string enters the result once, with the probability of the first path reaching it.

use fnv::FnvHashSet;

use crate::error_tables::{EditKind, ErrorTables, WORD_START};
use crate::stats::CharStats;

/// A possible correction and `P(observed word | candidate)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// The corrected word.
    pub word: String,
    /// Channel probability, already weighted by `alpha` or `1 - alpha`.
    pub probability: f64,
}

/// Enumerates the edits of a word up to distance 2 and keeps the admissible ones.
pub struct CandidateGenerator<'a> {
    stats: &'a CharStats,
    tables: &'a ErrorTables,
    vocabulary: &'a FnvHashSet<String>,
    corpus_len: usize,
    alphabet: Vec<char>,
}

impl<'a> CandidateGenerator<'a> {
    /// `new` creates a generator over borrowed statistics.
    ///
    /// # Arguments
    ///
    /// * `corpus_len` - Token count of the training corpus, the start-of-word denominator.
    /// * `alphabet` - Letters tried by deletion and substitution edits.
    #[must_use]
    pub fn new(
        stats: &'a CharStats,
        tables: &'a ErrorTables,
        vocabulary: &'a FnvHashSet<String>,
        corpus_len: usize,
        alphabet: &str,
    ) -> Self {
        Self {
            stats,
            tables,
            vocabulary,
            corpus_len,
            alphabet: alphabet.chars().collect(),
        }
    }

    /// `generate` returns every in-vocabulary word within two edits of `word` whose channel
    /// probability is positive, in enumeration order. `word` itself comes first, with `alpha`.
    ///
    /// # Arguments
    ///
    /// * `word` - An alphabetic, lower-cased token.
    /// * `alpha` - Probability that `word` is already correct.
    #[must_use]
    pub fn generate(&self, word: &str, alpha: f64) -> Vec<Candidate> {
        let mut visited = FnvHashSet::default();
        visited.insert(word.to_string());

        let distance_one = self.edits(word, 1.0 - alpha, &mut visited);
        let mut distance_two = Vec::new();
        for (edit, prior) in &distance_one {
            distance_two.extend(self.edits(edit, *prior, &mut visited));
        }

        std::iter::once((word.to_string(), alpha))
            .chain(distance_one)
            .chain(distance_two)
            .filter(|(edit, probability)| *probability > 0.0 && self.vocabulary.contains(edit))
            .map(|(word, probability)| Candidate { word, probability })
            .collect()
    }

    /// `edits` computes the unvisited single edits of `word`, each with `prior * P(word | edit)`.
    ///
    /// Newly produced strings are added to `visited`.
    fn edits(
        &self,
        word: &str,
        prior: f64,
        visited: &mut FnvHashSet<String>,
    ) -> Vec<(String, f64)> {
        let mut edits = Vec::new();
        if prior <= 0.0 {
            return edits;
        }

        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        let mut push = |edit: String, probability: f64| {
            if !visited.contains(&edit) {
                visited.insert(edit.clone());
                edits.push((edit, probability));
            }
        };

        for i in 0..=n {
            let before = if i == 0 { WORD_START } else { chars[i - 1] };

            // The observed word has an extra chars[i].
            if i < n {
                let edit = splice(&chars[..i], None, &chars[i + 1..]);
                let count = self.tables.count(EditKind::Insertion, before, chars[i]);
                let total = if i == 0 {
                    self.corpus_len.max(1) as u64
                } else {
                    self.stats.char_count(before)
                };
                push(edit, prior * ratio(count, total));
            }

            // The observed word swapped chars[i] and chars[i + 1].
            if i + 1 < n {
                let (x, y) = (chars[i + 1], chars[i]);
                let mut swapped = chars.clone();
                swapped.swap(i, i + 1);
                let count = self.tables.count(EditKind::Transposition, x, y);
                let total = self.stats.two_char_count(x, y);
                push(swapped.into_iter().collect(), prior * ratio(count, total));
            }

            for &letter in &self.alphabet {
                // The observed word is missing `letter` at i.
                let edit = splice(&chars[..i], Some(letter), &chars[i..]);
                let count = self.tables.count(EditKind::Deletion, before, letter);
                let total = if i == 0 {
                    self.stats.char_count(letter)
                } else {
                    self.stats.two_char_count(before, letter)
                };
                push(edit, prior * ratio(count, total));

                // The observed chars[i] was typed for `letter`.
                if i < n {
                    let edit = splice(&chars[..i], Some(letter), &chars[i + 1..]);
                    let count = self.tables.count(EditKind::Substitution, chars[i], letter);
                    let total = self.stats.char_count(letter);
                    push(edit, prior * ratio(count, total));
                }
            }
        }

        edits
    }
}

fn splice(head: &[char], middle: Option<char>, tail: &[char]) -> String {
    head.iter().copied().chain(middle).chain(tail.iter().copied()).collect()
}

#[allow(clippy::cast_precision_loss)]
fn ratio(count: u64, total: u64) -> f64 {
    count as f64 / total.max(1) as f64
}
