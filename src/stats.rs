//! Character statistics of the training text, used as channel-probability denominators.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// Single and adjacent-pair character counts of a lower-cased training text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharStats {
    /// Occurrences of each alphabetic character.
    pub char_counts: FnvHashMap<char, u64>,
    /// Occurrences of each window of two adjacent alphabetic characters.
    pub two_char_counts: FnvHashMap<String, u64>,
}

impl CharStats {
    /// `from_text` counts alphabetic characters and fully alphabetic two-character windows.
    ///
    /// # Example
    ///
    /// ```
    /// use noisy_spell::CharStats;
    ///
    /// let stats = CharStats::from_text("ab, b");
    /// assert_eq!(stats.char_counts[&'b'], 2);
    /// assert_eq!(stats.two_char_counts["ab"], 1);
    /// assert!(!stats.two_char_counts.contains_key("b,"));
    /// ```
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut stats = Self::default();
        let chars: Vec<char> = text.chars().collect();

        for (i, &c) in chars.iter().enumerate() {
            if !c.is_alphabetic() {
                continue;
            }
            *stats.char_counts.entry(c).or_insert(0) += 1;

            if let Some(&next) = chars.get(i + 1) {
                if next.is_alphabetic() {
                    *stats
                        .two_char_counts
                        .entry([c, next].iter().collect())
                        .or_insert(0) += 1;
                }
            }
        }

        stats
    }

    /// Count of `c`, or 1 when unseen so it can always divide.
    #[must_use]
    pub fn char_count(&self, c: char) -> u64 {
        self.char_counts.get(&c).copied().unwrap_or_else(|| {
            tracing::trace!(?c, "unseen character, using denominator 1");
            1
        })
    }

    /// Count of the window `ab`, or 1 when unseen.
    #[must_use]
    pub fn two_char_count(&self, a: char, b: char) -> u64 {
        let key: String = [a, b].iter().collect();
        self.two_char_counts.get(&key).copied().unwrap_or_else(|| {
            tracing::trace!(?key, "unseen character pair, using denominator 1");
            1
        })
    }

    /// Whether nothing has been counted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.char_counts.is_empty()
    }
}
