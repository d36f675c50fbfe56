//! Confusion matrices of single-character typing errors and the learner that fills them.
//!
//! Every table maps a two-character key to an observed count:
//!
//! * `insertion["xy"]`: `y` was wrongly typed after `x`.
//! * `deletion["xy"]`: `y` was omitted after `x`.
//! * `substitution["xy"]`: `x` was typed in place of the correct `y`.
//! * `transposition["xy"]`: the adjacent `x`, `y` were swapped.
//!
//! For insertions and deletions `x` may be [`WORD_START`], the start-of-word sentinel.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::config::MalformedPolicy;
use crate::error::{Result, SpellError};

/// Sentinel standing for the position before the first character of a word.
pub const WORD_START: char = '#';

/// The four kinds of single-character edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    /// A character is missing from the typed word.
    Deletion,
    /// An extra character was typed.
    Insertion,
    /// A character was typed as another one.
    Substitution,
    /// Two adjacent characters were swapped.
    Transposition,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::Deletion => "deletion",
            EditKind::Insertion => "insertion",
            EditKind::Substitution => "substitution",
            EditKind::Transposition => "transposition",
        };
        f.write_str(name)
    }
}

/// The four confusion matrices.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTables {
    /// Omitted-character counts.
    #[serde(default)]
    pub deletion: FnvHashMap<String, u64>,
    /// Extra-character counts.
    #[serde(default)]
    pub insertion: FnvHashMap<String, u64>,
    /// Wrong-character counts.
    #[serde(default)]
    pub substitution: FnvHashMap<String, u64>,
    /// Swapped-pair counts.
    #[serde(default)]
    pub transposition: FnvHashMap<String, u64>,
}

/// Summary of a learning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LearnReport {
    /// Records turned into a table increment.
    pub learned: usize,
    /// Records skipped because they are not a single edit.
    pub skipped: usize,
}

impl ErrorTables {
    /// Table holding the counts of `kind`.
    #[must_use]
    pub fn table(&self, kind: EditKind) -> &FnvHashMap<String, u64> {
        match kind {
            EditKind::Deletion => &self.deletion,
            EditKind::Insertion => &self.insertion,
            EditKind::Substitution => &self.substitution,
            EditKind::Transposition => &self.transposition,
        }
    }

    fn table_mut(&mut self, kind: EditKind) -> &mut FnvHashMap<String, u64> {
        match kind {
            EditKind::Deletion => &mut self.deletion,
            EditKind::Insertion => &mut self.insertion,
            EditKind::Substitution => &mut self.substitution,
            EditKind::Transposition => &mut self.transposition,
        }
    }

    /// Count of the key `xy` in the `kind` table, zero when unseen.
    #[must_use]
    pub fn count(&self, kind: EditKind, x: char, y: char) -> u64 {
        let key = key(x, y);
        self.table(kind).get(&key).copied().unwrap_or_else(|| {
            tracing::trace!(%kind, ?key, "unseen confusion key, using count 0");
            0
        })
    }

    /// Add one observation of `key` to the `kind` table.
    pub fn increment(&mut self, kind: EditKind, key: String) {
        *self.table_mut(kind).entry(key).or_insert(0) += 1;
    }

    /// Whether all four tables are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletion.is_empty()
            && self.insertion.is_empty()
            && self.substitution.is_empty()
            && self.transposition.is_empty()
    }

    /// `learn` builds the tables from `(error, correct)` word pairs.
    ///
    /// Records that are not exactly one edit apart are skipped or rejected according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`SpellError::MalformedRecord`] under [`MalformedPolicy::Reject`].
    ///
    /// # Example
    ///
    /// ```
    /// use noisy_spell::{EditKind, ErrorTables, MalformedPolicy};
    ///
    /// fn main() -> Result<(), anyhow::Error> {
    ///     let records = [("acress", "actress"), ("caress", "acress"), ("dat", "cat")];
    ///     let (tables, report) = ErrorTables::learn(records, MalformedPolicy::Skip)?;
    ///     assert_eq!(report.learned, 3);
    ///     assert_eq!(tables.count(EditKind::Deletion, 'c', 't'), 1);
    ///     assert_eq!(tables.count(EditKind::Transposition, 'a', 'c'), 1);
    ///     assert_eq!(tables.count(EditKind::Substitution, 'd', 'c'), 1);
    ///     Ok(())
    /// }
    /// ```
    pub fn learn<I, E, C>(records: I, policy: MalformedPolicy) -> Result<(Self, LearnReport)>
    where
        I: IntoIterator<Item = (E, C)>,
        E: AsRef<str>,
        C: AsRef<str>,
    {
        let mut tables = Self::default();
        let mut report = LearnReport::default();

        for (idx, (error, correct)) in records.into_iter().enumerate() {
            let (error, correct) = (error.as_ref(), correct.as_ref());
            tables.record(idx + 1, error, correct, policy, &mut report)?;
        }

        tracing::debug!(
            learned = report.learned,
            skipped = report.skipped,
            "learned error tables"
        );

        Ok((tables, report))
    }

    /// `learn_tsv` reads `error<TAB>correct` lines and learns from them.
    ///
    /// Blank lines and lines starting with `#` are ignored. Columns after the second are ignored.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, or [`SpellError::MalformedRecord`] under [`MalformedPolicy::Reject`]
    /// for a line without two columns or a pair that is not a single edit.
    pub fn learn_tsv<R: Read>(reader: R, policy: MalformedPolicy) -> Result<(Self, LearnReport)> {
        let mut tables = Self::default();
        let mut report = LearnReport::default();

        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut columns = line.split('\t');
            let (Some(error), Some(correct)) = (columns.next(), columns.next()) else {
                let reason = "expected two tab-separated columns";
                reject_or_skip(policy, line_no, reason, &mut report)?;
                continue;
            };

            tables.record(line_no, error, correct, policy, &mut report)?;
        }

        tracing::debug!(
            learned = report.learned,
            skipped = report.skipped,
            "learned error tables from tsv"
        );

        Ok((tables, report))
    }

    /// `learn_tsv_file` opens `path` and calls [`ErrorTables::learn_tsv`].
    ///
    /// # Errors
    ///
    /// See [`ErrorTables::learn_tsv`].
    pub fn learn_tsv_file<P: AsRef<Path>>(
        path: P,
        policy: MalformedPolicy,
    ) -> Result<(Self, LearnReport)> {
        Self::learn_tsv(File::open(path)?, policy)
    }

    /// `from_json_str` loads precomputed matrices of the form
    /// `{"deletion": {"xy": 3}, "insertion": {...}, "substitution": {...}, "transposition": {...}}`.
    ///
    /// Missing tables are empty.
    ///
    /// # Errors
    ///
    /// Returns [`SpellError::Json`] on invalid input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `from_json_file` reads [`ErrorTables::from_json_str`] input from `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O or JSON error.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    /// Classify one `error`, `correct` record and count it, or apply `policy` to it.
    fn record(
        &mut self,
        line: usize,
        error: &str,
        correct: &str,
        policy: MalformedPolicy,
        report: &mut LearnReport,
    ) -> Result<()> {
        let error = error.trim().to_lowercase();
        let correct = correct.trim().to_lowercase();

        match classify(&error, &correct) {
            Some((kind, key)) => {
                self.increment(kind, key);
                report.learned += 1;
                Ok(())
            }
            None => {
                let reason = format!("{error:?} -> {correct:?} is not a single edit");
                reject_or_skip(policy, line, &reason, report)
            }
        }
    }
}

fn reject_or_skip(
    policy: MalformedPolicy,
    line: usize,
    reason: &str,
    report: &mut LearnReport,
) -> Result<()> {
    match policy {
        MalformedPolicy::Reject => Err(SpellError::malformed(line, reason)),
        MalformedPolicy::Skip => {
            tracing::warn!(line, reason, "skipping malformed error record");
            report.skipped += 1;
            Ok(())
        }
    }
}

fn key(x: char, y: char) -> String {
    [x, y].iter().collect()
}

/// `classify` finds the single edit that turns `correct` into `error`, with its table key.
///
/// Returns `None` when the words are equal or more than one edit apart.
#[must_use]
pub fn classify(error: &str, correct: &str) -> Option<(EditKind, String)> {
    let typed: Vec<char> = error.chars().collect();
    let intended: Vec<char> = correct.chars().collect();

    if typed.is_empty() || intended.is_empty() || typed == intended {
        return None;
    }

    let first_diff = typed
        .iter()
        .zip(&intended)
        .position(|(a, b)| a != b)
        .unwrap_or(typed.len().min(intended.len()));
    let before = |chars: &[char], i: usize| if i == 0 { WORD_START } else { chars[i - 1] };

    if typed.len() == intended.len() {
        let i = first_diff;
        if typed[i + 1..] == intended[i + 1..] {
            return Some((EditKind::Substitution, key(typed[i], intended[i])));
        }
        let swapped = i + 1 < typed.len()
            && typed[i] == intended[i + 1]
            && typed[i + 1] == intended[i]
            && typed[i + 2..] == intended[i + 2..];
        return swapped.then(|| (EditKind::Transposition, key(intended[i], intended[i + 1])));
    }

    // Within a run of equal letters the leftmost position is used, matching the
    // order in which the candidate generator first reaches the edit.
    if typed.len() == intended.len() + 1 {
        let i = leftmost_in_run(&typed, first_diff);
        return (typed[i + 1..] == intended[i..])
            .then(|| (EditKind::Insertion, key(before(&typed, i), typed[i])));
    }

    if typed.len() + 1 == intended.len() {
        let i = leftmost_in_run(&intended, first_diff);
        return (typed[i..] == intended[i + 1..])
            .then(|| (EditKind::Deletion, key(before(&intended, i), intended[i])));
    }

    None
}

fn leftmost_in_run(chars: &[char], mut i: usize) -> usize {
    while i > 0 && chars[i - 1] == chars[i] {
        i -= 1;
    }
    i
}
