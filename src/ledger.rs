//! Local high-score ledger.
//!
//! Append-only: entries are recorded once and never edited. The ledger reads
//! the whole collection from its [`Store`] on every query, so several ledgers
//! over the same file always agree.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::Difficulty;
use crate::storage::{PersistenceError, Store};

/// One recorded attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreEntry {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub difficulty: Difficulty,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
}

/// Outcome of committing a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// The stored entry, absent if the write failed.
    pub entry: Option<HighScoreEntry>,
    pub is_new_best: bool,
}

pub type Clock = fn() -> DateTime<Utc>;

/// Rounded percentage, half up. Zero when `total` is zero.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    ((200 * score + total) / (2 * total)) as u32
}

pub struct Ledger {
    store: Arc<dyn Store<Vec<HighScoreEntry>>>,
    clock: Clock,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store<Vec<HighScoreEntry>>>) -> Self {
        Self::with_clock(store, Utc::now)
    }

    pub fn with_clock(store: Arc<dyn Store<Vec<HighScoreEntry>>>, clock: Clock) -> Self {
        Self { store, clock }
    }

    fn load(&self) -> Result<Vec<HighScoreEntry>, PersistenceError> {
        Ok(self.store.read()?.unwrap_or_default())
    }

    /// Append an entry for `score` out of `total` and persist the collection.
    pub fn record(
        &self,
        score: u32,
        total: u32,
        difficulty: Difficulty,
    ) -> Result<HighScoreEntry, PersistenceError> {
        let mut entries = self.load()?;
        self.append(&mut entries, score, total, difficulty)
    }

    fn append(
        &self,
        entries: &mut Vec<HighScoreEntry>,
        score: u32,
        total: u32,
        difficulty: Difficulty,
    ) -> Result<HighScoreEntry, PersistenceError> {
        debug_assert!(total > 0, "an attempt always has at least one question");

        let entry = HighScoreEntry {
            score,
            total_questions: total,
            percentage: percentage(score, total),
            difficulty,
            timestamp: (self.clock)(),
        };
        entries.push(entry.clone());
        self.store.write(entries)?;

        info!(
            score,
            total,
            percentage = entry.percentage,
            %difficulty,
            "recorded attempt"
        );
        Ok(entry)
    }

    /// Highest percentage for `difficulty`; the earliest entry wins ties.
    pub fn best_for(&self, difficulty: Difficulty) -> Result<Option<HighScoreEntry>, PersistenceError> {
        Ok(best_of(&self.load()?, difficulty).cloned())
    }

    /// Whether the candidate strictly beats every entry already recorded for `difficulty`.
    pub fn is_new_best(
        &self,
        score: u32,
        total: u32,
        difficulty: Difficulty,
    ) -> Result<bool, PersistenceError> {
        Ok(beats(&self.load()?, percentage(score, total), difficulty))
    }

    /// Evaluate the new-best verdict and record the attempt against a single read.
    ///
    /// Never fails: persistence problems are logged and the verdict falls back
    /// to "not a new best".
    pub fn commit_attempt(&self, score: u32, total: u32, difficulty: Difficulty) -> Verdict {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "high scores unavailable, attempt not recorded");
                return Verdict {
                    entry: None,
                    is_new_best: false,
                };
            }
        };

        let is_new_best = beats(&entries, percentage(score, total), difficulty);
        match self.append(&mut entries, score, total, difficulty) {
            Ok(entry) => {
                debug!(is_new_best, "committed attempt");
                Verdict {
                    entry: Some(entry),
                    is_new_best,
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to save high score");
                Verdict {
                    entry: None,
                    is_new_best: false,
                }
            }
        }
    }

    /// Every entry, best first; equal percentages show the most recent first.
    pub fn all_entries(&self) -> Result<Vec<HighScoreEntry>, PersistenceError> {
        let mut entries = self.load()?;
        entries.sort_by(leaderboard_order);
        Ok(entries)
    }

    pub fn top(&self, n: usize) -> Result<Vec<HighScoreEntry>, PersistenceError> {
        let mut entries = self.all_entries()?;
        entries.truncate(n);
        Ok(entries)
    }
}

fn best_of(entries: &[HighScoreEntry], difficulty: Difficulty) -> Option<&HighScoreEntry> {
    entries
        .iter()
        .filter(|e| e.difficulty == difficulty)
        .fold(None, |best: Option<&HighScoreEntry>, e| match best {
            Some(b) if b.percentage > e.percentage => Some(b),
            Some(b) if b.percentage == e.percentage && b.timestamp <= e.timestamp => Some(b),
            _ => Some(e),
        })
}

fn beats(entries: &[HighScoreEntry], candidate: u32, difficulty: Difficulty) -> bool {
    !entries
        .iter()
        .any(|e| e.difficulty == difficulty && e.percentage >= candidate)
}

fn leaderboard_order(a: &HighScoreEntry, b: &HighScoreEntry) -> Ordering {
    b.percentage
        .cmp(&a.percentage)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}
