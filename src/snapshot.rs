//! The read-only package a finished attempt hands to the results view.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::{self, Verdict};
use crate::models::{Difficulty, Question, NUM_OPTIONS};
use crate::session::{self, CompletedAttempt};
use crate::storage::{PersistenceError, Store};

/// Reading a snapshot back is checked against the invariants a finished
/// attempt always holds; a stored file that breaks them is corrupt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SnapshotRecord")]
pub struct ResultSnapshot {
    questions: Vec<Question>,
    #[serde(rename = "answers")]
    selected_answers: Vec<Option<usize>>,
    score: u32,
    difficulty: Difficulty,
    is_new_high_score: bool,
}

/// The persisted shape, before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    score: u32,
    difficulty: Difficulty,
    is_new_high_score: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSnapshot {
    #[error("{answers} answers recorded for {questions} questions")]
    AnswerCount { questions: usize, answers: usize },

    #[error("question {number} has correct answer {index}, out of {} options", NUM_OPTIONS)]
    CorrectAnswerOutOfRange { number: usize, index: usize },

    #[error("answer {index} to question {number} is out of range")]
    AnswerOutOfRange { number: usize, index: usize },

    #[error("stored score {stored} does not match the answers ({actual})")]
    ScoreMismatch { stored: u32, actual: u32 },
}

impl TryFrom<SnapshotRecord> for ResultSnapshot {
    type Error = InvalidSnapshot;

    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        if record.answers.len() != record.questions.len() {
            return Err(InvalidSnapshot::AnswerCount {
                questions: record.questions.len(),
                answers: record.answers.len(),
            });
        }

        for (number, (question, answer)) in record.questions.iter().zip(&record.answers).enumerate() {
            if question.correct_option_index >= NUM_OPTIONS {
                return Err(InvalidSnapshot::CorrectAnswerOutOfRange {
                    number: number + 1,
                    index: question.correct_option_index,
                });
            }
            if let Some(index) = answer.filter(|&i| i >= NUM_OPTIONS) {
                return Err(InvalidSnapshot::AnswerOutOfRange {
                    number: number + 1,
                    index,
                });
            }
        }

        let actual = session::score(&record.questions, &record.answers);
        if actual != record.score {
            return Err(InvalidSnapshot::ScoreMismatch {
                stored: record.score,
                actual,
            });
        }

        Ok(Self {
            questions: record.questions,
            selected_answers: record.answers,
            score: record.score,
            difficulty: record.difficulty,
            is_new_high_score: record.is_new_high_score,
        })
    }
}

/// One row of the question review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionReview<'a> {
    pub number: usize,
    pub question: &'a Question,
    pub answer: Option<usize>,
    pub is_correct: bool,
}

impl QuestionReview<'_> {
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.and_then(|index| self.question.option(index))
    }
}

impl ResultSnapshot {
    pub fn from_attempt(attempt: CompletedAttempt, verdict: &Verdict) -> Self {
        Self {
            questions: attempt.questions,
            selected_answers: attempt.selected_answers,
            score: attempt.score,
            difficulty: attempt.difficulty,
            is_new_high_score: verdict.is_new_best,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn selected_answers(&self) -> &[Option<usize>] {
        &self.selected_answers
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn is_new_high_score(&self) -> bool {
        self.is_new_high_score
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn percentage(&self) -> u32 {
        ledger::percentage(self.score, self.total())
    }

    pub fn review(&self) -> impl Iterator<Item = QuestionReview<'_>> {
        self.questions
            .iter()
            .zip(&self.selected_answers)
            .enumerate()
            .map(|(index, (question, answer))| QuestionReview {
                number: index + 1,
                question,
                answer: *answer,
                is_correct: question.is_correct(*answer),
            })
    }

    pub fn verdict_message(&self) -> &'static str {
        match self.percentage() {
            90.. => "Outstanding! You're a quiz master!",
            80..=89 => "Excellent work! You really know your stuff!",
            70..=79 => "Great job! You did very well!",
            60..=69 => "Good effort! Keep practicing!",
            50..=59 => "Not bad! There's room for improvement!",
            _ => "Keep studying and try again!",
        }
    }
}

/// Publishes finished attempts and remembers the last one.
pub struct SnapshotHandoff {
    store: Arc<dyn Store<ResultSnapshot>>,
}

impl SnapshotHandoff {
    pub fn new(store: Arc<dyn Store<ResultSnapshot>>) -> Self {
        Self { store }
    }

    /// Freeze `attempt` into a snapshot and persist it as the last attempt.
    ///
    /// The snapshot is returned even when it could not be persisted.
    pub fn publish(&self, attempt: CompletedAttempt, verdict: &Verdict) -> ResultSnapshot {
        let snapshot = ResultSnapshot::from_attempt(attempt, verdict);
        match self.store.write(&snapshot) {
            Ok(()) => info!(
                score = snapshot.score,
                total = snapshot.total(),
                new_high_score = snapshot.is_new_high_score,
                "published results"
            ),
            Err(err) => warn!(error = %err, "failed to persist last attempt"),
        }
        snapshot
    }

    /// The last published snapshot; `None` means there is no completed attempt.
    pub fn latest(&self) -> Result<Option<ResultSnapshot>, PersistenceError> {
        self.store.read()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::storage::{JsonFileStore, MemoryStore};

    fn attempt(answers: Vec<Option<usize>>) -> CompletedAttempt {
        let questions: Vec<Question> = (0..answers.len())
            .map(|i| Question {
                id: i as u32,
                text: format!("Q{}", i),
                options: [
                    "w".to_string(),
                    "x".to_string(),
                    "y".to_string(),
                    "z".to_string(),
                ],
                correct_option_index: 0,
                category: "Films".to_string(),
                difficulty: Difficulty::Easy,
            })
            .collect();
        let score = crate::session::score(&questions, &answers);
        CompletedAttempt {
            session_id: Uuid::new_v4(),
            difficulty: Difficulty::Easy,
            questions,
            selected_answers: answers,
            score,
        }
    }

    fn verdict(is_new_best: bool) -> Verdict {
        Verdict {
            entry: None,
            is_new_best,
        }
    }

    #[test]
    fn test_snapshot_packages_attempt() {
        let snapshot = ResultSnapshot::from_attempt(
            attempt(vec![Some(0), Some(2), None, Some(0)]),
            &verdict(true),
        );
        assert_eq!(snapshot.score(), 2);
        assert_eq!(snapshot.total(), 4);
        assert_eq!(snapshot.percentage(), 50);
        assert!(snapshot.is_new_high_score());
        assert_eq!(snapshot.verdict_message(), "Not bad! There's room for improvement!");
    }

    #[test]
    fn test_review_rows() {
        let snapshot =
            ResultSnapshot::from_attempt(attempt(vec![Some(0), Some(3), None]), &verdict(false));
        let rows: Vec<_> = snapshot.review().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_correct);
        assert_eq!(rows[1].answer_text(), Some("z"));
        assert!(!rows[1].is_correct);
        assert_eq!(rows[2].answer_text(), None);
        assert_eq!(rows[2].number, 3);
    }

    #[test]
    fn test_latest_is_absent_before_first_publish() {
        let handoff = SnapshotHandoff::new(Arc::new(MemoryStore::new()));
        assert!(handoff.latest().unwrap().is_none());

        let published = handoff.publish(attempt(vec![Some(0)]), &verdict(true));
        assert_eq!(handoff.latest().unwrap(), Some(published));
    }

    fn stored(dir: &std::path::Path, body: serde_json::Value) -> SnapshotHandoff {
        let path = dir.join("last_attempt.json");
        std::fs::write(&path, body.to_string()).unwrap();
        SnapshotHandoff::new(Arc::new(JsonFileStore::new(&path)))
    }

    fn stored_question(correct: usize) -> serde_json::Value {
        serde_json::json!({
            "id": 0,
            "question": "Q0",
            "options": ["w", "x", "y", "z"],
            "correctAnswer": correct,
            "category": "Films",
            "difficulty": "easy"
        })
    }

    #[test]
    fn test_out_of_range_correct_answer_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = stored(
            dir.path(),
            serde_json::json!({
                "questions": [stored_question(7)],
                "answers": [0],
                "score": 0,
                "difficulty": "easy",
                "isNewHighScore": false
            }),
        );

        let err = handoff.latest().unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
        assert!(err.to_string().contains("out of 4 options"));
    }

    #[test]
    fn test_answer_count_and_score_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        let short = stored(
            dir.path(),
            serde_json::json!({
                "questions": [stored_question(0), stored_question(1)],
                "answers": [0],
                "score": 1,
                "difficulty": "easy",
                "isNewHighScore": false
            }),
        );
        assert!(matches!(
            short.latest(),
            Err(PersistenceError::Corrupt { .. })
        ));

        let inflated = stored(
            dir.path(),
            serde_json::json!({
                "questions": [stored_question(0)],
                "answers": [null],
                "score": 1,
                "difficulty": "easy",
                "isNewHighScore": true
            }),
        );
        assert!(matches!(
            inflated.latest(),
            Err(PersistenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_valid_stored_snapshot_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let handoff = stored(
            dir.path(),
            serde_json::json!({
                "questions": [stored_question(2)],
                "answers": [2],
                "score": 1,
                "difficulty": "easy",
                "isNewHighScore": true
            }),
        );

        let snapshot = handoff.latest().unwrap().unwrap();
        assert_eq!(snapshot.score(), 1);
        assert_eq!(snapshot.review().next().unwrap().question.correct_option(), Some("y"));
    }

    #[test]
    fn test_transfer_object_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_attempt.json");
        let handoff = SnapshotHandoff::new(Arc::new(JsonFileStore::new(&path)));
        handoff.publish(attempt(vec![None, Some(0)]), &verdict(false));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["score"], 1);
        assert_eq!(raw["difficulty"], "easy");
        assert_eq!(raw["isNewHighScore"], false);
        assert_eq!(raw["answers"], serde_json::json!([null, 0]));
        assert_eq!(raw["questions"].as_array().unwrap().len(), 2);
    }
}
