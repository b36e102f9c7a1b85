//! The quiz session state machine.
//!
//! A [`QuizSession`] owns one attempt from the moment its questions are
//! loaded until it completes. Every transition is validated first and only
//! then applied, so a rejected call leaves the session untouched.

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Difficulty, Question};

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

/// Seconds at or below which the timer is shown as running out.
pub const LOW_TIME_SECS: u32 = 10;

/// Raised by [`QuizSession::start`] when there is nothing to ask.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot start a quiz session without questions")]
pub struct EmptySessionError;

/// A transition was requested that the current state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("option {index} is out of range for a question with {available} options")]
    OptionOutOfRange { index: usize, available: usize },

    #[error("a submission is already being processed")]
    SubmitInFlight,

    #[error("the session is already complete")]
    SessionComplete,

    #[error("already at the first question")]
    AtFirstQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    Complete,
}

/// Per-question sub-state while the session is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    Answering,
    Selected(usize),
}

/// Proof that a submission has been started and not yet settled.
#[must_use = "a pending submit blocks the session until it is settled"]
#[derive(Debug)]
pub(crate) struct PendingSubmit {
    session: Uuid,
    question: usize,
}

impl PendingSubmit {
    #[cfg(test)]
    pub(crate) fn question(&self) -> usize {
        self.question
    }
}

/// A finished attempt, moved out of the session on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedAttempt {
    pub session_id: Uuid,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
    pub selected_answers: Vec<Option<usize>>,
    pub score: u32,
}

impl CompletedAttempt {
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Advanced { to: usize },
    Completed(CompletedAttempt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is complete; nothing changed.
    Idle,
    Running { remaining: u32 },
    /// The clock hit zero and the question was submitted.
    Expired(SubmitOutcome),
}

#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    difficulty: Difficulty,
    questions: Vec<Question>,
    current_index: usize,
    selected_answers: Vec<Option<usize>>,
    tentative: Option<usize>,
    time_limit: u32,
    time_remaining: u32,
    phase: SessionPhase,
    submitting: bool,
}

impl QuizSession {
    pub fn start(difficulty: Difficulty, questions: Vec<Question>) -> Result<Self, EmptySessionError> {
        Self::with_time_limit(difficulty, questions, DEFAULT_TIME_LIMIT_SECS)
    }

    pub fn with_time_limit(
        difficulty: Difficulty,
        questions: Vec<Question>,
        time_limit: u32,
    ) -> Result<Self, EmptySessionError> {
        if questions.is_empty() {
            return Err(EmptySessionError);
        }

        let time_limit = time_limit.max(1);
        let session = Self {
            id: Uuid::new_v4(),
            difficulty,
            selected_answers: vec![None; questions.len()],
            questions,
            current_index: 0,
            tentative: None,
            time_limit,
            time_remaining: time_limit,
            phase: SessionPhase::InProgress,
            submitting: false,
        };
        debug!(session = %session.id, total = session.questions.len(), "session started");
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn question_phase(&self) -> QuestionPhase {
        match self.tentative {
            Some(index) => QuestionPhase::Selected(index),
            None => QuestionPhase::Answering,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn selected_answers(&self) -> &[Option<usize>] {
        &self.selected_answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_question_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    /// Fraction of the quiz reached, counting the current question.
    pub fn progress(&self) -> f64 {
        self.current_question_number() as f64 / self.total_questions() as f64
    }

    pub fn tentative_choice(&self) -> Option<usize> {
        self.tentative
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    pub fn is_low_time(&self) -> bool {
        self.time_remaining <= LOW_TIME_SECS
    }

    pub fn answered_count(&self) -> usize {
        self.selected_answers.iter().filter(|a| a.is_some()).count()
    }

    /// Number of recorded answers that match the correct option.
    pub fn score(&self) -> u32 {
        score(&self.questions, &self.selected_answers)
    }

    fn ensure_accepting_input(&self) -> Result<(), PreconditionError> {
        if self.submitting {
            return Err(PreconditionError::SubmitInFlight);
        }
        if self.is_complete() {
            return Err(PreconditionError::SessionComplete);
        }
        Ok(())
    }

    pub fn select_option(&mut self, index: usize) -> Result<(), PreconditionError> {
        self.ensure_accepting_input()?;
        let available = self.current_question().options.len();
        if index >= available {
            return Err(PreconditionError::OptionOutOfRange { index, available });
        }
        self.tentative = Some(index);
        Ok(())
    }

    /// Move the tentative choice one option down, wrapping around.
    pub fn select_next_option(&mut self) -> Result<(), PreconditionError> {
        let available = self.current_question().options.len();
        let next = self.tentative.map_or(0, |i| (i + 1) % available);
        self.select_option(next)
    }

    /// Move the tentative choice one option up, wrapping around.
    pub fn select_previous_option(&mut self) -> Result<(), PreconditionError> {
        let available = self.current_question().options.len();
        let previous = self
            .tentative
            .map_or(available - 1, |i| (i + available - 1) % available);
        self.select_option(previous)
    }

    /// One second elapsed on the current question.
    pub fn tick(&mut self) -> Result<TickOutcome, PreconditionError> {
        if self.is_complete() {
            return Ok(TickOutcome::Idle);
        }
        if self.submitting {
            return Err(PreconditionError::SubmitInFlight);
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return Ok(TickOutcome::Running {
                remaining: self.time_remaining,
            });
        }

        debug!(session = %self.id, question = self.current_index, "time expired");
        self.submit().map(TickOutcome::Expired)
    }

    /// Finalize the tentative choice for the current question.
    ///
    /// Shared by the manual submit and the timer expiry.
    pub fn submit(&mut self) -> Result<SubmitOutcome, PreconditionError> {
        let pending = self.begin_submit()?;
        Ok(self.settle(pending))
    }

    /// First half of [`submit`](Self::submit): record the answer and lock the session.
    ///
    /// Split out so the in-flight gate can be held open across other calls.
    pub(crate) fn begin_submit(&mut self) -> Result<PendingSubmit, PreconditionError> {
        self.ensure_accepting_input()?;

        self.submitting = true;
        self.selected_answers[self.current_index] = self.tentative;
        debug!(
            session = %self.id,
            question = self.current_index,
            answer = ?self.tentative,
            "answer recorded"
        );

        Ok(PendingSubmit {
            session: self.id,
            question: self.current_index,
        })
    }

    /// Second half of [`submit`](Self::submit): advance or complete, then unlock.
    pub(crate) fn settle(&mut self, pending: PendingSubmit) -> SubmitOutcome {
        debug_assert_eq!(pending.session, self.id, "pending submit from another session");
        debug_assert_eq!(pending.question, self.current_index);
        self.submitting = false;

        if self.is_last_question() {
            self.phase = SessionPhase::Complete;
            let score = self.score();
            debug!(session = %self.id, score, "session complete");
            return SubmitOutcome::Completed(CompletedAttempt {
                session_id: self.id,
                difficulty: self.difficulty,
                questions: self.questions.clone(),
                selected_answers: self.selected_answers.clone(),
                score,
            });
        }

        self.current_index += 1;
        self.time_remaining = self.time_limit;
        self.tentative = None;
        SubmitOutcome::Advanced {
            to: self.current_index,
        }
    }

    /// Step back one question, restoring its recorded answer as the tentative choice.
    pub fn go_to_previous(&mut self) -> Result<(), PreconditionError> {
        self.ensure_accepting_input()?;
        if self.current_index == 0 {
            return Err(PreconditionError::AtFirstQuestion);
        }

        self.current_index -= 1;
        self.time_remaining = self.time_limit;
        self.tentative = self.selected_answers[self.current_index];
        Ok(())
    }
}

/// Count of answers equal to their question's correct option.
pub fn score(questions: &[Question], answers: &[Option<usize>]) -> u32 {
    questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| question.is_correct(**answer))
        .count() as u32
}
