//! Quiz session engine: the attempt state machine and its countdown.

mod machine;
pub mod timer;

pub use machine::{
    score, CompletedAttempt, EmptySessionError, PreconditionError, QuestionPhase,
    QuizSession, SessionPhase, SubmitOutcome, TickOutcome, DEFAULT_TIME_LIMIT_SECS, LOW_TIME_SECS,
};
pub use timer::{Countdown, Tick, TICK_PERIOD};
