//! # quizmaster
//!
//! A timed multiple-choice quiz for the terminal.
//!
//! The core is the quiz session engine in [`session`]: question progression,
//! the per-question countdown with auto-submit, answer recording and scoring.
//! Finished attempts feed the local high-score [`ledger`] and are handed to
//! the results screen as an immutable [`snapshot::ResultSnapshot`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quizmaster::{Config, Quiz, QuizError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let config = Config::load(None)?;
//!     Quiz::from_config(&config)?.run().await
//! }
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod input;
pub mod ledger;
pub mod models;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod terminal;
mod ui;

use std::io;
use std::sync::Arc;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

pub use app::{App, AppEvent, SessionSettings};
pub use config::{Config, ConfigError};
pub use data::{FetchError, JsonFileProvider, OpenTriviaProvider, QuestionProvider};
pub use ledger::{HighScoreEntry, Ledger};
pub use models::{Difficulty, Question};
pub use session::QuizSession;
pub use snapshot::{ResultSnapshot, SnapshotHandoff};
pub use storage::{JsonFileStore, PersistenceError};

/// Errors that end a quiz run.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("question provider: {0}")]
    Provider(#[from] FetchError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// High-score ledger backed by the data directory.
pub fn ledger_for(config: &Config) -> Ledger {
    Ledger::new(Arc::new(JsonFileStore::new(config.high_scores_path())))
}

/// Last-attempt handoff backed by the data directory.
pub fn handoff_for(config: &Config) -> SnapshotHandoff {
    SnapshotHandoff::new(Arc::new(JsonFileStore::new(config.last_attempt_path())))
}

/// Offline file provider when `questions_file` is set, else the trivia service.
pub fn provider_for(config: &Config) -> Result<Arc<dyn QuestionProvider>, FetchError> {
    Ok(match &config.questions_file {
        Some(path) => Arc::new(JsonFileProvider::new(path)),
        None => Arc::new(OpenTriviaProvider::new(
            &config.api_base_url,
            config.request_timeout(),
        )?),
    })
}

/// A quiz that can be run in the terminal.
pub struct Quiz {
    app: App,
    events: mpsc::UnboundedReceiver<AppEvent>,
    start: Option<Difficulty>,
}

impl Quiz {
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        ledger: Ledger,
        handoff: SnapshotHandoff,
        settings: SessionSettings,
    ) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        Self {
            app: App::new(provider, ledger, handoff, settings, tx),
            events,
            start: None,
        }
    }

    /// Build a quiz from configuration, with stores under `config.data_dir`.
    pub fn from_config(config: &Config) -> Result<Self, QuizError> {
        config.validate()?;
        let mut quiz = Self::new(
            provider_for(config)?,
            ledger_for(config),
            handoff_for(config),
            SessionSettings {
                question_count: config.question_count,
                time_limit_secs: config.time_limit_secs,
            },
        );
        quiz.app.select_difficulty(config.default_difficulty);
        Ok(quiz)
    }

    /// Skip the home screen and go straight to a quiz of `difficulty`.
    pub fn starting_with(mut self, difficulty: Difficulty) -> Self {
        self.start = Some(difficulty);
        self
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Run the quiz in the terminal until the user quits.
    ///
    /// Must be called within a tokio runtime.
    pub async fn run(mut self) -> Result<(), QuizError> {
        let mut guard = terminal::TerminalGuard::enter()?;
        if let Some(difficulty) = self.start.take() {
            self.app.start_quiz(difficulty);
        }
        info!("quiz started");
        let result = run_event_loop(guard.terminal(), &mut self.app, &mut self.events).await;
        info!("quiz closed");
        result
    }
}

async fn run_event_loop(
    terminal: &mut terminal::AppTerminal,
    app: &mut App,
    events: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<(), QuizError> {
    let mut input = EventStream::new();

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key.code) {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            Some(event) = events.recv() => app.handle_event(event),
        }
    }

    Ok(())
}
