use std::sync::Arc;

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::data::{load_question_set, FetchError, QuestionProvider};
use crate::input::{
    home_command, notice_command, quiz_command, results_command, HomeCommand, NoticeCommand,
    QuizCommand, ResultsCommand,
};
use crate::ledger::{HighScoreEntry, Ledger};
use crate::models::{Difficulty, Question};
use crate::session::{
    CompletedAttempt, Countdown, QuizSession, SubmitOutcome, Tick, TickOutcome, TICK_PERIOD,
};
use crate::snapshot::{ResultSnapshot, SnapshotHandoff};

/// How many leaderboard rows the results screen shows.
pub const HIGH_SCORES_SHOWN: usize = 5;

/// Events delivered to the app from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Tick(Tick),
    Loaded {
        generation: u64,
        difficulty: Difficulty,
        result: Result<Vec<Question>, FetchError>,
    },
}

impl From<Tick> for AppEvent {
    fn from(tick: Tick) -> Self {
        AppEvent::Tick(tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub question_count: usize,
    pub time_limit_secs: u32,
}

pub struct QuizScreen {
    pub session: QuizSession,
    countdown: Countdown,
    live_tick: Tick,
}

impl QuizScreen {
    fn new(session: QuizSession, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        let live_tick = Tick::first(session.id());
        Self {
            countdown: Countdown::start(live_tick, TICK_PERIOD, events),
            session,
            live_tick,
        }
    }

    /// Start a fresh countdown for the current question; older ticks go stale.
    fn rearm(&mut self, events: mpsc::UnboundedSender<AppEvent>) {
        self.live_tick = self.live_tick.rearmed(self.session.current_index());
        self.countdown.restart(self.live_tick, TICK_PERIOD, events);
    }

    /// Identity of the ticks the running countdown emits.
    pub fn live_tick(&self) -> Tick {
        self.live_tick
    }
}

pub struct ResultsScreen {
    pub snapshot: ResultSnapshot,
    pub best: Option<HighScoreEntry>,
    pub high_scores: Vec<HighScoreEntry>,
    pub show_high_scores: bool,
    pub scroll: usize,
}

pub enum Screen {
    Home,
    Loading { difficulty: Difficulty, generation: u64 },
    Quiz(QuizScreen),
    Results(ResultsScreen),
    NoQuestions { difficulty: Difficulty, reason: String },
}

pub struct App {
    screen: Screen,
    selected_difficulty: Difficulty,
    settings: SessionSettings,
    provider: Arc<dyn QuestionProvider>,
    ledger: Ledger,
    handoff: SnapshotHandoff,
    events: mpsc::UnboundedSender<AppEvent>,
    loader: Option<JoinHandle<()>>,
    load_generation: u64,
    home_bests: [Option<u32>; 3],
}

impl App {
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        ledger: Ledger,
        handoff: SnapshotHandoff,
        settings: SessionSettings,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let mut app = Self {
            screen: Screen::Home,
            selected_difficulty: Difficulty::default(),
            settings,
            provider,
            ledger,
            handoff,
            events,
            loader: None,
            load_generation: 0,
            home_bests: [None; 3],
        };
        app.refresh_home_bests();
        app
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn selected_difficulty(&self) -> Difficulty {
        self.selected_difficulty
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) {
        self.selected_difficulty = difficulty;
    }

    /// Best percentage recorded for `difficulty`, as of the last visit home.
    pub fn home_best(&self, difficulty: Difficulty) -> Option<u32> {
        self.home_bests[difficulty.index()]
    }

    pub fn question_count(&self) -> usize {
        self.settings.question_count
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.settings.time_limit_secs
    }

    pub fn session(&self) -> Option<&QuizSession> {
        match &self.screen {
            Screen::Quiz(quiz) => Some(&quiz.session),
            _ => None,
        }
    }

    pub fn results(&self) -> Option<&ResultsScreen> {
        match &self.screen {
            Screen::Results(results) => Some(results),
            _ => None,
        }
    }

    /// Fetch a question set for `difficulty` and show the loading screen.
    pub fn start_quiz(&mut self, difficulty: Difficulty) {
        self.teardown();
        self.selected_difficulty = difficulty;
        self.load_generation += 1;
        let generation = self.load_generation;

        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        let count = self.settings.question_count;
        self.loader = Some(tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let result = load_question_set(provider.as_ref(), difficulty, count, &mut rng).await;
            let _ = events.send(AppEvent::Loaded {
                generation,
                difficulty,
                result,
            });
        }));

        info!(%difficulty, generation, "loading quiz");
        self.screen = Screen::Loading {
            difficulty,
            generation,
        };
    }

    pub fn go_home(&mut self) {
        self.teardown();
        self.refresh_home_bests();
        self.screen = Screen::Home;
    }

    /// Stop whatever background work belongs to the current screen.
    fn teardown(&mut self) {
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
        if let Screen::Quiz(quiz) = &mut self.screen {
            quiz.countdown.cancel();
            debug!(session = %quiz.session.id(), "session torn down");
        }
    }

    fn refresh_home_bests(&mut self) {
        for difficulty in Difficulty::ALL {
            self.home_bests[difficulty.index()] = match self.ledger.best_for(difficulty) {
                Ok(best) => best.map(|entry| entry.percentage),
                Err(err) => {
                    warn!(error = %err, "could not read high scores");
                    None
                }
            };
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick(tick) => self.on_tick(tick),
            AppEvent::Loaded {
                generation,
                difficulty,
                result,
            } => self.on_loaded(generation, difficulty, result),
        }
    }

    fn on_loaded(
        &mut self,
        generation: u64,
        difficulty: Difficulty,
        result: Result<Vec<Question>, FetchError>,
    ) {
        if !matches!(self.screen, Screen::Loading { generation: g, .. } if g == generation) {
            debug!(generation, "ignoring load result for an abandoned screen");
            return;
        }
        self.loader = None;

        let questions = match result {
            Ok(questions) => questions,
            Err(err) => {
                warn!(error = %err, %difficulty, "failed to load questions");
                self.screen = Screen::NoQuestions {
                    difficulty,
                    reason: err.to_string(),
                };
                return;
            }
        };

        match QuizSession::with_time_limit(difficulty, questions, self.settings.time_limit_secs) {
            Ok(session) => {
                self.screen = Screen::Quiz(QuizScreen::new(session, self.events.clone()));
            }
            Err(err) => {
                self.screen = Screen::NoQuestions {
                    difficulty,
                    reason: err.to_string(),
                };
            }
        }
    }

    fn on_tick(&mut self, tick: Tick) {
        let Screen::Quiz(quiz) = &mut self.screen else {
            debug!(?tick, "dropping tick outside a quiz");
            return;
        };
        if tick != quiz.live_tick || quiz.session.current_index() != tick.question {
            debug!(?tick, "dropping stale tick");
            return;
        }

        match quiz.session.tick() {
            Ok(TickOutcome::Expired(outcome)) => self.after_submit(outcome),
            Ok(TickOutcome::Running { .. }) | Ok(TickOutcome::Idle) => {}
            Err(err) => debug!(error = %err, "tick rejected"),
        }
    }

    /// Apply a key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Loading { .. } => self.handle_loading_key(key),
            Screen::Quiz(_) => self.handle_quiz_key(key),
            Screen::Results(_) => self.handle_results_key(key),
            Screen::NoQuestions { .. } => self.handle_notice_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyCode) -> bool {
        match home_command(key) {
            Some(HomeCommand::PreviousDifficulty) => {
                self.selected_difficulty = self.selected_difficulty.previous();
            }
            Some(HomeCommand::NextDifficulty) => {
                self.selected_difficulty = self.selected_difficulty.next();
            }
            Some(HomeCommand::Choose(difficulty)) => self.selected_difficulty = difficulty,
            Some(HomeCommand::Start) => self.start_quiz(self.selected_difficulty),
            Some(HomeCommand::Quit) => return true,
            None => {}
        }
        false
    }

    fn handle_loading_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => self.go_home(),
            KeyCode::Char('q') | KeyCode::Char('Q') => return true,
            _ => {}
        }
        false
    }

    fn handle_quiz_key(&mut self, key: KeyCode) -> bool {
        let Some(command) = quiz_command(key) else {
            return false;
        };
        let Screen::Quiz(quiz) = &mut self.screen else {
            return false;
        };
        let session = &mut quiz.session;

        let result = match command {
            QuizCommand::Select(index) => session.select_option(index),
            QuizCommand::NextOption => session.select_next_option(),
            QuizCommand::PreviousOption => session.select_previous_option(),
            QuizCommand::Submit => {
                if session.tentative_choice().is_none() {
                    debug!("submit ignored: no option selected");
                    return false;
                }
                match session.submit() {
                    Ok(outcome) => {
                        self.after_submit(outcome);
                        return false;
                    }
                    Err(err) => Err(err),
                }
            }
            QuizCommand::PreviousQuestion => session
                .go_to_previous()
                .map(|()| quiz.rearm(self.events.clone())),
            QuizCommand::Leave => {
                self.go_home();
                return false;
            }
            QuizCommand::Quit => return true,
        };

        if let Err(err) = result {
            debug!(error = %err, ?command, "input rejected");
        }
        false
    }

    fn after_submit(&mut self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Advanced { to } => {
                if let Screen::Quiz(quiz) = &mut self.screen {
                    debug_assert_eq!(quiz.session.current_index(), to);
                    quiz.rearm(self.events.clone());
                }
            }
            SubmitOutcome::Completed(attempt) => {
                if let Screen::Quiz(quiz) = &mut self.screen {
                    quiz.countdown.cancel();
                }
                self.finish(attempt);
            }
        }
    }

    /// Record the attempt and hand its snapshot to the results screen.
    fn finish(&mut self, attempt: CompletedAttempt) {
        let difficulty = attempt.difficulty;
        let verdict = self
            .ledger
            .commit_attempt(attempt.score, attempt.total(), difficulty);
        let snapshot = self.handoff.publish(attempt, &verdict);

        let best = self.ledger.best_for(difficulty).unwrap_or_else(|err| {
            warn!(error = %err, "could not read best score");
            None
        });
        let high_scores = self.ledger.top(HIGH_SCORES_SHOWN).unwrap_or_else(|err| {
            warn!(error = %err, "could not read high scores");
            Vec::new()
        });

        self.screen = Screen::Results(ResultsScreen {
            snapshot,
            best,
            high_scores,
            show_high_scores: false,
            scroll: 0,
        });
    }

    fn handle_results_key(&mut self, key: KeyCode) -> bool {
        let Some(command) = results_command(key) else {
            return false;
        };
        let Screen::Results(results) = &mut self.screen else {
            return false;
        };

        match command {
            ResultsCommand::ScrollDown => {
                let max_scroll = results.snapshot.questions().len().saturating_sub(1);
                results.scroll = (results.scroll + 1).min(max_scroll);
            }
            ResultsCommand::ScrollUp => results.scroll = results.scroll.saturating_sub(1),
            ResultsCommand::ToggleHighScores => {
                results.show_high_scores = !results.show_high_scores;
            }
            ResultsCommand::Retake => {
                let difficulty = results.snapshot.difficulty();
                self.start_quiz(difficulty);
            }
            ResultsCommand::Home => self.go_home(),
            ResultsCommand::Quit => return true,
        }
        false
    }

    fn handle_notice_key(&mut self, key: KeyCode) -> bool {
        match notice_command(key) {
            Some(NoticeCommand::Back) => self.go_home(),
            Some(NoticeCommand::Quit) => return true,
            None => {}
        }
        false
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::data::RawQuestion;
    use crate::storage::MemoryStore;

    struct StubProvider {
        count: usize,
    }

    #[async_trait]
    impl QuestionProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, difficulty: Difficulty, count: usize) -> Result<Vec<RawQuestion>, FetchError> {
            Ok((0..self.count.min(count))
                .map(|i| RawQuestion {
                    category: "General".to_string(),
                    difficulty,
                    question: format!("Question {}", i),
                    correct_answer: "right".to_string(),
                    incorrect_answers: vec!["w1".into(), "w2".into(), "w3".into()],
                })
                .collect())
        }
    }

    fn app(count: usize) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            Arc::new(StubProvider { count }),
            Ledger::new(Arc::new(MemoryStore::new())),
            SnapshotHandoff::new(Arc::new(MemoryStore::new())),
            SessionSettings {
                question_count: 3,
                time_limit_secs: 5,
            },
            tx,
        );
        (app, rx)
    }

    async fn load(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>, difficulty: Difficulty) {
        app.start_quiz(difficulty);
        loop {
            let event = rx.recv().await.expect("event channel closed");
            let loaded = matches!(event, AppEvent::Loaded { .. });
            app.handle_event(event);
            if loaded {
                break;
            }
        }
    }

    fn correct_key(app: &App) -> KeyCode {
        let index = app.session().unwrap().current_question().correct_option_index;
        KeyCode::Char(char::from(b'1' + index as u8))
    }

    #[tokio::test]
    async fn test_load_starts_session() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Hard).await;

        let session = app.session().expect("quiz screen");
        assert_eq!(session.total_questions(), 3);
        assert_eq!(session.time_remaining(), 5);
        assert_eq!(session.difficulty(), Difficulty::Hard);
    }

    #[tokio::test]
    async fn test_empty_provider_shows_no_questions() {
        let (mut app, mut rx) = app(0);
        load(&mut app, &mut rx, Difficulty::Easy).await;

        assert!(matches!(
            app.screen(),
            Screen::NoQuestions {
                difficulty: Difficulty::Easy,
                ..
            }
        ));
        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.screen(), Screen::Home));
    }

    fn live_tick(app: &App) -> Tick {
        match app.screen() {
            Screen::Quiz(quiz) => quiz.live_tick(),
            _ => panic!("not on the quiz screen"),
        }
    }

    #[tokio::test]
    async fn test_stale_ticks_are_dropped() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Medium).await;
        let live = live_tick(&app);

        app.handle_event(AppEvent::Tick(Tick {
            question: 2,
            ..live
        }));
        app.handle_event(AppEvent::Tick(Tick {
            session: uuid::Uuid::new_v4(),
            ..live
        }));
        assert_eq!(app.session().unwrap().time_remaining(), 5);

        app.handle_event(AppEvent::Tick(live));
        assert_eq!(app.session().unwrap().time_remaining(), 4);
    }

    #[tokio::test]
    async fn test_tick_from_cancelled_countdown_on_same_question_is_dropped() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Medium).await;

        app.handle_key(KeyCode::Char('1'));
        app.handle_key(KeyCode::Enter);
        let queued = live_tick(&app);
        assert_eq!(queued.question, 1);

        // Back to question 0 and forward again: question 1 gets a fresh countdown.
        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session().unwrap().current_index(), 1);
        assert_eq!(app.session().unwrap().time_remaining(), 5);

        app.handle_event(AppEvent::Tick(queued));
        assert_eq!(app.session().unwrap().time_remaining(), 5);

        app.handle_event(AppEvent::Tick(live_tick(&app)));
        assert_eq!(app.session().unwrap().time_remaining(), 4);
    }

    #[tokio::test]
    async fn test_timer_expiry_advances_once() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Medium).await;

        let tick = live_tick(&app);
        for _ in 0..5 {
            app.handle_event(AppEvent::Tick(tick));
        }
        // A late tick for the expired question and a racing Enter with no selection.
        app.handle_event(AppEvent::Tick(tick));
        app.handle_key(KeyCode::Enter);

        let session = app.session().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.selected_answers()[0], None);
        assert_eq!(session.time_remaining(), 5);
    }

    #[tokio::test]
    async fn test_enter_without_selection_does_nothing() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Medium).await;

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session().unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn test_full_attempt_reaches_results() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Hard).await;

        for _ in 0..3 {
            let key = correct_key(&app);
            app.handle_key(key);
            app.handle_key(KeyCode::Enter);
        }

        let results = app.results().expect("results screen");
        assert_eq!(results.snapshot.score(), 3);
        assert!(results.snapshot.is_new_high_score());
        assert_eq!(results.best.as_ref().map(|b| b.percentage), Some(100));
        assert_eq!(results.high_scores.len(), 1);

        app.handle_key(KeyCode::Char('h'));
        assert!(app.results().unwrap().show_high_scores);

        app.handle_key(KeyCode::Char('r'));
        assert!(matches!(
            app.screen(),
            Screen::Loading {
                difficulty: Difficulty::Hard,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_previous_restores_answer() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Easy).await;

        app.handle_key(KeyCode::Char('3'));
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Left);

        let session = app.session().unwrap();
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.tentative_choice(), Some(2));

        app.handle_key(KeyCode::Left);
        assert_eq!(app.session().unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn test_leaving_quiz_returns_home() {
        let (mut app, mut rx) = app(3);
        load(&mut app, &mut rx, Difficulty::Easy).await;

        app.handle_key(KeyCode::Esc);
        assert!(matches!(app.screen(), Screen::Home));
        assert!(!app.handle_key(KeyCode::Down));
        assert_eq!(app.selected_difficulty(), Difficulty::Medium);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[tokio::test]
    async fn test_abandoned_load_is_ignored() {
        let (mut app, mut rx) = app(3);
        app.start_quiz(Difficulty::Easy);
        app.go_home();

        app.handle_event(AppEvent::Loaded {
            generation: 1,
            difficulty: Difficulty::Easy,
            result: Ok(Vec::new()),
        });
        assert!(matches!(app.screen(), Screen::Home));
        assert!(rx.try_recv().is_err());
    }
}
