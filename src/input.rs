//! Key bindings.
//!
//! Pure translation from key codes to screen commands; nothing here touches
//! app or session state.

use crossterm::event::KeyCode;

use crate::models::{Difficulty, NUM_OPTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeCommand {
    PreviousDifficulty,
    NextDifficulty,
    Choose(Difficulty),
    Start,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizCommand {
    Select(usize),
    NextOption,
    PreviousOption,
    Submit,
    PreviousQuestion,
    Leave,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsCommand {
    ScrollDown,
    ScrollUp,
    ToggleHighScores,
    Retake,
    Home,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCommand {
    Back,
    Quit,
}

pub fn home_command(key: KeyCode) -> Option<HomeCommand> {
    match key {
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => Some(HomeCommand::PreviousDifficulty),
        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => Some(HomeCommand::NextDifficulty),
        KeyCode::Char(c @ '1'..='3') => {
            Difficulty::ALL.get(digit_index(c)).copied().map(HomeCommand::Choose)
        }
        KeyCode::Enter | KeyCode::Char(' ') => Some(HomeCommand::Start),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(HomeCommand::Quit),
        _ => None,
    }
}

pub fn quiz_command(key: KeyCode) -> Option<QuizCommand> {
    match key {
        KeyCode::Char(c @ '1'..='4') => {
            let index = digit_index(c);
            (index < NUM_OPTIONS).then_some(QuizCommand::Select(index))
        }
        KeyCode::Down | KeyCode::Char('j') => Some(QuizCommand::NextOption),
        KeyCode::Up | KeyCode::Char('k') => Some(QuizCommand::PreviousOption),
        KeyCode::Enter => Some(QuizCommand::Submit),
        KeyCode::Left => Some(QuizCommand::PreviousQuestion),
        KeyCode::Esc => Some(QuizCommand::Leave),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(QuizCommand::Quit),
        _ => None,
    }
}

pub fn results_command(key: KeyCode) -> Option<ResultsCommand> {
    match key {
        KeyCode::Down | KeyCode::Char('j') => Some(ResultsCommand::ScrollDown),
        KeyCode::Up | KeyCode::Char('k') => Some(ResultsCommand::ScrollUp),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(ResultsCommand::ToggleHighScores),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(ResultsCommand::Retake),
        KeyCode::Enter | KeyCode::Esc => Some(ResultsCommand::Home),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(ResultsCommand::Quit),
        _ => None,
    }
}

pub fn notice_command(key: KeyCode) -> Option<NoticeCommand> {
    match key {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Backspace => Some(NoticeCommand::Back),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(NoticeCommand::Quit),
        _ => None,
    }
}

fn digit_index(c: char) -> usize {
    c.to_digit(10).map_or(0, |d| d as usize).saturating_sub(1)
}
