mod home;
mod notice;
mod quiz;
mod result;

use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};

use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    match app.screen() {
        Screen::Home => home::render(frame, area, app),
        Screen::Loading { difficulty, .. } => notice::render_loading(frame, area, *difficulty),
        Screen::Quiz(quiz) => quiz::render(frame, area, &quiz.session),
        Screen::Results(results) => result::render(frame, area, results),
        Screen::NoQuestions { difficulty, reason } => {
            notice::render_no_questions(frame, area, *difficulty, reason)
        }
    }
}

fn grade_color(percentage: u32) -> Color {
    match percentage {
        90.. => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}

fn render_controls(frame: &mut Frame, area: Rect, hint: &str) {
    let widget = Paragraph::new(hint)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
