//! Loading and no-questions screens.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::models::Difficulty;

fn centered(area: Rect) -> Rect {
    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(9),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, column, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(60),
        Constraint::Fill(1),
    ])
    .areas(row);
    column
}

fn boxed(content: Vec<Line<'_>>) -> Paragraph<'_> {
    Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Color::DarkGray),
        )
}

pub fn render_loading(frame: &mut Frame, area: Rect, difficulty: Difficulty) {
    let content = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Loading questions...",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(format!("{} difficulty", difficulty.label()).fg(Color::DarkGray)),
        Line::from(""),
        Line::from("esc cancel".fg(Color::DarkGray)),
    ];
    frame.render_widget(boxed(content), centered(area));
}

pub fn render_no_questions(frame: &mut Frame, area: Rect, difficulty: Difficulty, reason: &str) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No questions available",
            Style::default().fg(Color::Red).bold(),
        )),
        Line::from(""),
        Line::from(
            format!("Could not load {} questions.", difficulty.as_str()).fg(Color::Gray),
        ),
        Line::from(reason.fg(Color::DarkGray)),
        Line::from(""),
        Line::from("enter back  ·  q quit".fg(Color::DarkGray)),
    ];
    frame.render_widget(boxed(content), centered(area));
}
