use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use crate::models::Difficulty;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(19),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    let [_, column, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(60),
        Constraint::Fill(1),
    ])
    .areas(chunks[1]);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "QUIZ MASTER",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(
            format!(
                "{} questions · {}s per question",
                app.question_count(),
                app.time_limit_secs()
            )
            .fg(Color::DarkGray),
        ),
        Line::from(""),
    ];

    for difficulty in Difficulty::ALL {
        content.extend(difficulty_lines(app, difficulty));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "ENTER",
        Style::default().fg(Color::Green).bold(),
    )));
    content.push(Line::from("to start".fg(Color::DarkGray)));

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, column);

    super::render_controls(
        frame,
        chunks[3],
        "↑/↓ difficulty  ·  1-3 choose  ·  enter start  ·  q quit",
    );
}

fn difficulty_lines(app: &App, difficulty: Difficulty) -> [Line<'static>; 3] {
    let is_selected = app.selected_difficulty() == difficulty;
    let style = if is_selected {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    let marker = if is_selected { ">" } else { " " };

    let best = match app.home_best(difficulty) {
        Some(percentage) => Span::styled(
            format!("  best {}%", percentage),
            Style::default().fg(super::grade_color(percentage)),
        ),
        None => Span::styled("  no scores yet", Style::default().fg(Color::DarkGray)),
    };

    [
        Line::from(vec![
            Span::styled(format!("{} {}. {}", marker, difficulty.index() + 1, difficulty.label()), style),
            best,
        ]),
        Line::from(difficulty.description().fg(Color::DarkGray)),
        Line::from(""),
    ]
}
