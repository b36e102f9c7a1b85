use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::ResultsScreen;
use crate::ledger::HighScoreEntry;
use crate::snapshot::{QuestionReview, ResultSnapshot};

const QUESTION_PREVIEW_LENGTH: usize = 55;
const ANSWER_PREVIEW_LENGTH: usize = 30;

pub fn render(frame: &mut Frame, area: Rect, results: &ResultsScreen) {
    let snapshot = &results.snapshot;

    let chunks = Layout::vertical([
        Constraint::Length(8),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_score_summary(frame, chunks[0], results);

    if results.show_high_scores {
        let [review, board] =
            Layout::horizontal([Constraint::Fill(3), Constraint::Fill(2)]).areas(chunks[1]);
        render_question_review(frame, review, snapshot, results.scroll);
        render_high_scores(frame, board, &results.high_scores);
    } else {
        render_question_review(frame, chunks[1], snapshot, results.scroll);
    }

    super::render_controls(
        frame,
        chunks[2],
        "j/k scroll  ·  h high scores  ·  r retake  ·  enter home  ·  q quit",
    );
}

fn render_score_summary(frame: &mut Frame, area: Rect, results: &ResultsScreen) {
    let snapshot = &results.snapshot;
    let percentage = snapshot.percentage();
    let grade_color = super::grade_color(percentage);

    let badge = if snapshot.is_new_high_score() {
        Line::from(Span::styled(
            "★ NEW HIGH SCORE ★",
            Style::default().fg(Color::Yellow).bold(),
        ))
    } else {
        Line::from(best_line(results.best.as_ref()).fg(Color::DarkGray))
    };

    let content = vec![
        Line::from(Span::styled(
            format!("RESULTS  ·  {}", snapshot.difficulty().label()),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{} / {}  ({}%)",
                snapshot.score(),
                snapshot.total(),
                percentage
            ),
            Style::default().fg(grade_color).bold(),
        )),
        Line::from(snapshot.verdict_message().fg(Color::Gray)),
        Line::from(""),
        badge,
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn best_line(best: Option<&HighScoreEntry>) -> String {
    match best {
        Some(entry) => format!(
            "Best: {}/{} ({}%) on {}",
            entry.score,
            entry.total_questions,
            entry.percentage,
            entry.timestamp.format("%Y-%m-%d")
        ),
        None => "No best score yet".to_string(),
    }
}

fn render_question_review(frame: &mut Frame, area: Rect, snapshot: &ResultSnapshot, scroll: usize) {
    let lines: Vec<Line> = snapshot.review().flat_map(review_lines).collect();

    // Each review row spans two lines.
    let widget = Paragraph::new(lines)
        .block(Block::default().padding(Padding::horizontal(1)))
        .scroll(((scroll * 2) as u16, 0));
    frame.render_widget(widget, area);
}

fn review_lines(row: QuestionReview<'_>) -> [Line<'static>; 2] {
    let (symbol, color) = if row.is_correct {
        ("+", Color::Green)
    } else {
        ("-", Color::Red)
    };

    let answer = match row.answer_text() {
        Some(text) => truncate(text, ANSWER_PREVIEW_LENGTH),
        None => "no answer".to_string(),
    };
    let mut detail = vec![
        Span::raw("       "),
        Span::styled(answer, Style::default().fg(color)),
    ];
    if !row.is_correct {
        detail.push(Span::styled("  →  ", Style::default().fg(Color::DarkGray)));
        detail.push(Span::styled(
            truncate(row.question.correct_option().unwrap_or("?"), ANSWER_PREVIEW_LENGTH),
            Style::default().fg(Color::Green),
        ));
    }

    [
        Line::from(vec![
            Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
            Span::styled(
                format!("{:2}. ", row.number),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                truncate(&row.question.text, QUESTION_PREVIEW_LENGTH),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(detail),
    ]
}

fn render_high_scores(frame: &mut Frame, area: Rect, entries: &[HighScoreEntry]) {
    let mut lines: Vec<Line> = Vec::with_capacity(entries.len().max(1));

    if entries.is_empty() {
        lines.push(Line::from("No high scores yet".fg(Color::DarkGray)));
    }
    for (rank, entry) in entries.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}. ", rank + 1),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{:>3}%", entry.percentage),
                Style::default().fg(super::grade_color(entry.percentage)).bold(),
            ),
            Span::styled(
                format!(
                    "  {}/{}  {}  {}",
                    entry.score,
                    entry.total_questions,
                    entry.difficulty.label(),
                    entry.timestamp.format("%Y-%m-%d")
                ),
                Style::default().fg(Color::Gray),
            ),
        ]));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(" High Scores ")
            .title_style(Style::default().fg(Color::Cyan))
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let truncated: String = text.chars().take(max).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
