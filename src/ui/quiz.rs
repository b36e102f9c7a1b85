use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::session::QuizSession;

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn render(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(2)
    .split(area);

    render_header(frame, chunks[0], session);
    render_progress(frame, chunks[1], session);
    render_question_text(frame, chunks[3], &session.current_question().text);
    render_options(frame, chunks[4], session);
    render_controls(frame, chunks[5], session);
}

fn render_header(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(12)]).areas(area);

    let category = Line::from(vec![
        Span::styled(
            session.difficulty().label(),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            session.current_question().category.as_str(),
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(Paragraph::new(category), left);

    let timer_style = if session.is_low_time() {
        Style::default().fg(Color::Red).bold()
    } else {
        Style::default().fg(Color::Yellow)
    };
    let timer = Paragraph::new(format!("{}s", session.time_remaining()))
        .alignment(Alignment::Right)
        .style(timer_style);
    frame.render_widget(timer, right);
}

fn render_progress(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let label = format!(
        "{}/{}  ·  {} answered",
        session.current_question_number(),
        session.total_questions(),
        session.answered_count()
    );
    let widget = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(session.progress().clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(widget, area);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold()
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Color::DarkGray),
        );
    frame.render_widget(widget, area);
}

fn render_options(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let options = &session.current_question().options;
    let selected = session.tentative_choice();
    let mut lines: Vec<Line> = Vec::with_capacity(options.len() * 2);

    for (index, option) in options.iter().enumerate() {
        let is_selected = selected == Some(index);
        let style = if is_selected {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if is_selected { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. ", OPTION_LABELS[index]), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_controls(frame: &mut Frame, area: Rect, session: &QuizSession) {
    let submit = if session.is_last_question() {
        "enter finish"
    } else {
        "enter next"
    };
    let hint = if session.current_index() > 0 {
        format!("1-4 choose  ·  {}  ·  ← previous  ·  esc home  ·  q quit", submit)
    } else {
        format!("1-4 choose  ·  {}  ·  esc home  ·  q quit", submit)
    };
    super::render_controls(frame, area, &hint);
}
