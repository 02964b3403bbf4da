use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::controller::Submission;
use crate::state::AppState;
use crate::timer::format_duration;
use crate::ui::question::wrap_text;
use crate::ui::scroll_offset;

const SUMMARY_ROWS: u16 = 9;

pub fn draw_review(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(SUMMARY_ROWS), Constraint::Min(3)])
        .split(area);

    draw_summary(f, chunks[0], state);

    let lines = review_lines(state, chunks[1].width.saturating_sub(3) as usize);
    let total = lines.len();
    let visible = chunks[1].height.saturating_sub(2) as usize;
    let scroll = state.review_scroll.min(total.saturating_sub(visible));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Review ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(
        Paragraph::new(lines).block(block).scroll((scroll_offset(scroll), 0)),
        chunks[1],
    );

    if total > visible {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(visible))
            .position(scroll)
            .viewport_content_length(visible);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            chunks[1],
            &mut scrollbar_state,
        );
    }
}

fn draw_summary(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let Some(result) = session.result() else {
        return;
    };

    let (verdict, color) = if result.passed {
        ("✓  PASSED", Color::Green)
    } else {
        ("✗  NOT PASSED", Color::Red)
    };

    let saved = match session.submission() {
        Submission::Saved { attempt_id } => Span::styled(
            format!("Attempt saved as {}", attempt_id),
            Style::default().fg(Color::DarkGray),
        ),
        Submission::Saving => Span::styled(
            "Saving attempt...",
            Style::default().fg(Color::Yellow),
        ),
        Submission::Failed(_) => Span::styled(
            "Attempt could not be saved; results are shown locally only",
            Style::default().fg(Color::Red),
        ),
        Submission::NotSubmitted => Span::raw(""),
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            verdict,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}%", result.percentage),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{} correct   {} incorrect   {} unanswered   of {}",
            result.correct, result.incorrect, result.unanswered, result.total
        )),
        Line::from(format!("Time taken: {}", format_duration(session.elapsed()))),
        Line::from(saved),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", session.node().title));
    let widget = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(widget, area);
}

/// One entry per question: verdict, the chosen and correct options, and the
/// explanation.
pub fn review_lines(state: &AppState, width: usize) -> Vec<Line<'static>> {
    let store = state.session.store();
    let mut lines = Vec::new();

    for (idx, q) in store.questions().iter().enumerate() {
        let selected = store.selected_option(&q.id);
        let (mark, color) = match selected {
            Some(oid) if oid == q.correct_option_id => ("✓", Color::Green),
            Some(_) => ("✗", Color::Red),
            None => ("–", Color::DarkGray),
        };

        let header = format!("{}. {}", idx + 1, q.prompt);
        for (i, row) in wrap_text(&header, width.saturating_sub(4)).into_iter().enumerate() {
            let lead = if i == 0 {
                Span::styled(format!(" {} ", mark), Style::default().fg(color))
            } else {
                Span::raw("   ")
            };
            lines.push(Line::from(vec![
                lead,
                Span::styled(row, Style::default().add_modifier(Modifier::BOLD)),
            ]));
        }

        let answer = match selected.and_then(|oid| q.option(oid)) {
            Some(o) => format!("{}. {}", o.id, o.text),
            None => "no answer".to_string(),
        };
        lines.push(Line::from(vec![
            Span::styled("   Your answer: ", Style::default().fg(Color::DarkGray)),
            Span::styled(answer, Style::default().fg(color)),
        ]));
        if selected != Some(q.correct_option_id.as_str()) {
            if let Some(correct) = q.option(&q.correct_option_id) {
                lines.push(Line::from(vec![
                    Span::styled("   Correct:     ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{}. {}", correct.id, correct.text),
                        Style::default().fg(Color::Green),
                    ),
                ]));
            }
        }
        if !q.explanation.is_empty() {
            for row in wrap_text(&q.explanation, width.saturating_sub(4)) {
                lines.push(Line::from(Span::styled(
                    format!("   {}", row),
                    Style::default().fg(Color::Rgb(200, 200, 120)),
                )));
            }
        }
        lines.push(Line::from(""));
    }

    lines
}
