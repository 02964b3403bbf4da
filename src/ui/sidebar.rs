use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::model::QuestionStatus;
use crate::state::AppState;
use crate::ui::question::text_width;

/// Rows of the question list: the area minus the title row.
fn list_height(area: Rect) -> usize {
    area.height.saturating_sub(1) as usize
}

/// First listed question, keeping the current one near the middle.
fn list_offset(current: usize, rows: usize, len: usize) -> usize {
    current
        .saturating_sub(rows / 2)
        .min(len.saturating_sub(rows))
}

/// Question index under a click at screen row `y`.
pub fn question_at(state: &AppState, area: Rect, y: u16) -> Option<usize> {
    let rows = list_height(area);
    let rel = y.checked_sub(area.y + 1)? as usize;
    if rel >= rows {
        return None;
    }
    let session = &state.session;
    let idx = list_offset(session.current_index(), rows, session.len()) + rel;
    (idx < session.len()).then_some(idx)
}

pub fn status_icon(status: QuestionStatus) -> (&'static str, Color) {
    match status {
        QuestionStatus::Unanswered => ("○", Color::White),
        QuestionStatus::Answered => ("●", Color::Green),
        QuestionStatus::Flagged => ("⚑", Color::Red),
    }
}

pub fn draw_sidebar(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let rows = list_height(area);
    let current = session.current_index();
    let offset = list_offset(current, rows, session.len());
    let title_max = area.width.saturating_sub(11) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for (idx, q) in session
        .store()
        .questions()
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
    {
        let status = session.status(idx);
        let (icon, color) = status_icon(status);
        let is_current = idx == current;

        let style = if is_current {
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let mut title = String::new();
        for c in q.prompt.chars() {
            title.push(c);
            if text_width(&title) >= title_max {
                title.pop();
                title.push('…');
                break;
            }
        }

        lines.push(Line::from(vec![
            Span::styled(if is_current { " ▸ " } else { "   " }, style),
            Span::styled(format!("{} ", icon), style.fg(color)),
            Span::styled(format!("{:>2}. ", idx + 1), style),
            Span::styled(title, style),
        ]));
    }

    let block = Block::default()
        .borders(Borders::RIGHT)
        .title(format!(
            " {}/{} answered ",
            session.store().answered_count(),
            session.len()
        ))
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(Paragraph::new(lines).block(block), area);

    if session.len() > rows {
        let scrollbar_area = Rect {
            y: area.y + 1,
            height: rows as u16,
            ..area
        };
        let mut scrollbar_state = ScrollbarState::new(session.len().saturating_sub(1))
            .position(current)
            .viewport_content_length(3);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}
