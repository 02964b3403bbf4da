use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::navigation::NavMode;
use crate::state::AppState;
use crate::timer::format_duration;

pub fn draw_statusbar(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let counts = session.confirmation_summary();
    let mode = match session.mode() {
        NavMode::Focused => "focused",
        NavMode::Continuous => "continuous",
    };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("● {} answered", counts.answered),
            Style::default().fg(Color::Green),
        ),
        Span::raw("   "),
        Span::styled(
            format!("⚑ {} flagged", counts.flagged),
            Style::default().fg(Color::Red),
        ),
        Span::raw("   "),
        Span::styled(
            format!("○ {} unanswered", counts.unanswered),
            Style::default().fg(Color::White),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} of {}", session.current_index() + 1, session.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{} mode", mode),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("   "),
        Span::styled(
            format!("elapsed {}", format_duration(session.elapsed())),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let widget = Paragraph::new(line).style(Style::default().bg(Color::Rgb(30, 30, 30)));
    f.render_widget(widget, area);
}
