use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::navigation::NavMode;
use crate::state::{AppState, Screen};

pub fn draw_keybar(f: &mut Frame, area: Rect, state: &AppState) {
    let bindings: Vec<(&str, &str)> = match (state.screen, state.session.mode()) {
        (Screen::Review, _) => vec![
            ("↑/↓", "scroll"),
            ("PgUp/PgDn", "page"),
            ("Enter", "exit"),
        ],
        (Screen::Working, NavMode::Focused) => vec![
            ("a-z", "answer"),
            ("←/→", "prev/next"),
            ("↑/↓", "choice"),
            ("Ctrl+F", "flag"),
            ("Ctrl+T", "continuous"),
            ("Ctrl+S", "submit"),
            ("Ctrl+Q", "quit"),
        ],
        (Screen::Working, NavMode::Continuous) => vec![
            ("a-z", "answer"),
            ("↑/↓", "scroll"),
            ("←/→", "prev/next"),
            ("Ctrl+F", "flag"),
            ("Ctrl+T", "focused"),
            ("Ctrl+S", "submit"),
            ("Ctrl+Q", "quit"),
        ],
    };

    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}", action)));
    }

    let line = Line::from(spans);
    let widget = Paragraph::new(line).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(widget, area);
}
