use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::AppState;
use crate::ui::question::text_width;

pub fn draw_titlebar(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let clock = session.clock();

    let timer_text = if clock.is_unlimited() {
        Span::styled(" untimed ", Style::default().fg(Color::Gray))
    } else {
        let formatted = format!(" {} remaining ", clock.display());
        if clock.is_time_low() {
            Span::styled(
                formatted,
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(formatted, Style::default().fg(Color::Rgb(200, 200, 120)))
        }
    };

    let title_text = format!("[ {} ]", session.node().title);
    let title_span = Span::styled(
        title_text.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    );

    // Title centered on the full width, timer flush right.
    let available = area.width as usize;
    let timer_len = timer_text.width();
    let title_len = text_width(&title_text);
    let center_pad = available.saturating_sub(title_len) / 2;
    let right_pad = available.saturating_sub(center_pad + title_len + timer_len);

    let line = Line::from(vec![
        Span::raw(" ".repeat(center_pad)),
        title_span,
        Span::raw(" ".repeat(right_pad)),
        timer_text,
    ]);

    let widget = Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .alignment(Alignment::Left);
    f.render_widget(widget, area);
}
