use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::state::{AppState, Dialog};
use crate::timer::format_clock;

pub fn draw_dialog(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(dialog) = state.top_dialog() else {
        return;
    };

    match dialog {
        Dialog::ConfirmSubmit => draw_confirm_submit(f, area, state),
        Dialog::ConfirmQuit => draw_confirm_quit(f, area),
        Dialog::LowTime(secs) => draw_low_time(f, area, *secs),
        Dialog::Help => draw_help(f, area),
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn confirm_row() -> Line<'static> {
    Line::from(vec![
        Span::styled("   [Enter] Confirm", Style::default().fg(Color::Green)),
        Span::raw("    "),
        Span::styled("[Esc] Cancel", Style::default().fg(Color::DarkGray)),
    ])
}

fn render_box(f: &mut Frame, area: Rect, width: u16, lines: Vec<Line>, color: Color) {
    let rect = centered_rect(width, lines.len() as u16 + 2, area);
    f.render_widget(Clear, rect);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    f.render_widget(Paragraph::new(lines).block(block), rect);
}

fn draw_confirm_submit(f: &mut Frame, area: Rect, state: &AppState) {
    let counts = state.session.confirmation_summary();
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Submit your answers?",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("   ● {} answered", counts.answered),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("   ⚑ {} flagged", counts.flagged),
            Style::default().fg(Color::Red),
        )),
        Line::from(Span::styled(
            format!("   ○ {} unanswered", counts.unanswered),
            Style::default().fg(Color::White),
        )),
    ];
    if counts.unanswered + counts.flagged > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from("   Answers cannot be changed afterwards."));
    }
    lines.push(Line::from(""));
    lines.push(confirm_row());

    render_box(f, area, 44, lines, Color::Yellow);
}

fn draw_confirm_quit(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Quit?",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("   The session will be recorded"),
        Line::from("   as abandoned."),
        Line::from(""),
        confirm_row(),
    ];
    render_box(f, area, 40, lines, Color::Yellow);
}

fn draw_low_time(f: &mut Frame, area: Rect, secs: u64) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   ⚠  {} REMAINING", format_clock(secs)),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("   Your answers are submitted"),
        Line::from("   automatically when time runs out."),
        Line::from(""),
        Line::from(Span::styled(
            "          [Enter] Continue",
            Style::default().fg(Color::Green),
        )),
    ];
    render_box(f, area, 42, lines, Color::Red);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Key Bindings",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("   ←/→        Previous/Next question"),
        Line::from("   Home/End   First/Last question"),
        Line::from("   ↑/↓        Choice (focused), scroll (feed)"),
        Line::from("   PgUp/PgDn  Scroll a page"),
        Line::from("   a-z        Select option"),
        Line::from("   Enter      Select highlighted option"),
        Line::from("   Backspace  Clear answer"),
        Line::from("   Ctrl+F     Toggle flag"),
        Line::from("   Ctrl+T     Switch focused/continuous"),
        Line::from("   Ctrl+S     Submit"),
        Line::from("   Ctrl+Q     Quit"),
        Line::from("   ?          This help"),
        Line::from(""),
        Line::from(Span::styled(
            "        [Esc] Close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let rect = centered_rect(50, lines.len() as u16 + 2, area);
    f.render_widget(Clear, rect);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(lines).block(block), rect);
}
