use std::io;
use std::sync::mpsc;
use std::time::Duration;

use log::info;
use ratatui::crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::Rect;
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;

use crate::navigation::NavMode;
use crate::state::*;
use crate::timer::{spawn_ticker, ClockEvent, TimerTick};
use crate::ui;
use crate::ui::layout::{compute_layout, contains};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

const IDLE_POLL: Duration = Duration::from_millis(100);
const ANIMATION_POLL: Duration = Duration::from_millis(30);

fn enter_terminal() -> Result<Term, String> {
    enable_raw_mode().map_err(|e| format!("Cannot enable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| format!("Cannot enter alternate screen: {}", e))?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(|e| format!("Cannot create terminal: {}", e))
}

fn leave_terminal(terminal: &mut Term) {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
    terminal.show_cursor().ok();
}

/// Run the session until the user exits. The session is torn down on the
/// way out whether or not it was submitted.
pub fn run_tui(mut state: AppState) -> Result<(), String> {
    let mut terminal = enter_terminal()?;
    let (tick_rx, ticker) = spawn_ticker(Duration::from_secs(1));

    let result = main_loop(&mut terminal, &mut state, &tick_rx);

    ticker.cancel();
    leave_terminal(&mut terminal);
    state.session.teardown();
    info!("left session {}", state.session.node().id);

    result
}

/// Show a blocking message until Enter, Esc or Ctrl+Q.
pub fn run_notice(title: &str, message: &str) -> Result<(), String> {
    let mut terminal = enter_terminal()?;
    let result = notice_loop(&mut terminal, title, message);
    leave_terminal(&mut terminal);
    result
}

fn notice_loop(terminal: &mut Term, title: &str, message: &str) -> Result<(), String> {
    loop {
        terminal
            .draw(|f| ui::notice::draw_notice(f, f.area(), title, message))
            .map_err(|e| format!("Draw error: {}", e))?;
        if let Event::Key(key) = event::read().map_err(|e| format!("Read error: {}", e))? {
            let ctrl_q =
                key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL);
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) || ctrl_q {
                return Ok(());
            }
        }
    }
}

fn main_loop(
    terminal: &mut Term,
    state: &mut AppState,
    tick_rx: &mpsc::Receiver<TimerTick>,
) -> Result<(), String> {
    loop {
        let size = terminal.size().map_err(|e| format!("Size error: {}", e))?;
        let area = Rect::new(0, 0, size.width, size.height);
        sync_feed(state, area);

        terminal
            .draw(|f| ui::draw(f, state))
            .map_err(|e| format!("Draw error: {}", e))?;

        if state.should_quit {
            break;
        }

        let poll = if state.feed.is_animating() {
            ANIMATION_POLL
        } else {
            IDLE_POLL
        };
        if event::poll(poll).map_err(|e| format!("Poll error: {}", e))? {
            match event::read().map_err(|e| format!("Read error: {}", e))? {
                Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(key, state, area),
                Event::Mouse(mouse) => handle_mouse(mouse, state, area),
                _ => {}
            }
        }

        while tick_rx.try_recv().is_ok() {
            handle_tick(state);
        }

        state.session.poll_submission();
        state.step_feed();
    }

    Ok(())
}

/// Measure the continuous feed for the current terminal size and apply any
/// pending scroll requests against it.
fn sync_feed(state: &mut AppState, area: Rect) {
    if state.screen != Screen::Working || state.session.mode() != NavMode::Continuous {
        return;
    }
    let main = compute_layout(area).main;
    let feed = ui::feed::layout_feed(state, main);
    let total = feed.lines.len();
    state.sync_feed(feed.spans, main.height as usize, total);
}

fn handle_tick(state: &mut AppState) {
    match state.session.tick() {
        Some(ClockEvent::Warning(secs)) => {
            if state.screen == Screen::Working && !state.has_dialog() {
                state.push_dialog(Dialog::LowTime(secs));
            }
        }
        Some(ClockEvent::Expired) => info!("time expired, showing results"),
        Some(ClockEvent::Tick(_)) | None => {}
    }
    if state.session.is_submitted() && state.screen == Screen::Working {
        state.submit();
    }
}

fn handle_key(key: KeyEvent, state: &mut AppState, area: Rect) {
    if state.has_dialog() {
        handle_dialog_key(key, state);
        return;
    }
    match state.screen {
        Screen::Working => handle_working_key(key, state, area),
        Screen::Review => handle_review_key(key, state, area),
    }
}

fn handle_dialog_key(key: KeyEvent, state: &mut AppState) {
    let Some(dialog) = state.top_dialog().cloned() else {
        return;
    };
    match (dialog, key.code) {
        (Dialog::ConfirmSubmit, KeyCode::Enter) => {
            state.pop_dialog();
            state.submit();
        }
        (Dialog::ConfirmQuit, KeyCode::Enter) => {
            state.pop_dialog();
            state.should_quit = true;
        }
        (Dialog::LowTime(_), KeyCode::Enter | KeyCode::Esc) => {
            state.pop_dialog();
        }
        (Dialog::Help, KeyCode::Esc | KeyCode::Char('?')) => {
            state.pop_dialog();
        }
        (Dialog::ConfirmSubmit | Dialog::ConfirmQuit, KeyCode::Esc) => {
            state.pop_dialog();
        }
        _ => {}
    }
}

fn handle_working_key(key: KeyEvent, state: &mut AppState, area: Rect) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('q') => state.push_dialog(Dialog::ConfirmQuit),
            KeyCode::Char('s') => state.push_dialog(Dialog::ConfirmSubmit),
            KeyCode::Char('f') => {
                state.session.toggle_current_flag();
            }
            KeyCode::Char('t') => state.session.toggle_mode(),
            _ => {}
        }
        return;
    }

    let page = compute_layout(area).main.height.saturating_sub(2).max(1) as isize;
    let continuous = state.session.mode() == NavMode::Continuous;

    match key.code {
        KeyCode::Left => state.navigate(|s| s.previous()),
        KeyCode::Right => state.navigate(|s| s.next()),
        KeyCode::Home => state.navigate(|s| s.go_to(0)),
        KeyCode::End => {
            let last = state.session.len().saturating_sub(1);
            state.navigate(|s| s.go_to(last));
        }
        KeyCode::Up if continuous => state.scroll_feed_by(-1),
        KeyCode::Down if continuous => state.scroll_feed_by(1),
        KeyCode::PageUp if continuous => state.scroll_feed_by(-page),
        KeyCode::PageDown if continuous => state.scroll_feed_by(page),
        KeyCode::Up => state.move_choice_cursor(false),
        KeyCode::Down => state.move_choice_cursor(true),
        KeyCode::PageUp => {
            state.question_scroll = state.question_scroll.saturating_sub(page as usize);
        }
        KeyCode::PageDown => state.question_scroll += page as usize,
        KeyCode::Enter | KeyCode::Char(' ') => {
            let idx = state.choice_cursor;
            state.select_choice(idx);
        }
        KeyCode::Backspace | KeyCode::Delete => {
            state.session.clear_current();
        }
        KeyCode::Char('?') => state.push_dialog(Dialog::Help),
        KeyCode::Char(c) if c.is_ascii_lowercase() => {
            state.select_choice((c as u8 - b'a') as usize);
        }
        _ => {}
    }
}

/// Rows of the review list: everything but the title, key and summary bars.
fn review_rows(area: Rect) -> usize {
    area.height.saturating_sub(13) as usize
}

fn handle_review_key(key: KeyEvent, state: &mut AppState, area: Rect) {
    let page = review_rows(area).max(1);
    match key.code {
        KeyCode::Up => state.review_scroll = state.review_scroll.saturating_sub(1),
        KeyCode::Down => state.review_scroll += 1,
        KeyCode::PageUp => state.review_scroll = state.review_scroll.saturating_sub(page),
        KeyCode::PageDown => state.review_scroll += page,
        KeyCode::Home => state.review_scroll = 0,
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => state.should_quit = true,
        _ => {}
    }
    let visible = review_rows(area);
    let total = ui::result::review_lines(state, area.width.saturating_sub(3) as usize).len();
    state.review_scroll = state.review_scroll.min(total.saturating_sub(visible));
}

fn handle_mouse(mouse: MouseEvent, state: &mut AppState, area: Rect) {
    if state.has_dialog() || state.screen != Screen::Working {
        if state.screen == Screen::Review {
            match mouse.kind {
                MouseEventKind::ScrollUp => {
                    state.review_scroll = state.review_scroll.saturating_sub(1)
                }
                MouseEventKind::ScrollDown => state.review_scroll += 1,
                _ => {}
            }
        }
        return;
    }

    let layout = compute_layout(area);
    let (x, y) = (mouse.column, mouse.row);
    let in_sidebar = contains(layout.sidebar, x, y);
    let in_main = contains(layout.main, x, y);
    let continuous = state.session.mode() == NavMode::Continuous;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if in_sidebar => {
            if let Some(idx) = ui::sidebar::question_at(state, layout.sidebar, y) {
                state.navigate(|s| s.go_to(idx));
            }
        }
        MouseEventKind::Down(MouseButton::Left) if in_main && continuous => {
            let row = (y - layout.main.y) as usize + state.feed.scroll;
            let feed = ui::feed::layout_feed(state, layout.main);
            if let Some((qidx, option)) = feed.option_at(row) {
                let ids = state.session.store().question(qidx).and_then(|q| {
                    q.options.get(option).map(|o| (q.id.clone(), o.id.clone()))
                });
                if let Some((qid, oid)) = ids {
                    state.session.select_answer(&qid, Some(&oid));
                }
            }
        }
        MouseEventKind::Down(MouseButton::Left) if in_main => {
            let row = (y - layout.main.y) as usize;
            if let Some(option) = ui::question::option_at(state, layout.main, row) {
                state.select_choice(option);
            }
        }
        MouseEventKind::ScrollUp if in_sidebar => state.navigate(|s| s.previous()),
        MouseEventKind::ScrollDown if in_sidebar => state.navigate(|s| s.next()),
        MouseEventKind::ScrollUp if in_main && continuous => state.scroll_feed_by(-1),
        MouseEventKind::ScrollDown if in_main && continuous => state.scroll_feed_by(1),
        MouseEventKind::ScrollUp if in_main => {
            state.question_scroll = state.question_scroll.saturating_sub(1);
        }
        MouseEventKind::ScrollDown if in_main => state.question_scroll += 1,
        _ => {}
    }
}
