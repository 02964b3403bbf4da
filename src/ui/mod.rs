pub mod dialog;
pub mod feed;
pub mod keybar;
pub mod layout;
pub mod markdown;
pub mod notice;
pub mod question;
pub mod result;
pub mod sidebar;
pub mod statusbar;
pub mod titlebar;

use ratatui::Frame;

use crate::navigation::NavMode;
use crate::state::{AppState, Screen};

/// Row offset for `Paragraph::scroll`, saturating instead of wrapping.
pub fn scroll_offset(scroll: usize) -> u16 {
    u16::try_from(scroll).unwrap_or(u16::MAX)
}

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();
    let layout = layout::compute_layout(area);

    titlebar::draw_titlebar(f, layout.titlebar, state);
    match state.screen {
        Screen::Working => {
            sidebar::draw_sidebar(f, layout.sidebar, state);
            match state.session.mode() {
                NavMode::Focused => question::draw_question(f, layout.main, state),
                NavMode::Continuous => feed::draw_feed(f, layout.main, state),
            }
            statusbar::draw_statusbar(f, layout.statusbar, state);
        }
        Screen::Review => {
            let body = ratatui::layout::Rect {
                height: layout.sidebar.height + layout.statusbar.height,
                ..layout.sidebar.union(layout.main)
            };
            result::draw_review(f, body, state);
        }
    }
    keybar::draw_keybar(f, layout.keybar, state);

    if state.has_dialog() {
        dialog::draw_dialog(f, area, state);
    }
}
