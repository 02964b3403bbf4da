use log::debug;

use crate::controller::SessionController;
use crate::navigation::{ElementSpan, NavMode, ScrollBehavior, ViewportSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Working,
    Review,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    ConfirmSubmit,
    ConfirmQuit,
    LowTime(u64),
    Help,
}

/// Layout of the continuous feed from the last frame, plus any smooth scroll
/// still in flight.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub scroll: usize,
    pub target: Option<usize>,
    pub spans: Vec<ElementSpan>,
    pub height: usize,
    pub total_rows: usize,
}

impl FeedState {
    /// The last row may scroll up to the top edge.
    pub fn max_scroll(&self) -> usize {
        self.total_rows.saturating_sub(1)
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    fn snapshot(&self) -> ViewportSnapshot {
        ViewportSnapshot {
            scroll_top: self.scroll,
            height: self.height,
            elements: self.spans.clone(),
        }
    }
}

/// Front-end state wrapped around one running session.
pub struct AppState {
    pub session: SessionController,
    pub screen: Screen,
    pub dialog_stack: Vec<Dialog>,
    pub choice_cursor: usize,
    pub question_scroll: usize,
    pub review_scroll: usize,
    pub feed: FeedState,
    pub scroll_step: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(session: SessionController, scroll_step: usize) -> Self {
        Self {
            session,
            screen: Screen::Working,
            dialog_stack: Vec::new(),
            choice_cursor: 0,
            question_scroll: 0,
            review_scroll: 0,
            feed: FeedState::default(),
            scroll_step: scroll_step.max(1),
            should_quit: false,
        }
    }

    pub fn has_dialog(&self) -> bool {
        !self.dialog_stack.is_empty()
    }

    pub fn top_dialog(&self) -> Option<&Dialog> {
        self.dialog_stack.last()
    }

    pub fn push_dialog(&mut self, dialog: Dialog) {
        self.dialog_stack.push(dialog);
    }

    pub fn pop_dialog(&mut self) -> Option<Dialog> {
        self.dialog_stack.pop()
    }

    /// Run a navigation command and reset per-question view state if the
    /// current question moved.
    pub fn navigate(&mut self, nav: impl FnOnce(&mut SessionController) -> bool) {
        let before = self.session.current_index();
        nav(&mut self.session);
        if self.session.current_index() != before {
            self.on_question_changed();
        }
    }

    fn on_question_changed(&mut self) {
        self.question_scroll = 0;
        let idx = self.session.current_index();
        self.choice_cursor = self
            .session
            .current_question()
            .and_then(|q| {
                self.session
                    .store()
                    .selected_option(&q.id)
                    .and_then(|oid| q.option_index(oid))
            })
            .unwrap_or(0);
        debug!("current question is now {}", idx + 1);
    }

    pub fn move_choice_cursor(&mut self, down: bool) {
        let count = self
            .session
            .current_question()
            .map_or(0, |q| q.options.len());
        if count == 0 {
            return;
        }
        self.choice_cursor = if down {
            (self.choice_cursor + 1).min(count - 1)
        } else {
            self.choice_cursor.saturating_sub(1)
        };
    }

    pub fn select_choice(&mut self, idx: usize) {
        if self.session.select_current(idx) {
            self.choice_cursor = idx;
        }
    }

    /// Freeze the session and move to the review screen.
    pub fn submit(&mut self) {
        self.session.submit();
        if self.session.is_submitted() {
            self.dialog_stack.clear();
            self.screen = Screen::Review;
            self.review_scroll = 0;
            self.feed.target = None;
        }
    }

    /// Store the feed layout measured for this frame and carry out any
    /// scroll the navigation controller asked for.
    pub fn sync_feed(&mut self, spans: Vec<ElementSpan>, height: usize, total_rows: usize) {
        self.feed.spans = spans;
        self.feed.height = height;
        self.feed.total_rows = total_rows;
        self.feed.scroll = self.feed.scroll.min(self.feed.max_scroll());

        if self.session.mode() != NavMode::Continuous {
            return;
        }
        let band = self.session.navigation().band();
        while let Some(request) = self.session.take_scroll_request() {
            let Some(span) = self.feed.spans.get(request.index) else {
                continue;
            };
            let target = band
                .scroll_target(span.top, height)
                .min(self.feed.max_scroll());
            match request.behavior {
                ScrollBehavior::Instant => {
                    self.feed.scroll = target;
                    self.feed.target = None;
                    self.observe_feed();
                }
                ScrollBehavior::Smooth => self.feed.target = Some(target),
            }
        }
    }

    /// Advance an in-flight smooth scroll by one frame.
    pub fn step_feed(&mut self) {
        let Some(target) = self.feed.target else {
            return;
        };
        let scroll = self.feed.scroll;
        self.feed.scroll = if scroll < target {
            (scroll + self.scroll_step).min(target)
        } else {
            scroll.saturating_sub(self.scroll_step).max(target)
        };
        if self.feed.scroll == target {
            self.feed.target = None;
        }
        self.observe_feed();
    }

    /// Manual scroll; cancels any smooth scroll in flight.
    pub fn scroll_feed_by(&mut self, delta: isize) {
        self.feed.target = None;
        let scroll = self.feed.scroll as isize + delta;
        self.feed.scroll = (scroll.max(0) as usize).min(self.feed.max_scroll());
        self.observe_feed();
    }

    fn observe_feed(&mut self) {
        if self.feed.height == 0 {
            return;
        }
        let snapshot = self.feed.snapshot();
        if self.session.observe_viewport(&snapshot).is_some() {
            self.on_question_changed();
        }
    }
}
