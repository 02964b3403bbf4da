use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavMode {
    /// One question on screen, explicit next/previous/go-to.
    #[default]
    Focused,
    /// All questions in one feed; the current question follows the scroll.
    Continuous,
}

impl NavMode {
    pub fn toggled(self) -> Self {
        match self {
            NavMode::Focused => NavMode::Continuous,
            NavMode::Continuous => NavMode::Focused,
        }
    }
}

/// Horizontal strip of the viewport, as fractions of its height, that decides
/// which question is current in continuous mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerBand {
    pub start: f32,
    pub end: f32,
}

impl Default for TriggerBand {
    fn default() -> Self {
        Self {
            start: 0.20,
            end: 0.30,
        }
    }
}

impl TriggerBand {
    /// Band rows relative to the viewport top, `[top, bottom)`. Always at
    /// least one row tall.
    pub fn rows(&self, viewport_height: usize) -> (usize, usize) {
        let h = viewport_height as f32;
        let top = (h * self.start).round() as usize;
        let bottom = ((h * self.end).round() as usize).max(top + 1);
        (top, bottom)
    }

    /// Scroll offset that puts a feed row at the top edge of the band.
    pub fn scroll_target(&self, element_top: usize, viewport_height: usize) -> usize {
        let (band_top, _) = self.rows(viewport_height);
        element_top.saturating_sub(band_top)
    }
}

/// Rows a question occupies in the continuous feed, `[top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpan {
    pub index: usize,
    pub top: usize,
    pub bottom: usize,
}

/// What the feed looked like after a scroll.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSnapshot {
    pub scroll_top: usize,
    pub height: usize,
    pub elements: Vec<ElementSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// A request for the feed to bring a question into the trigger band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub index: usize,
    pub behavior: ScrollBehavior,
}

/// Single current index shared by both display modes.
#[derive(Debug, Clone)]
pub struct NavigationController {
    mode: NavMode,
    current: usize,
    len: usize,
    band: TriggerBand,
    pending_scroll: Option<ScrollRequest>,
}

impl NavigationController {
    pub fn new(len: usize, mode: NavMode, band: TriggerBand) -> Self {
        let pending_scroll = match mode {
            NavMode::Continuous if len > 0 => Some(ScrollRequest {
                index: 0,
                behavior: ScrollBehavior::Instant,
            }),
            _ => None,
        };
        Self {
            mode,
            current: 0,
            len,
            band,
            pending_scroll,
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn band(&self) -> TriggerBand {
        self.band
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 >= self.len {
            return false;
        }
        self.go_to(self.current + 1)
    }

    pub fn previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.go_to(self.current - 1)
    }

    /// Out-of-range targets are ignored; there is no wraparound.
    ///
    /// In focused mode the index moves immediately. In continuous mode a
    /// smooth scroll is requested instead and the index follows once the
    /// observer sees the target inside the trigger band.
    pub fn go_to(&mut self, idx: usize) -> bool {
        if idx >= self.len {
            debug!("ignoring navigation to {} of {}", idx, self.len);
            return false;
        }
        match self.mode {
            NavMode::Focused => {
                self.current = idx;
            }
            NavMode::Continuous => {
                self.pending_scroll = Some(ScrollRequest {
                    index: idx,
                    behavior: ScrollBehavior::Smooth,
                });
            }
        }
        true
    }

    /// Switching never touches the current index. Entering continuous mode
    /// queues exactly one corrective scroll to it.
    pub fn set_mode(&mut self, mode: NavMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.pending_scroll = match mode {
            NavMode::Continuous if self.len > 0 => Some(ScrollRequest {
                index: self.current,
                behavior: ScrollBehavior::Instant,
            }),
            _ => None,
        };
    }

    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.pending_scroll.take()
    }

    pub fn peek_scroll_request(&self) -> Option<ScrollRequest> {
        self.pending_scroll
    }

    /// Reducer for viewport observations. The first element (in feed order)
    /// that intersects the trigger band becomes current. Returns the new
    /// index when it changed.
    pub fn observe(&mut self, snapshot: &ViewportSnapshot) -> Option<usize> {
        if self.mode != NavMode::Continuous || snapshot.height == 0 {
            return None;
        }
        let (band_top, band_bottom) = self.band.rows(snapshot.height);
        let band_top = snapshot.scroll_top + band_top;
        let band_bottom = snapshot.scroll_top + band_bottom;

        let hit = snapshot
            .elements
            .iter()
            .filter(|e| e.index < self.len)
            .find(|e| e.top < band_bottom && e.bottom > band_top)?;

        if hit.index == self.current {
            return None;
        }
        self.current = hit.index;
        Some(hit.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(heights: &[usize]) -> Vec<ElementSpan> {
        let mut top = 0;
        heights
            .iter()
            .enumerate()
            .map(|(index, h)| {
                let span = ElementSpan {
                    index,
                    top,
                    bottom: top + h,
                };
                top += h;
                span
            })
            .collect()
    }

    #[test]
    fn focused_clamps_without_wrapping() {
        let mut nav = NavigationController::new(3, NavMode::Focused, TriggerBand::default());
        assert!(!nav.previous());
        assert_eq!(nav.current(), 0);
        assert!(nav.next());
        assert!(nav.next());
        assert!(!nav.next());
        assert_eq!(nav.current(), 2);
        assert!(!nav.go_to(3));
        assert_eq!(nav.current(), 2);
        assert!(nav.go_to(0));
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn switching_modes_keeps_index_and_scrolls_once() {
        let mut nav = NavigationController::new(5, NavMode::Focused, TriggerBand::default());
        nav.go_to(3);
        nav.set_mode(NavMode::Continuous);
        assert_eq!(nav.current(), 3);
        assert_eq!(
            nav.take_scroll_request(),
            Some(ScrollRequest {
                index: 3,
                behavior: ScrollBehavior::Instant
            })
        );
        assert_eq!(nav.take_scroll_request(), None);

        // same mode again is a no-op
        nav.set_mode(NavMode::Continuous);
        assert_eq!(nav.take_scroll_request(), None);

        nav.set_mode(NavMode::Focused);
        assert_eq!(nav.current(), 3);
        assert_eq!(nav.take_scroll_request(), None);
    }

    #[test]
    fn continuous_go_to_requests_scroll() {
        let mut nav = NavigationController::new(4, NavMode::Continuous, TriggerBand::default());
        nav.take_scroll_request();
        assert!(nav.go_to(2));
        assert_eq!(nav.current(), 0);
        assert_eq!(
            nav.take_scroll_request(),
            Some(ScrollRequest {
                index: 2,
                behavior: ScrollBehavior::Smooth
            })
        );
        assert!(!nav.go_to(9));
        assert_eq!(nav.take_scroll_request(), None);
    }

    #[test]
    fn observer_picks_element_in_band() {
        let mut nav = NavigationController::new(3, NavMode::Continuous, TriggerBand::default());
        let elements = feed(&[10, 10, 10]);

        // viewport 20 rows tall, band rows [4, 6)
        let snap = ViewportSnapshot {
            scroll_top: 0,
            height: 20,
            elements: elements.clone(),
        };
        assert_eq!(nav.observe(&snap), None);

        let snap = ViewportSnapshot {
            scroll_top: 8,
            height: 20,
            elements: elements.clone(),
        };
        // band is rows 12..14, inside question 1
        assert_eq!(nav.observe(&snap), Some(1));
        assert_eq!(nav.current(), 1);

        let snap = ViewportSnapshot {
            scroll_top: 17,
            height: 20,
            elements,
        };
        assert_eq!(nav.observe(&snap), Some(2));
    }

    #[test]
    fn observer_ignored_in_focused_mode() {
        let mut nav = NavigationController::new(3, NavMode::Focused, TriggerBand::default());
        let snap = ViewportSnapshot {
            scroll_top: 25,
            height: 20,
            elements: feed(&[10, 10, 10]),
        };
        assert_eq!(nav.observe(&snap), None);
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn scroll_target_lands_in_band() {
        let band = TriggerBand::default();
        let target = band.scroll_target(40, 20);
        let (top, bottom) = band.rows(20);
        assert!(40 >= target + top && 40 < target + bottom);
        assert_eq!(band.scroll_target(2, 20), 0);
    }
}
