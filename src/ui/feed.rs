use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::navigation::ElementSpan;
use crate::state::AppState;
use crate::ui::markdown::preamble_lines;
use crate::ui::question::{build_question_block, QuestionBlock};
use crate::ui::scroll_offset;

/// Every question stacked into one scrollable column.
pub struct FeedLayout {
    pub lines: Vec<Line<'static>>,
    pub spans: Vec<ElementSpan>,
    blocks: Vec<QuestionBlock>,
}

impl FeedLayout {
    /// Question and option under feed row `row`.
    pub fn option_at(&self, row: usize) -> Option<(usize, usize)> {
        let span = self.spans.iter().find(|s| row >= s.top && row < s.bottom)?;
        let block = self.blocks.get(span.index)?;
        block
            .option_at(row - span.top)
            .map(|option| (span.index, option))
    }
}

pub fn feed_width(area: Rect) -> usize {
    area.width.saturating_sub(2) as usize
}

/// Lay out the feed for a viewport of `area`. The head is padded with as
/// many blank rows as the trigger band sits below the viewport top, so the
/// first question can still be scrolled into the band.
pub fn layout_feed(state: &AppState, area: Rect) -> FeedLayout {
    let session = &state.session;
    let width = feed_width(area);
    let (band_top, _) = session.navigation().band().rows(area.height as usize);
    let mut lines = vec![Line::from(""); band_top];
    lines.extend(preamble_lines(session.node(), width));
    let mut spans = Vec::with_capacity(session.len());
    let mut blocks = Vec::with_capacity(session.len());

    for idx in 0..session.len() {
        let cursor = (idx == session.current_index()).then_some(state.choice_cursor);
        let block = build_question_block(session, idx, width, cursor);
        let top = lines.len();
        lines.extend(block.lines.iter().cloned());
        lines.push(Line::from(Span::styled(
            format!("  {}", "┄".repeat(width.saturating_sub(4))),
            Style::default().fg(Color::Rgb(60, 60, 60)),
        )));
        spans.push(ElementSpan {
            index: idx,
            top,
            bottom: lines.len(),
        });
        blocks.push(block);
    }

    FeedLayout {
        lines,
        spans,
        blocks,
    }
}

pub fn draw_feed(f: &mut Frame, area: Rect, state: &AppState) {
    let layout = layout_feed(state, area);
    let total = layout.lines.len();
    let scroll = state.feed.scroll.min(total.saturating_sub(1));

    let content = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(1),
        ..area
    };
    f.render_widget(Paragraph::new(layout.lines).scroll((scroll_offset(scroll), 0)), content);

    // trigger band marker in the gutter
    let (band_top, band_bottom) = state.session.navigation().band().rows(area.height as usize);
    let marker: Vec<Line> = (0..area.height as usize)
        .map(|row| {
            if row >= band_top && row < band_bottom {
                Line::from(Span::styled("▐", Style::default().fg(Color::Cyan)))
            } else {
                Line::from("")
            }
        })
        .collect();
    f.render_widget(
        Paragraph::new(marker),
        Rect {
            width: 1.min(area.width),
            ..area
        },
    );

    let visible = area.height as usize;
    if total > visible {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(visible))
            .position(scroll)
            .viewport_content_length(visible);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}
