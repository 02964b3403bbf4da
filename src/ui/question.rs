use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use crate::controller::SessionController;
use crate::model::QuestionStatus;
use crate::state::AppState;
use crate::ui::markdown::{body_elements_to_lines, preamble_lines};
use crate::ui::scroll_offset;

/// Rendered rows of one question plus where its options landed.
pub struct QuestionBlock {
    pub lines: Vec<Line<'static>>,
    /// (first row, option index) for each option.
    pub option_rows: Vec<(usize, usize)>,
}

impl QuestionBlock {
    /// Option whose rows contain `row`.
    pub fn option_at(&self, row: usize) -> Option<usize> {
        let mut hit = None;
        for (i, &(start, idx)) in self.option_rows.iter().enumerate() {
            let end = self
                .option_rows
                .get(i + 1)
                .map_or(self.lines.len().saturating_sub(1), |next| next.0);
            if row >= start && row < end {
                hit = Some(idx);
            }
        }
        hit
    }
}

/// Lay out question `idx`. `cursor` highlights an option row.
pub fn build_question_block(
    session: &SessionController,
    idx: usize,
    width: usize,
    cursor: Option<usize>,
) -> QuestionBlock {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut option_rows = Vec::new();
    let Some(question) = session.store().question(idx) else {
        return QuestionBlock { lines, option_rows };
    };

    let is_current = idx == session.current_index();
    let header_style = if is_current {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)
    };
    let header = format!("{}. {}", idx + 1, question.prompt);
    for (i, row) in wrap_text(&header, width.saturating_sub(4)).into_iter().enumerate() {
        let indent = if i == 0 { "  " } else { "     " };
        lines.push(Line::from(Span::styled(format!("{}{}", indent, row), header_style)));
    }

    let mut tag = vec![Span::styled(
        format!("  [{}]", question.kind),
        Style::default().fg(Color::DarkGray),
    )];
    if session.status(idx) == QuestionStatus::Flagged {
        tag.push(Span::styled("  ⚑ flagged", Style::default().fg(Color::Red)));
    }
    lines.push(Line::from(tag));
    lines.push(Line::from(""));

    if let Some(passage) = &question.passage {
        let style = Style::default()
            .fg(Color::Rgb(180, 180, 180))
            .add_modifier(Modifier::ITALIC);
        for para in passage.split("\n\n") {
            for row in wrap_text(para, width.saturating_sub(6)) {
                lines.push(Line::from(vec![
                    Span::styled("  │ ", Style::default().fg(Color::DarkGray)),
                    Span::styled(row, style),
                ]));
            }
        }
        lines.push(Line::from(""));
    }

    let body_width = width.saturating_sub(4);
    for line in body_elements_to_lines(&question.body) {
        for wline in wrap_styled_line(line, body_width) {
            lines.push(Line::from(
                std::iter::once(Span::raw("  "))
                    .chain(wline.spans)
                    .collect::<Vec<_>>(),
            ));
        }
    }
    if !question.body.is_empty() && lines.last().map_or(false, |l| l.width() > 0) {
        lines.push(Line::from(""));
    }

    let selected = session.store().selected_option(&question.id);
    for (i, option) in question.options.iter().enumerate() {
        let is_selected = selected == Some(option.id.as_str());
        let radio = if is_selected { "(●)" } else { "( )" };
        let mut style = if is_selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        if is_current && cursor == Some(i) {
            style = style.bg(Color::DarkGray);
        }

        option_rows.push((lines.len(), i));
        let prefix = format!("  {} {}. ", radio, option.id);
        let prefix_len = text_width(&prefix);
        for (li, row) in wrap_text(&option.text, width.saturating_sub(prefix_len))
            .into_iter()
            .enumerate()
        {
            let lead = if li == 0 {
                prefix.clone()
            } else {
                " ".repeat(prefix_len)
            };
            lines.push(Line::from(vec![
                Span::styled(lead, style),
                Span::styled(row, style),
            ]));
        }
    }
    lines.push(Line::from(""));

    QuestionBlock { lines, option_rows }
}

/// Rows above the question in focused mode; the deck preamble sits above the
/// first question.
fn focused_lead(state: &AppState, width: usize) -> Vec<Line<'static>> {
    if state.session.current_index() == 0 {
        preamble_lines(state.session.node(), width)
    } else {
        Vec::new()
    }
}

/// Option under a click at `row` of the focused view, if any.
pub fn option_at(state: &AppState, area: Rect, row: usize) -> Option<usize> {
    let width = area.width.saturating_sub(1) as usize;
    let lead = focused_lead(state, width).len();
    let block = build_question_block(
        &state.session,
        state.session.current_index(),
        width,
        None,
    );
    let content_row = (row + state.question_scroll).checked_sub(lead)?;
    block.option_at(content_row)
}

pub fn draw_question(f: &mut Frame, area: Rect, state: &AppState) {
    let width = area.width.saturating_sub(1) as usize;
    let mut lines = focused_lead(state, width);
    let block = build_question_block(
        &state.session,
        state.session.current_index(),
        width,
        Some(state.choice_cursor),
    );
    lines.extend(block.lines);

    let total = lines.len();
    let visible = area.height as usize;
    let scroll = state.question_scroll.min(total.saturating_sub(1));

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::NONE))
        .scroll((scroll_offset(scroll), 0));
    f.render_widget(widget, area);

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

pub fn text_width(text: &str) -> usize {
    Span::raw(text).width()
}

fn char_width(c: char) -> usize {
    let mut buf = [0u8; 4];
    text_width(c.encode_utf8(&mut buf))
}

/// Wrap a styled Line at `width` display columns, preserving span styles.
pub fn wrap_styled_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line.width() <= width {
        return vec![line];
    }

    let mut chars: Vec<(char, Style)> = Vec::new();
    for span in &line.spans {
        for c in span.content.chars() {
            chars.push((c, span.style));
        }
    }

    let mut result: Vec<Line<'static>> = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let mut used = 0;
        let mut end = pos;
        while end < chars.len() && used + char_width(chars[end].0) <= width {
            used += char_width(chars[end].0);
            end += 1;
        }
        if end == chars.len() {
            result.push(styled_chars_to_line(&chars[pos..]));
            break;
        }
        if end == pos {
            end = pos + 1;
        }

        let break_at = if chars[end].0 == ' ' {
            end
        } else {
            match chars[pos..end].iter().rposition(|(c, _)| *c == ' ') {
                Some(sp) if sp > 0 => pos + sp,
                _ => end,
            }
        };
        result.push(styled_chars_to_line(&chars[pos..break_at]));
        pos = break_at;
        if pos < chars.len() && chars[pos].0 == ' ' {
            pos += 1;
        }
    }

    if result.is_empty() {
        result.push(Line::from(""));
    }
    result
}

/// Rebuild a Line from (char, style) pairs, grouping runs of equal style.
fn styled_chars_to_line(chars: &[(char, Style)]) -> Line<'static> {
    let Some(&(_, first)) = chars.first() else {
        return Line::from("");
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut current_style = first;
    for &(c, style) in chars {
        if style != current_style && !current_text.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut current_text), current_style));
        }
        current_style = style;
        current_text.push(c);
    }
    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, current_style));
    }
    Line::from(spans)
}

/// Word-wrap plain text to `width` display columns. Words wider than a row
/// (including unspaced CJK runs) are broken between characters.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = text_width(word);
        if current_width > 0 && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if current_width > 0 {
            result.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }
        for c in word.chars() {
            let w = char_width(c);
            if current_width + w > width && current_width > 0 {
                result.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += w;
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    if result.is_empty() {
        result.push(String::new());
    }
    result
}
