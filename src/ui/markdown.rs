use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::model::{BodyElement, SessionNode};
use crate::ui::question::wrap_styled_line;

/// Inline markdown (emphasis, code spans) as styled lines. Paragraphs are
/// followed by a blank line.
pub fn markdown_to_lines(text: &str) -> Vec<Line<'static>> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, opts);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Style::default()];

    for event in parser {
        match event {
            Event::Start(Tag::Paragraph) => {
                current_spans.clear();
            }
            Event::End(TagEnd::Paragraph) => {
                if !current_spans.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current_spans)));
                }
                lines.push(Line::from(""));
            }
            Event::Start(Tag::Strong) => {
                let current = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(current.add_modifier(Modifier::BOLD));
            }
            Event::Start(Tag::Emphasis) => {
                let current = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(current.add_modifier(Modifier::ITALIC));
            }
            Event::Start(Tag::Strikethrough) => {
                let current = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(current.add_modifier(Modifier::CROSSED_OUT));
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough) => {
                style_stack.pop();
            }
            Event::Text(text) => {
                let style = *style_stack.last().unwrap_or(&Style::default());
                current_spans.push(Span::styled(text.to_string(), style));
            }
            Event::Code(code) => {
                current_spans.push(Span::styled(
                    format!("`{}`", code),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                if !current_spans.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current_spans)));
                }
            }
            _ => {}
        }
    }

    if !current_spans.is_empty() {
        lines.push(Line::from(current_spans));
    }

    lines
}

pub fn body_elements_to_lines(elements: &[BodyElement]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for elem in elements {
        match elem {
            BodyElement::Text(text) => {
                lines.extend(markdown_to_lines(text));
            }
            BodyElement::Code(code) => {
                for code_line in code.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", code_line),
                        Style::default().fg(Color::Green),
                    )));
                }
                lines.push(Line::from(""));
            }
            BodyElement::ListItem(text) => {
                let mut spans = vec![Span::raw("  • ")];
                if let Some(first) = markdown_to_lines(text).into_iter().next() {
                    spans.extend(first.spans);
                }
                lines.push(Line::from(spans));
            }
        }
    }
    lines
}

/// Deck introduction shown above the first question, wrapped to `width`.
pub fn preamble_lines(node: &SessionNode, width: usize) -> Vec<Line<'static>> {
    if node.preamble.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    for para in &node.preamble {
        for line in markdown_to_lines(para) {
            for wline in wrap_styled_line(line, width.saturating_sub(4)) {
                let spans: Vec<Span<'static>> = std::iter::once(Span::raw("  "))
                    .chain(wline.spans.into_iter().map(|s| {
                        let style = s.style.fg(Color::Rgb(200, 200, 120));
                        s.style(style)
                    }))
                    .collect();
                lines.push(Line::from(spans));
            }
        }
    }
    lines.push(Line::from(Span::styled(
        format!("  {}", "─".repeat(width.saturating_sub(4).min(60))),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));
    lines
}
