use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Deserialize;

use crate::error::ParseError;
use crate::model::*;

#[derive(Debug, Clone, Deserialize)]
pub struct Frontmatter {
    pub title: Option<String>,
    #[serde(default)]
    pub item_type: ItemType,
    /// Seconds; absent or 0 means unlimited.
    #[serde(default)]
    pub time_limit: Option<u64>,
    #[serde(default)]
    pub private: bool,
}

/// A parsed deck file, before access checks.
#[derive(Debug, Clone)]
pub struct Deck {
    pub frontmatter: Frontmatter,
    pub node: SessionNode,
    pub questions: Vec<Question>,
}

pub fn parse_deck(content: &str, node_id: &str) -> Result<Deck, ParseError> {
    let (frontmatter, body) = split_frontmatter(content)?;
    let frontmatter = if frontmatter.is_empty() {
        "{}".to_string()
    } else {
        frontmatter
    };
    let fm: Frontmatter =
        serde_yaml::from_str(&frontmatter).map_err(|e| ParseError::Frontmatter(e.to_string()))?;

    let (title, preamble, questions) = parse_body(&body)?;
    let title = fm
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(if title.is_empty() { node_id.to_string() } else { title });

    let node = SessionNode {
        id: node_id.to_string(),
        title,
        item_type: fm.item_type,
        time_limit: fm.time_limit.filter(|secs| *secs > 0),
        preamble,
    };

    Ok(Deck {
        frontmatter: fm,
        node,
        questions,
    })
}

fn split_frontmatter(content: &str) -> Result<(String, String), ParseError> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return Err(ParseError::MissingFrontmatter);
    }

    let after_first = &trimmed[3..];
    let end_pos = after_first
        .find("\n---")
        .ok_or(ParseError::UnclosedFrontmatter)?;

    let fm = after_first[..end_pos].trim().to_string();
    let body = after_first[end_pos + 4..].to_string();

    Ok((fm, body))
}

/// Question under construction while walking the event stream.
#[derive(Default)]
struct Draft {
    prompt: String,
    kind: Option<String>,
    body: Vec<BodyElement>,
    passage: Vec<String>,
    options: Vec<(String, bool)>,
    explanation: Option<String>,
}

impl Draft {
    fn finish(self, number: usize) -> Result<Question, ParseError> {
        let prompt = self.prompt.trim().to_string();
        if self.options.is_empty() {
            return Err(ParseError::NoOptions { number, prompt });
        }
        if self.options.len() > 26 {
            return Err(ParseError::TooManyOptions { number });
        }

        let marked: Vec<usize> = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, (_, correct))| *correct)
            .map(|(i, _)| i)
            .collect();
        if marked.len() != 1 {
            return Err(ParseError::CorrectOption {
                number,
                prompt,
                marked: marked.len(),
            });
        }

        let options: Vec<QuestionOption> = self
            .options
            .into_iter()
            .enumerate()
            .map(|(i, (text, _))| QuestionOption {
                id: option_id(i),
                text,
            })
            .collect();

        Ok(Question {
            id: format!("q{}", number),
            kind: self.kind.unwrap_or_else(|| "general".to_string()),
            prompt,
            body: self.body,
            passage: if self.passage.is_empty() {
                None
            } else {
                Some(self.passage.join("\n\n"))
            },
            correct_option_id: option_id(marked[0]),
            options,
            explanation: self.explanation.unwrap_or_default(),
        })
    }
}

fn option_id(idx: usize) -> String {
    ((b'a' + idx as u8) as char).to_string()
}

fn parse_body(body: &str) -> Result<(String, Vec<String>, Vec<Question>), ParseError> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(body, opts);

    let mut title = String::new();
    let mut preamble: Vec<String> = Vec::new();
    let mut questions: Vec<Question> = Vec::new();
    let mut draft: Option<Draft> = None;

    let mut in_h1 = false;
    let mut in_h2 = false;
    let mut in_blockquote = false;
    let mut in_list_item = false;
    let mut list_item_text = String::new();
    let mut task_list_checked: Option<bool> = None;
    let mut in_paragraph = false;
    let mut paragraph_text = String::new();
    let mut in_code_block = false;
    let mut code_block_text = String::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => match level {
                HeadingLevel::H1 => in_h1 = true,
                HeadingLevel::H2 => {
                    if let Some(done) = draft.take() {
                        questions.push(done.finish(questions.len() + 1)?);
                    }
                    draft = Some(Draft::default());
                    in_h2 = true;
                }
                _ => {}
            },
            Event::End(TagEnd::Heading(level)) => match level {
                HeadingLevel::H1 => in_h1 = false,
                HeadingLevel::H2 => in_h2 = false,
                _ => {}
            },
            Event::Start(Tag::BlockQuote(_)) => in_blockquote = true,
            Event::End(TagEnd::BlockQuote(_)) => in_blockquote = false,
            Event::Start(Tag::Item) => {
                in_list_item = true;
                list_item_text.clear();
                task_list_checked = None;
            }
            Event::End(TagEnd::Item) => {
                in_list_item = false;
                let text = list_item_text.trim().to_string();
                if let Some(d) = draft.as_mut() {
                    match task_list_checked {
                        Some(checked) => d.options.push((text, checked)),
                        None if !text.is_empty() => d.body.push(BodyElement::ListItem(text)),
                        None => {}
                    }
                }
                task_list_checked = None;
            }
            Event::TaskListMarker(checked) => {
                task_list_checked = Some(checked);
            }
            Event::Start(Tag::Paragraph) => {
                in_paragraph = true;
                paragraph_text.clear();
            }
            Event::End(TagEnd::Paragraph) => {
                in_paragraph = false;
                if in_list_item {
                    continue;
                }
                let text = paragraph_text.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match draft.as_mut() {
                    Some(d) if in_blockquote => d.passage.push(text),
                    Some(d) => {
                        if let Some(kind) = text.strip_prefix("Type:") {
                            d.kind = Some(kind.trim().to_lowercase());
                        } else if let Some(expl) = text.strip_prefix("Explanation:") {
                            d.explanation = Some(expl.trim().to_string());
                        } else {
                            d.body.push(BodyElement::Text(text));
                        }
                    }
                    None if !in_h1 => preamble.push(text),
                    None => {}
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                code_block_text.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                if let Some(d) = draft.as_mut() {
                    d.body.push(BodyElement::Code(code_block_text.clone()));
                }
            }
            Event::Text(text) => {
                if in_h1 {
                    title.push_str(&text);
                } else if in_h2 {
                    if let Some(d) = draft.as_mut() {
                        d.prompt.push_str(&text);
                    }
                } else if in_code_block {
                    code_block_text.push_str(&text);
                } else if in_list_item {
                    list_item_text.push_str(&text);
                } else if in_paragraph {
                    paragraph_text.push_str(&text);
                }
            }
            Event::Code(code) => {
                let c = format!("`{}`", code);
                if in_h2 {
                    if let Some(d) = draft.as_mut() {
                        d.prompt.push_str(&c);
                    }
                } else if in_list_item {
                    list_item_text.push_str(&c);
                } else if in_paragraph {
                    paragraph_text.push_str(&c);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if in_list_item {
                    list_item_text.push(' ');
                } else if in_paragraph {
                    paragraph_text.push(' ');
                }
            }
            _ => {}
        }
    }

    if let Some(done) = draft.take() {
        questions.push(done.finish(questions.len() + 1)?);
    }

    Ok((title.trim().to_string(), preamble, questions))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"---
title: Particles
item_type: quiz
time_limit: 120
---

# Particle practice

Pick the particle that fits.

## 私＿学生です。

Type: Grammar

- [x] は
- [ ] を
- [ ] に

Explanation: は marks the topic.

## Read the passage and answer.

> 田中さんは毎朝六時に起きます。

When does Tanaka get up?

- [ ] 7:00
- [x] 6:00
"#;

    #[test]
    fn parses_questions_and_options() {
        let deck = parse_deck(DECK, "particles").unwrap();
        assert_eq!(deck.node.title, "Particles");
        assert_eq!(deck.node.item_type, ItemType::Quiz);
        assert_eq!(deck.node.time_limit, Some(120));
        assert_eq!(deck.node.preamble, vec!["Pick the particle that fits."]);
        assert_eq!(deck.questions.len(), 2);

        let q1 = &deck.questions[0];
        assert_eq!(q1.id, "q1");
        assert_eq!(q1.kind, "grammar");
        assert_eq!(q1.options.len(), 3);
        assert_eq!(q1.options[1].id, "b");
        assert_eq!(q1.correct_option_id, "a");
        assert_eq!(q1.explanation, "は marks the topic.");

        let q2 = &deck.questions[1];
        assert_eq!(q2.kind, "general");
        assert_eq!(q2.passage.as_deref(), Some("田中さんは毎朝六時に起きます。"));
        assert_eq!(q2.correct_option_id, "b");
        assert_eq!(
            q2.body,
            vec![BodyElement::Text("When does Tanaka get up?".to_string())]
        );
    }

    #[test]
    fn zero_time_limit_means_unlimited() {
        let deck = parse_deck(
            "---\ntime_limit: 0\n---\n## Q\n- [x] yes\n- [ ] no\n",
            "d",
        )
        .unwrap();
        assert_eq!(deck.node.time_limit, None);
        assert_eq!(deck.node.title, "d");
    }

    #[test]
    fn rejects_missing_or_double_answer_key() {
        let err = parse_deck("---\n---\n## Q\n- [ ] a\n- [ ] b\n", "d").unwrap_err();
        assert!(matches!(err, ParseError::CorrectOption { marked: 0, .. }));

        let err = parse_deck("---\n---\n## Q\n- [x] a\n- [x] b\n", "d").unwrap_err();
        assert!(matches!(err, ParseError::CorrectOption { marked: 2, .. }));

        let err = parse_deck("---\n---\n## Q\nno options here\n", "d").unwrap_err();
        assert!(matches!(err, ParseError::NoOptions { number: 1, .. }));
    }

    #[test]
    fn requires_frontmatter() {
        assert_eq!(
            parse_deck("# Title\n", "d").unwrap_err(),
            ParseError::MissingFrontmatter
        );
        assert_eq!(
            parse_deck("---\ntitle: x\n", "d").unwrap_err(),
            ParseError::UnclosedFrontmatter
        );
    }
}
