//! Error types shared across the crate.

use thiserror::Error;

/// Problems found while parsing a deck file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("deck file must start with YAML frontmatter (---)")]
    MissingFrontmatter,
    #[error("no closing --- for frontmatter")]
    UnclosedFrontmatter,
    #[error("invalid frontmatter: {0}")]
    Frontmatter(String),
    #[error("question {number} ({prompt:?}) has no options")]
    NoOptions { number: usize, prompt: String },
    #[error("question {number} ({prompt:?}) must mark exactly one correct option, found {marked}")]
    CorrectOption {
        number: usize,
        prompt: String,
        marked: usize,
    },
    #[error("question {number} has more than 26 options")]
    TooManyOptions { number: usize },
}

/// Question content could not be loaded; no session is created.
#[derive(Debug, Error)]
pub enum ContentLoadError {
    #[error("deck not found: {0}")]
    NotFound(String),
    #[error("cannot read deck {node}: {source}")]
    Unreadable {
        node: String,
        #[source]
        source: std::io::Error,
    },
    #[error("deck {node} is malformed: {source}")]
    Parse {
        node: String,
        #[source]
        source: ParseError,
    },
    #[error("deck {0} has no questions")]
    Empty(String),
}

/// Saving a finished attempt failed. The session stays submitted.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("attempt storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode attempt: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("attempt references unknown deck: {0}")]
    UnknownNode(#[from] ContentLoadError),
    #[error("attempt rejected: {0}")]
    Rejected(String),
}

/// A lifecycle record could not be written. Logged, never surfaced.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("progress log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode progress record: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("progress service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid trigger band {start}..{end}: expected 0 <= start < end <= 1")]
    TriggerBand { start: f32, end: f32 },
}
