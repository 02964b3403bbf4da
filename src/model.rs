use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of study item a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Exam,
    Quiz,
    Drill,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Exam => "exam",
            ItemType::Quiz => "quiz",
            ItemType::Drill => "drill",
        }
    }
}

/// The content node a session was loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNode {
    pub id: String,
    pub title: String,
    pub item_type: ItemType,
    /// Seconds allowed for the whole session; `None` means unlimited.
    pub time_limit: Option<u64>,
    pub preamble: Vec<String>,
}

/// Everything `ContentProvider::get_session_data` hands back.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub node: SessionNode,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// Free-form tag such as `vocabulary`, `grammar` or `kanji`.
    pub kind: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<BodyElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
    pub options: Vec<QuestionOption>,
    pub correct_option_id: String,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn option_index(&self, option_id: &str) -> Option<usize> {
        self.options.iter().position(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum BodyElement {
    Text(String),
    Code(String),
    ListItem(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: String,
    pub selected_option_id: Option<String>,
    pub time_spent_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub percentage: u32,
    pub passed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Started,
    Completed,
    Abandoned,
}

/// Extra payload attached to COMPLETED records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDetails {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub flagged: usize,
    pub passed: bool,
}

/// A row sent to the progress service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub item_type: ItemType,
    pub item_id: String,
    pub item_title: String,
    pub score: Option<u32>,
    pub status: RecordStatus,
    pub session_id: Option<String>,
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<RecordDetails>,
    pub recorded_at: DateTime<Utc>,
}

/// Payload for `AttemptService::save_attempt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSubmission {
    pub node_id: String,
    pub answers: Vec<UserAnswer>,
    pub time_taken_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReceipt {
    pub attempt_id: String,
    pub result: SessionResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    Flagged,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub answered: usize,
    pub flagged: usize,
    pub unanswered: usize,
}
