//! Collaborator contracts the session engine talks to, plus local
//! filesystem-backed implementations used by the terminal front end.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ContentLoadError, ReportError, SubmissionError};
use crate::model::*;
use crate::parser;
use crate::scoring;

pub trait ContentProvider: Send + Sync {
    /// Missing, private and inaccessible nodes all report `NotFound`.
    fn get_session_data(&self, node_id: &str) -> Result<SessionData, ContentLoadError>;
}

pub trait AttemptService: Send + Sync {
    fn save_attempt(&self, submission: &AttemptSubmission) -> Result<AttemptReceipt, SubmissionError>;
}

pub trait ProgressService: Send + Sync {
    fn start_session(
        &self,
        item_type: ItemType,
        item_id: &str,
        title: &str,
    ) -> Result<String, ReportError>;

    fn save_record(&self, record: &SessionRecord) -> Result<(), ReportError>;
}

/// Directory of `<node_id>.md` deck files.
#[derive(Debug, Clone)]
pub struct DeckDirectory {
    root: PathBuf,
}

impl DeckDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn deck_path(&self, node_id: &str) -> Option<PathBuf> {
        let valid = !node_id.is_empty()
            && node_id
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.root.join(format!("{}.md", node_id)))
    }

    /// Public decks with at least one question, sorted by id. Unreadable or
    /// malformed files are skipped.
    pub fn list(&self) -> Result<Vec<SessionNode>, std::io::Error> {
        let mut nodes = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().map_or(true, |e| e != "md") {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            match self.get_session_data(&stem) {
                Ok(data) if !data.questions.is_empty() => nodes.push(data.node),
                Ok(_) => debug!("skipping deck {}: no questions", stem),
                Err(e) => debug!("skipping deck {}: {}", stem, e),
            }
        }
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(nodes)
    }
}

impl ContentProvider for DeckDirectory {
    fn get_session_data(&self, node_id: &str) -> Result<SessionData, ContentLoadError> {
        let path = self
            .deck_path(node_id)
            .ok_or_else(|| ContentLoadError::NotFound(node_id.to_string()))?;
        if !path.is_file() {
            return Err(ContentLoadError::NotFound(node_id.to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|source| ContentLoadError::Unreadable {
            node: node_id.to_string(),
            source,
        })?;
        let deck = parser::parse_deck(&content, node_id).map_err(|source| {
            ContentLoadError::Parse {
                node: node_id.to_string(),
                source,
            }
        })?;

        if deck.frontmatter.private {
            return Err(ContentLoadError::NotFound(node_id.to_string()));
        }

        Ok(SessionData {
            node: deck.node,
            questions: deck.questions,
        })
    }
}

#[derive(Debug, Serialize)]
struct AttemptFile<'a> {
    attempt_id: &'a str,
    node_id: &'a str,
    submitted_at: String,
    time_taken_seconds: u64,
    answers: &'a [UserAnswer],
    result: &'a SessionResult,
}

/// Grades attempts against the deck directory and keeps one YAML file per
/// attempt under `dir`.
#[derive(Debug, Clone)]
pub struct LocalAttemptStore {
    dir: PathBuf,
    decks: DeckDirectory,
}

impl LocalAttemptStore {
    pub fn new(dir: impl Into<PathBuf>, decks: DeckDirectory) -> Self {
        Self {
            dir: dir.into(),
            decks,
        }
    }
}

impl AttemptService for LocalAttemptStore {
    fn save_attempt(&self, submission: &AttemptSubmission) -> Result<AttemptReceipt, SubmissionError> {
        let data = self.decks.get_session_data(&submission.node_id)?;

        let mut answers: HashMap<String, UserAnswer> = HashMap::new();
        for answer in &submission.answers {
            if data.questions.iter().all(|q| q.id != answer.question_id) {
                return Err(SubmissionError::Rejected(format!(
                    "unknown question {}",
                    answer.question_id
                )));
            }
            answers.insert(answer.question_id.clone(), answer.clone());
        }
        let result = scoring::calculate(&data.questions, &answers);

        let submitted_at = Utc::now().to_rfc3339();
        let attempt_id = token(&[submission.node_id.as_str(), submitted_at.as_str()]);

        let file = AttemptFile {
            attempt_id: &attempt_id,
            node_id: &submission.node_id,
            submitted_at,
            time_taken_seconds: submission.time_taken_seconds,
            answers: &submission.answers,
            result: &result,
        };
        let yaml = serde_yaml::to_string(&file)?;

        fs::create_dir_all(&self.dir)?;
        atomic_write(&self.dir.join(format!("{}.yaml", attempt_id)), &yaml)?;
        info!("saved attempt {} for {}", attempt_id, submission.node_id);

        Ok(AttemptReceipt { attempt_id, result })
    }
}

/// Append-only YAML stream of lifecycle records.
#[derive(Debug)]
pub struct ProgressLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &SessionRecord) -> Result<(), ReportError> {
        let yaml = serde_yaml::to_string(record)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ReportError::Unavailable("progress log lock poisoned".to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "---\n{}", yaml)?;
        Ok(())
    }

    /// Every record written so far, oldest first.
    pub fn read_all(&self) -> Result<Vec<SessionRecord>, ReportError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(&content) {
            let value = serde_yaml::Value::deserialize(doc)?;
            if value.is_null() {
                continue;
            }
            records.push(serde_yaml::from_value(value)?);
        }
        Ok(records)
    }
}

impl ProgressService for ProgressLog {
    fn start_session(
        &self,
        item_type: ItemType,
        item_id: &str,
        title: &str,
    ) -> Result<String, ReportError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();
        let session_id = token(&[item_type.as_str(), item_id, stamp.as_str()]);
        self.append(&SessionRecord {
            item_type,
            item_id: item_id.to_string(),
            item_title: title.to_string(),
            score: None,
            status: RecordStatus::Started,
            session_id: Some(session_id.clone()),
            duration: 0,
            details: None,
            recorded_at: now,
        })?;
        Ok(session_id)
    }

    fn save_record(&self, record: &SessionRecord) -> Result<(), ReportError> {
        self.append(record)
    }
}

fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Short unique id derived from the given parts, a process-wide counter and
/// the current time.
pub fn token(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    hasher.update(
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes(),
    );
    hex_encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("termdrill_services_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const DECK: &str = "---\ntitle: Colours\n---\n## 赤\n- [x] red\n- [ ] blue\n## 青\n- [ ] red\n- [x] blue\n";

    #[test]
    fn private_and_missing_decks_are_not_found() {
        let dir = temp_dir("private");
        fs::write(dir.join("secret.md"), "---\nprivate: true\n---\n## Q\n- [x] a\n").unwrap();
        let decks = DeckDirectory::new(&dir);

        assert!(matches!(
            decks.get_session_data("secret"),
            Err(ContentLoadError::NotFound(_))
        ));
        assert!(matches!(
            decks.get_session_data("nope"),
            Err(ContentLoadError::NotFound(_))
        ));
        assert!(matches!(
            decks.get_session_data("../etc/passwd"),
            Err(ContentLoadError::NotFound(_))
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn attempt_store_grades_and_writes() {
        let dir = temp_dir("attempts");
        fs::write(dir.join("colours.md"), DECK).unwrap();
        let decks = DeckDirectory::new(&dir);
        let store = LocalAttemptStore::new(dir.join("attempts"), decks.clone());

        let receipt = store
            .save_attempt(&AttemptSubmission {
                node_id: "colours".to_string(),
                answers: vec![UserAnswer {
                    question_id: "q1".to_string(),
                    selected_option_id: Some("a".to_string()),
                    time_spent_seconds: 4,
                }],
                time_taken_seconds: 10,
            })
            .unwrap();

        assert_eq!(receipt.result.correct, 1);
        assert_eq!(receipt.result.unanswered, 1);
        assert_eq!(receipt.result.percentage, 50);
        assert!(dir
            .join("attempts")
            .join(format!("{}.yaml", receipt.attempt_id))
            .exists());

        let err = store
            .save_attempt(&AttemptSubmission {
                node_id: "colours".to_string(),
                answers: vec![UserAnswer {
                    question_id: "q7".to_string(),
                    selected_option_id: None,
                    time_spent_seconds: 0,
                }],
                time_taken_seconds: 1,
            })
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn progress_log_round_trips_records() {
        let dir = temp_dir("progress");
        let log = ProgressLog::new(dir.join("progress.yaml"));

        let sid = log.start_session(ItemType::Drill, "kanji-n5", "Kanji N5").unwrap();
        log.save_record(&SessionRecord {
            item_type: ItemType::Drill,
            item_id: "kanji-n5".to_string(),
            item_title: "Kanji N5".to_string(),
            score: None,
            status: RecordStatus::Abandoned,
            session_id: Some(sid.clone()),
            duration: 42,
            details: None,
            recorded_at: Utc::now(),
        })
        .unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, RecordStatus::Started);
        assert_eq!(records[1].status, RecordStatus::Abandoned);
        assert_eq!(records[1].session_id.as_deref(), Some(sid.as_str()));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn tokens_are_distinct() {
        assert_ne!(token(&["a"]), token(&["a"]));
        assert_eq!(token(&["x"]).len(), 16);
    }
}
