use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;

use crate::model::*;
use crate::scoring;

/// Ordered questions plus the mutable answer and flag state of one session.
///
/// Every mutator is a silent no-op once the store is submitted, and ids that
/// are not part of the loaded question list are ignored, so `answers` and
/// `flagged` can only ever reference loaded questions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    questions: Vec<Question>,
    index_by_id: HashMap<String, usize>,
    answers: HashMap<String, UserAnswer>,
    flagged: HashSet<String>,
    submitted: bool,
    started_at: DateTime<Utc>,
}

impl SessionStore {
    pub fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        let index_by_id = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id.clone(), i))
            .collect();
        Self {
            questions,
            index_by_id,
            answers: HashMap::new(),
            flagged: HashSet::new(),
            submitted: false,
            started_at,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, idx: usize) -> Option<&Question> {
        self.questions.get(idx)
    }

    pub fn index_of(&self, question_id: &str) -> Option<usize> {
        self.index_by_id.get(question_id).copied()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Last write wins. Returns whether the answer was recorded.
    pub fn select_answer(
        &mut self,
        question_id: &str,
        option_id: Option<&str>,
        time_spent_seconds: u64,
    ) -> bool {
        if self.submitted {
            debug!("ignoring answer for {} after submission", question_id);
            return false;
        }
        let Some(idx) = self.index_of(question_id) else {
            debug!("ignoring answer for unknown question {}", question_id);
            return false;
        };
        if let Some(oid) = option_id {
            if self.questions[idx].option(oid).is_none() {
                debug!("ignoring unknown option {} for {}", oid, question_id);
                return false;
            }
        }

        self.answers.insert(
            question_id.to_string(),
            UserAnswer {
                question_id: question_id.to_string(),
                selected_option_id: option_id.map(str::to_string),
                time_spent_seconds,
            },
        );
        true
    }

    /// Returns whether the flag set changed.
    pub fn toggle_flag(&mut self, question_id: &str) -> bool {
        if self.submitted {
            debug!("ignoring flag toggle for {} after submission", question_id);
            return false;
        }
        if self.index_of(question_id).is_none() {
            return false;
        }
        if !self.flagged.remove(question_id) {
            self.flagged.insert(question_id.to_string());
        }
        true
    }

    pub fn answer(&self, question_id: &str) -> Option<&UserAnswer> {
        self.answers.get(question_id)
    }

    pub fn answers(&self) -> &HashMap<String, UserAnswer> {
        &self.answers
    }

    /// Answers in question order, for submission payloads.
    pub fn ordered_answers(&self) -> Vec<UserAnswer> {
        self.questions
            .iter()
            .filter_map(|q| self.answers.get(&q.id).cloned())
            .collect()
    }

    pub fn selected_option(&self, question_id: &str) -> Option<&str> {
        self.answers
            .get(question_id)
            .and_then(|a| a.selected_option_id.as_deref())
    }

    pub fn is_flagged(&self, question_id: &str) -> bool {
        self.flagged.contains(question_id)
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }

    /// Flagged wins over answered.
    pub fn status(&self, question_id: &str) -> QuestionStatus {
        if self.flagged.contains(question_id) {
            QuestionStatus::Flagged
        } else if self.selected_option(question_id).is_some() {
            QuestionStatus::Answered
        } else {
            QuestionStatus::Unanswered
        }
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for q in &self.questions {
            match self.status(&q.id) {
                QuestionStatus::Answered => counts.answered += 1,
                QuestionStatus::Flagged => counts.flagged += 1,
                QuestionStatus::Unanswered => counts.unanswered += 1,
            }
        }
        counts
    }

    /// Questions with a non-null selection, flagged or not.
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.selected_option(&q.id).is_some())
            .count()
    }

    /// Test-and-set on the submitted flag. Only the first call returns true.
    pub fn mark_submitted(&mut self) -> bool {
        if self.submitted {
            return false;
        }
        self.submitted = true;
        true
    }

    /// Score of the frozen session; `None` until submitted.
    pub fn result(&self) -> Option<SessionResult> {
        if !self.submitted {
            return None;
        }
        Some(scoring::calculate(&self.questions, &self.answers))
    }
}
