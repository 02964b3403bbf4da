use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::error::{ContentLoadError, SubmissionError};
use crate::model::*;
use crate::navigation::{NavMode, NavigationController, ScrollRequest, TriggerBand, ViewportSnapshot};
use crate::progress::LifecycleReporter;
use crate::services::{AttemptService, ContentProvider, ProgressService};
use crate::store::SessionStore;
use crate::timer::{Clock, ClockEvent, ClockMode};

/// How long teardown waits for a pending attempt save.
const SAVE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub mode: NavMode,
    pub band: TriggerBand,
    /// Overrides the deck's time limit when set.
    pub clock: Option<ClockMode>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: NavMode::Focused,
            band: TriggerBand::default(),
            clock: None,
        }
    }
}

/// Where the attempt save stands after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    NotSubmitted,
    Saving,
    Saved { attempt_id: String },
    Failed(String),
}

/// Owns one practice session from load to submission or teardown.
pub struct SessionController {
    node: SessionNode,
    store: SessionStore,
    clock: Clock,
    expired: Arc<AtomicBool>,
    nav: NavigationController,
    reporter: LifecycleReporter,
    attempts: Arc<dyn AttemptService>,
    dwell: Vec<u64>,
    elapsed: u64,
    result: Option<SessionResult>,
    submission: Submission,
    save_rx: Option<mpsc::Receiver<Result<AttemptReceipt, SubmissionError>>>,
    torn_down: bool,
}

impl SessionController {
    /// Loads the node and starts the session. On a load error nothing is
    /// created and no start is reported.
    pub fn load(
        content: &dyn ContentProvider,
        node_id: &str,
        attempts: Arc<dyn AttemptService>,
        progress: Arc<dyn ProgressService>,
        options: SessionOptions,
    ) -> Result<Self, ContentLoadError> {
        let data = content.get_session_data(node_id)?;
        if data.questions.is_empty() {
            return Err(ContentLoadError::Empty(node_id.to_string()));
        }
        let SessionData { node, questions } = data;
        let len = questions.len();

        let mode = options
            .clock
            .unwrap_or_else(|| ClockMode::from_limit(node.time_limit));
        let mut clock = Clock::new(mode);
        let expired = Arc::new(AtomicBool::new(false));
        let flag = expired.clone();
        clock.on_expire(move || flag.store(true, Ordering::SeqCst));

        let mut reporter = LifecycleReporter::new(progress, &node);
        reporter.start();
        clock.start();

        info!(
            "loaded {} ({} questions, clock {})",
            node.id,
            len,
            clock.display()
        );

        Ok(Self {
            store: SessionStore::new(questions, Utc::now()),
            nav: NavigationController::new(len, options.mode, options.band),
            node,
            clock,
            expired,
            reporter,
            attempts,
            dwell: vec![0; len],
            elapsed: 0,
            result: None,
            submission: Submission::NotSubmitted,
            save_rx: None,
            torn_down: false,
        })
    }

    pub fn node(&self) -> &SessionNode {
        &self.node
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn session_id(&self) -> Option<&str> {
        self.reporter.session_id()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.nav.current()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.store.question(self.nav.current())
    }

    pub fn mode(&self) -> NavMode {
        self.nav.mode()
    }

    pub fn is_submitted(&self) -> bool {
        self.store.is_submitted()
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn dwell(&self, idx: usize) -> u64 {
        self.dwell.get(idx).copied().unwrap_or(0)
    }

    pub fn status(&self, idx: usize) -> QuestionStatus {
        match self.store.question(idx) {
            Some(q) => self.store.status(&q.id),
            None => QuestionStatus::Unanswered,
        }
    }

    /// Counts shown on the submit confirmation prompt.
    pub fn confirmation_summary(&self) -> StatusCounts {
        self.store.status_counts()
    }

    pub fn result(&self) -> Option<SessionResult> {
        self.result
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn attempt_id(&self) -> Option<&str> {
        match &self.submission {
            Submission::Saved { attempt_id } => Some(attempt_id.as_str()),
            _ => None,
        }
    }

    /// Record a selection for any question. The answer carries the time
    /// spent on that question so far.
    pub fn select_answer(&mut self, question_id: &str, option_id: Option<&str>) -> bool {
        let Some(idx) = self.store.index_of(question_id) else {
            debug!("ignoring answer for unknown question {}", question_id);
            return false;
        };
        self.store
            .select_answer(question_id, option_id, self.dwell[idx])
    }

    /// Select the option at `option_idx` on the current question.
    pub fn select_current(&mut self, option_idx: usize) -> bool {
        let Some(q) = self.current_question() else {
            return false;
        };
        let Some(option) = q.options.get(option_idx) else {
            return false;
        };
        let (qid, oid) = (q.id.clone(), option.id.clone());
        self.select_answer(&qid, Some(&oid))
    }

    pub fn clear_current(&mut self) -> bool {
        let Some(qid) = self.current_question().map(|q| q.id.clone()) else {
            return false;
        };
        self.select_answer(&qid, None)
    }

    pub fn toggle_flag(&mut self, question_id: &str) -> bool {
        self.store.toggle_flag(question_id)
    }

    pub fn toggle_current_flag(&mut self) -> bool {
        let Some(qid) = self.current_question().map(|q| q.id.clone()) else {
            return false;
        };
        self.toggle_flag(&qid)
    }

    pub fn next(&mut self) -> bool {
        !self.store.is_submitted() && self.nav.next()
    }

    pub fn previous(&mut self) -> bool {
        !self.store.is_submitted() && self.nav.previous()
    }

    pub fn go_to(&mut self, idx: usize) -> bool {
        !self.store.is_submitted() && self.nav.go_to(idx)
    }

    pub fn set_mode(&mut self, mode: NavMode) {
        if self.store.is_submitted() {
            return;
        }
        self.nav.set_mode(mode);
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.nav.mode().toggled());
    }

    pub fn observe_viewport(&mut self, snapshot: &ViewportSnapshot) -> Option<usize> {
        if self.store.is_submitted() {
            return None;
        }
        self.nav.observe(snapshot)
    }

    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.nav.take_scroll_request()
    }

    /// Advance one second. Counts dwell and elapsed time, drives the clock,
    /// and submits automatically once it expires.
    pub fn tick(&mut self) -> Option<ClockEvent> {
        if self.store.is_submitted() || self.torn_down {
            return None;
        }

        self.elapsed += 1;
        if let Some(d) = self.dwell.get_mut(self.nav.current()) {
            *d += 1;
        }
        self.reporter.set_elapsed(self.elapsed);

        let event = self.clock.tick();
        if self.expired.swap(false, Ordering::SeqCst) {
            info!("time is up for {}, submitting", self.node.id);
            self.submit();
        }
        event
    }

    /// Freeze the session, score it and start saving the attempt. Only the
    /// first call does anything.
    pub fn submit(&mut self) -> bool {
        if self.torn_down || !self.store.mark_submitted() {
            debug!("submit ignored for {}", self.node.id);
            return false;
        }
        self.clock.pause();

        let Some(result) = self.store.result() else {
            return false;
        };
        self.result = Some(result);
        let counts = self.store.status_counts();

        self.reporter.complete(
            result.percentage,
            self.elapsed,
            RecordDetails {
                correct: result.correct,
                incorrect: result.incorrect,
                unanswered: result.unanswered,
                flagged: counts.flagged,
                passed: result.passed,
            },
        );

        info!(
            "submitted {}: {}/{} correct ({}%)",
            self.node.id, result.correct, result.total, result.percentage
        );
        self.spawn_save();
        true
    }

    fn spawn_save(&mut self) {
        let submission = AttemptSubmission {
            node_id: self.node.id.clone(),
            answers: self.store.ordered_answers(),
            time_taken_seconds: self.elapsed,
        };
        let service = Arc::clone(&self.attempts);
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("attempt-save".to_string())
            .spawn(move || {
                let _ = tx.send(service.save_attempt(&submission));
            });

        match spawned {
            Ok(_) => {
                self.submission = Submission::Saving;
                self.save_rx = Some(rx);
            }
            Err(e) => self.finish_save(Err(SubmissionError::Io(e))),
        }
    }

    /// Pick up the attempt save outcome if it has arrived.
    pub fn poll_submission(&mut self) -> &Submission {
        let outcome = match &self.save_rx {
            Some(rx) => match rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(mpsc::TryRecvError::Empty) => None,
                Err(mpsc::TryRecvError::Disconnected) => Some(Err(SubmissionError::Rejected(
                    "attempt worker exited".to_string(),
                ))),
            },
            None => None,
        };
        if let Some(outcome) = outcome {
            self.finish_save(outcome);
        }
        &self.submission
    }

    /// Block until the attempt save finishes or `timeout` runs out.
    pub fn wait_for_submission(&mut self, timeout: Duration) -> &Submission {
        let outcome = match &self.save_rx {
            Some(rx) => match rx.recv_timeout(timeout) {
                Ok(outcome) => Some(outcome),
                Err(mpsc::RecvTimeoutError::Timeout) => None,
                Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(
                    SubmissionError::Rejected("attempt worker exited".to_string()),
                )),
            },
            None => None,
        };
        if let Some(outcome) = outcome {
            self.finish_save(outcome);
        }
        &self.submission
    }

    fn finish_save(&mut self, outcome: Result<AttemptReceipt, SubmissionError>) {
        self.save_rx = None;
        self.submission = match outcome {
            Ok(receipt) => {
                if let Some(local) = self.result {
                    if local.percentage != receipt.result.percentage {
                        warn!(
                            "attempt {} graded {}% remotely, {}% locally",
                            receipt.attempt_id, receipt.result.percentage, local.percentage
                        );
                    }
                }
                info!("attempt {} saved", receipt.attempt_id);
                Submission::Saved {
                    attempt_id: receipt.attempt_id,
                }
            }
            Err(e) => {
                error!("cannot save attempt for {}: {}", self.node.id, e);
                Submission::Failed(e.to_string())
            }
        };
    }

    /// End the session. Abandons it if it was never submitted. Safe to call
    /// more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.clock.pause();
        if self.store.is_submitted() {
            if self.submission == Submission::Saving {
                self.wait_for_submission(SAVE_GRACE);
            }
        } else {
            self.reporter.abandon();
        }
        self.torn_down = true;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
