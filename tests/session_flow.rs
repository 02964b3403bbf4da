use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockall::mock;

use termdrill::controller::{SessionController, SessionOptions, Submission};
use termdrill::error::{ContentLoadError, ReportError, SubmissionError};
use termdrill::model::*;
use termdrill::navigation::{ElementSpan, NavMode, ViewportSnapshot};
use termdrill::services::{AttemptService, DeckDirectory, ProgressService};
use termdrill::timer::{ClockEvent, ClockMode};

mock! {
    pub Attempts {}
    impl AttemptService for Attempts {
        fn save_attempt(&self, submission: &AttemptSubmission) -> Result<AttemptReceipt, SubmissionError>;
    }
}

mock! {
    pub Progress {}
    impl ProgressService for Progress {
        fn start_session(&self, item_type: ItemType, item_id: &str, title: &str) -> Result<String, ReportError>;
        fn save_record(&self, record: &SessionRecord) -> Result<(), ReportError>;
    }
}

/// Records every collaborator call so tests can count them afterwards.
#[derive(Default)]
struct Recorder {
    starts: Mutex<usize>,
    records: Mutex<Vec<SessionRecord>>,
    saves: Mutex<Vec<AttemptSubmission>>,
}

impl Recorder {
    fn statuses(&self) -> Vec<RecordStatus> {
        self.records.lock().unwrap().iter().map(|r| r.status).collect()
    }

    fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

impl AttemptService for Recorder {
    fn save_attempt(&self, submission: &AttemptSubmission) -> Result<AttemptReceipt, SubmissionError> {
        self.saves.lock().unwrap().push(submission.clone());
        Ok(receipt("attempt-1"))
    }
}

impl ProgressService for Recorder {
    fn start_session(&self, _: ItemType, item_id: &str, _: &str) -> Result<String, ReportError> {
        *self.starts.lock().unwrap() += 1;
        Ok(format!("session-{}", item_id))
    }

    fn save_record(&self, record: &SessionRecord) -> Result<(), ReportError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn receipt(id: &str) -> AttemptReceipt {
    AttemptReceipt {
        attempt_id: id.to_string(),
        result: SessionResult {
            total: 0,
            correct: 0,
            incorrect: 0,
            unanswered: 0,
            percentage: 0,
            passed: false,
        },
    }
}

fn fixtures() -> DeckDirectory {
    DeckDirectory::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"))
}

fn load_with(
    deck: &str,
    attempts: Arc<dyn AttemptService>,
    progress: Arc<dyn ProgressService>,
    options: SessionOptions,
) -> SessionController {
    SessionController::load(&fixtures(), deck, attempts, progress, options).unwrap()
}

fn load_recorded(deck: &str, options: SessionOptions) -> (SessionController, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let session = load_with(deck, recorder.clone(), recorder.clone(), options);
    (session, recorder)
}

fn assert_in_bounds(session: &SessionController) {
    assert!(session.current_index() < session.len());
    for qid in session.store().answers().keys() {
        assert!(session.store().index_of(qid).is_some(), "stray answer {}", qid);
    }
}

#[test]
fn six_of_ten_passes_at_sixty_percent() {
    let (mut session, recorder) = load_recorded("n5-vocabulary", SessionOptions::default());
    assert_eq!(session.len(), 10);

    let picks = [
        ("q1", "b"),
        ("q2", "a"),
        ("q3", "c"),
        ("q4", "b"),
        ("q5", "c"),
        ("q6", "b"),
        ("q7", "a"),
        ("q8", "a"),
    ];
    for (qid, oid) in picks {
        assert!(session.select_answer(qid, Some(oid)));
    }
    assert!(session.submit());

    let result = session.result().unwrap();
    assert_eq!(result.correct, 6);
    assert_eq!(result.incorrect, 2);
    assert_eq!(result.unanswered, 2);
    assert_eq!(result.percentage, 60);
    assert!(result.passed);

    session.wait_for_submission(Duration::from_secs(2));
    drop(session);

    let records = recorder.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let completed = &records[0];
    assert_eq!(completed.status, RecordStatus::Completed);
    assert_eq!(completed.score, Some(60));
    assert_eq!(completed.session_id.as_deref(), Some("session-n5-vocabulary"));
    assert_eq!(completed.item_type, ItemType::Exam);
    assert_eq!(completed.details.as_ref().map(|d| d.passed), Some(true));
}

#[test]
fn clock_running_out_submits_once() {
    let options = SessionOptions {
        clock: Some(ClockMode::Limited(300)),
        ..SessionOptions::default()
    };
    let (mut session, recorder) = load_recorded("kana-drill", options);

    for _ in 0..299 {
        session.tick();
        assert!(!session.is_submitted());
    }
    assert_eq!(session.tick(), Some(ClockEvent::Expired));
    assert!(session.is_submitted());
    assert!(session.clock().has_expired());

    for _ in 0..10 {
        assert_eq!(session.tick(), None);
    }
    assert_eq!(session.elapsed(), 300);
    assert_eq!(session.clock().remaining(), 0);

    session.wait_for_submission(Duration::from_secs(2));
    drop(session);

    assert_eq!(recorder.save_count(), 1);
    assert_eq!(recorder.saves.lock().unwrap()[0].time_taken_seconds, 300);
    assert_eq!(recorder.statuses(), vec![RecordStatus::Completed]);
}

#[test]
fn flagged_answer_stays_flagged() {
    let (mut session, _recorder) = load_recorded("n5-vocabulary", SessionOptions::default());
    assert!(session.toggle_flag("q3"));
    assert!(session.select_answer("q3", Some("c")));

    assert_eq!(session.status(2), QuestionStatus::Flagged);
    let counts = session.confirmation_summary();
    assert_eq!(counts.flagged, 1);
    assert_eq!(counts.answered, 0);
    assert_eq!(counts.unanswered, 9);
}

#[test]
fn teardown_without_answers_abandons_once() {
    let mut attempts = MockAttempts::new();
    attempts.expect_save_attempt().never();

    let mut progress = MockProgress::new();
    progress
        .expect_start_session()
        .times(1)
        .returning(|_, _, _| Ok("sid-7".to_string()));
    progress
        .expect_save_record()
        .withf(|r| r.status == RecordStatus::Abandoned && r.session_id.as_deref() == Some("sid-7"))
        .times(1)
        .returning(|_| Ok(()));
    progress
        .expect_save_record()
        .withf(|r| r.status != RecordStatus::Abandoned)
        .never();

    let mut session = load_with(
        "kana-drill",
        Arc::new(attempts),
        Arc::new(progress),
        SessionOptions::default(),
    );
    session.tick();
    session.tick();
    session.teardown();
    session.teardown();
    drop(session);
}

#[test]
fn double_submit_saves_once() {
    let mut attempts = MockAttempts::new();
    attempts
        .expect_save_attempt()
        .withf(|s| s.node_id == "kana-drill" && s.answers.len() == 1)
        .times(1)
        .returning(|_| Ok(receipt("attempt-9")));

    let mut progress = MockProgress::new();
    progress
        .expect_start_session()
        .times(1)
        .returning(|_, _, _| Ok("sid-9".to_string()));
    progress
        .expect_save_record()
        .withf(|r| r.status == RecordStatus::Completed)
        .times(1)
        .returning(|_| Ok(()));
    progress
        .expect_save_record()
        .withf(|r| r.status == RecordStatus::Abandoned)
        .never();

    let mut session = load_with(
        "kana-drill",
        Arc::new(attempts),
        Arc::new(progress),
        SessionOptions::default(),
    );
    session.select_current(0);
    assert!(session.submit());
    assert!(!session.submit());

    let outcome = session.wait_for_submission(Duration::from_secs(2)).clone();
    assert_eq!(
        outcome,
        Submission::Saved {
            attempt_id: "attempt-9".to_string()
        }
    );
    drop(session);
}

#[test]
fn mode_switch_keeps_current_index() {
    let (mut session, _recorder) = load_recorded("n5-vocabulary", SessionOptions::default());
    session.go_to(4);
    session.set_mode(NavMode::Continuous);
    assert_eq!(session.current_index(), 4);
    session.toggle_mode();
    assert_eq!(session.mode(), NavMode::Focused);
    assert_eq!(session.current_index(), 4);
    assert_in_bounds(&session);
}

#[test]
fn viewport_observation_moves_current_question() {
    let options = SessionOptions {
        mode: NavMode::Continuous,
        ..SessionOptions::default()
    };
    let (mut session, _recorder) = load_recorded("kana-drill", options);
    let elements: Vec<ElementSpan> = (0..3)
        .map(|index| ElementSpan {
            index,
            top: index * 10,
            bottom: index * 10 + 10,
        })
        .collect();

    let snapshot = ViewportSnapshot {
        // band covers rows 29..31, inside question 3
        scroll_top: 25,
        height: 20,
        elements: elements.clone(),
    };
    assert_eq!(session.observe_viewport(&snapshot), Some(2));
    assert_eq!(session.current_index(), 2);

    session.submit();
    let back = ViewportSnapshot {
        scroll_top: 0,
        height: 20,
        elements,
    };
    assert_eq!(session.observe_viewport(&back), None);
    assert_eq!(session.current_index(), 2);
}

#[test]
fn navigation_clamps_and_ignores_strays() {
    let (mut session, _recorder) = load_recorded("kana-drill", SessionOptions::default());
    assert!(!session.previous());
    assert!(session.go_to(2));
    assert!(!session.next());
    assert!(!session.go_to(3));
    assert_eq!(session.current_index(), 2);

    assert!(!session.select_answer("q99", Some("a")));
    assert!(!session.select_answer("q1", Some("z")));
    assert!(session.select_answer("q1", Some("a")));
    assert!(session.select_answer("q1", Some("b")));
    assert_eq!(session.store().selected_option("q1"), Some("b"));
    assert_in_bounds(&session);
}

#[test]
fn answers_are_frozen_after_submit() {
    let (mut session, recorder) = load_recorded("kana-drill", SessionOptions::default());
    session.select_answer("q1", Some("a"));
    session.submit();
    assert!(!session.select_answer("q1", Some("b")));
    assert!(!session.toggle_flag("q2"));
    assert_eq!(session.result().unwrap().correct, 1);

    session.teardown();
    drop(session);
    assert_eq!(recorder.save_count(), 1);
    assert_eq!(recorder.statuses(), vec![RecordStatus::Completed]);
}

#[test]
fn failed_start_skips_abandon_but_still_completes() {
    let mut progress = MockProgress::new();
    progress
        .expect_start_session()
        .times(2)
        .returning(|_, _, _| Err(ReportError::Unavailable("offline".to_string())));
    progress
        .expect_save_record()
        .withf(|r| r.status == RecordStatus::Completed && r.session_id.is_none())
        .times(1)
        .returning(|_| Ok(()));
    progress
        .expect_save_record()
        .withf(|r| r.status == RecordStatus::Abandoned)
        .never();
    let progress = Arc::new(progress);

    let recorder = Arc::new(Recorder::default());
    let abandoned = load_with("kana-drill", recorder.clone(), progress.clone(), SessionOptions::default());
    assert_eq!(abandoned.session_id(), None);
    drop(abandoned);

    let mut submitted = load_with("kana-drill", recorder.clone(), progress, SessionOptions::default());
    submitted.submit();
    submitted.wait_for_submission(Duration::from_secs(2));
    drop(submitted);
    assert_eq!(recorder.save_count(), 1);
}

#[test]
fn failed_save_is_reported_locally() {
    let mut attempts = MockAttempts::new();
    attempts
        .expect_save_attempt()
        .times(1)
        .returning(|_| Err(SubmissionError::Rejected("server said no".to_string())));
    let recorder = Arc::new(Recorder::default());

    let mut session = load_with(
        "kana-drill",
        Arc::new(attempts),
        recorder.clone(),
        SessionOptions::default(),
    );
    session.select_answer("q2", Some("b"));
    session.submit();

    let outcome = session.wait_for_submission(Duration::from_secs(2)).clone();
    assert!(matches!(outcome, Submission::Failed(_)));
    assert_eq!(session.result().unwrap().percentage, 33);
    assert_eq!(session.attempt_id(), None);
    drop(session);
    assert_eq!(recorder.statuses(), vec![RecordStatus::Completed]);
}

#[test]
fn unloadable_decks_report_nothing() {
    let recorder = Arc::new(Recorder::default());
    for (deck, private_or_missing) in [("draft-n4", true), ("missing", true), ("empty", false)] {
        let loaded = SessionController::load(
            &fixtures(),
            deck,
            recorder.clone(),
            recorder.clone(),
            SessionOptions::default(),
        );
        match loaded {
            Err(ContentLoadError::NotFound(_)) => assert!(private_or_missing),
            Err(ContentLoadError::Empty(_)) => assert!(!private_or_missing),
            Err(e) => panic!("unexpected error for {}: {}", deck, e),
            Ok(_) => panic!("{} should not load", deck),
        }
    }
    assert_eq!(*recorder.starts.lock().unwrap(), 0);
    assert!(recorder.records.lock().unwrap().is_empty());
}

#[test]
fn sessions_keep_their_own_ids() {
    let (first, recorder) = load_recorded("kana-drill", SessionOptions::default());
    let second = load_with(
        "n5-vocabulary",
        recorder.clone(),
        recorder.clone(),
        SessionOptions::default(),
    );
    assert_eq!(first.session_id(), Some("session-kana-drill"));
    assert_eq!(second.session_id(), Some("session-n5-vocabulary"));

    drop(second);
    drop(first);
    let records = recorder.records.lock().unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.session_id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            Some("session-n5-vocabulary".to_string()),
            Some("session-kana-drill".to_string())
        ]
    );
}
