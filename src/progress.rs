use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use log::{debug, info, warn};

use crate::error::ReportError;
use crate::model::*;
use crate::services::ProgressService;

type Job = Box<dyn FnOnce() -> Result<(), ReportError> + Send>;

/// Detached worker for best-effort writes. Failures are logged and dropped;
/// nothing flows back to the caller. Dropping the channel drains the queue
/// and joins the worker.
pub struct SideChannel {
    tx: Option<mpsc::Sender<(&'static str, Job)>>,
    worker: Option<JoinHandle<()>>,
}

impl SideChannel {
    pub fn spawn(name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<(&'static str, Job)>();
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for (label, job) in rx {
                    if let Err(e) = job() {
                        warn!("{} failed: {}", label, e);
                    }
                }
            });

        match spawned {
            Ok(worker) => Self {
                tx: Some(tx),
                worker: Some(worker),
            },
            Err(e) => {
                warn!("cannot start {} worker, writing inline: {}", name, e);
                Self {
                    tx: None,
                    worker: None,
                }
            }
        }
    }

    pub fn send(
        &self,
        label: &'static str,
        job: impl FnOnce() -> Result<(), ReportError> + Send + 'static,
    ) {
        let job: Job = Box::new(job);
        let job = match &self.tx {
            Some(tx) => match tx.send((label, job)) {
                Ok(()) => return,
                Err(mpsc::SendError((_, job))) => job,
            },
            None => job,
        };
        if let Err(e) = job() {
            warn!("{} failed: {}", label, e);
        }
    }
}

impl Drop for SideChannel {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("side channel worker panicked");
            }
        }
    }
}

/// Reports one session's lifecycle to the progress service: a STARTED record
/// at entry, then exactly one of COMPLETED or ABANDONED.
///
/// The session id is taken out of the reporter by whichever terminal report
/// runs first, so the other one finds nothing to report against. Dropping an
/// unfinished reporter abandons the session.
pub struct LifecycleReporter {
    service: Arc<dyn ProgressService>,
    item_type: ItemType,
    item_id: String,
    item_title: String,
    session_id: Option<String>,
    started: bool,
    finished: bool,
    elapsed: u64,
    channel: SideChannel,
}

impl LifecycleReporter {
    pub fn new(service: Arc<dyn ProgressService>, node: &SessionNode) -> Self {
        Self {
            service,
            item_type: node.item_type,
            item_id: node.id.clone(),
            item_title: node.title.clone(),
            session_id: None,
            started: false,
            finished: false,
            elapsed: 0,
            channel: SideChannel::spawn("progress-reporter"),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Only the first call talks to the service. Runs synchronously because
    /// the session id it returns is needed by the terminal report.
    pub fn start(&mut self) {
        if self.started || self.session_id.is_some() {
            return;
        }
        self.started = true;

        match self
            .service
            .start_session(self.item_type, &self.item_id, &self.item_title)
        {
            Ok(id) => {
                info!("session {} started for {}", id, self.item_id);
                self.session_id = Some(id);
            }
            Err(e) => warn!("cannot report start of {}: {}", self.item_id, e),
        }
    }

    /// Seconds elapsed so far, used if the session ends up abandoned.
    pub fn set_elapsed(&mut self, secs: u64) {
        self.elapsed = secs;
    }

    /// Queue the COMPLETED record. Returns false if a terminal report was
    /// already made.
    pub fn complete(&mut self, score: u32, duration: u64, details: RecordDetails) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        self.elapsed = duration;

        let session_id = self.session_id.take();
        info!(
            "session {} completed with {}%",
            session_id.as_deref().unwrap_or("-"),
            score
        );
        let record = self.record(RecordStatus::Completed, Some(score), session_id, Some(details));
        self.dispatch("completion report", record);
        true
    }

    /// Queue the ABANDONED record, but only while a session id is still held.
    pub fn abandon(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let Some(session_id) = self.session_id.take() else {
            debug!("no session id for {}, nothing to abandon", self.item_id);
            return false;
        };
        self.finished = true;

        info!("session {} abandoned after {}s", session_id, self.elapsed);
        let record = self.record(RecordStatus::Abandoned, None, Some(session_id), None);
        self.dispatch("abandon report", record);
        true
    }

    fn record(
        &self,
        status: RecordStatus,
        score: Option<u32>,
        session_id: Option<String>,
        details: Option<RecordDetails>,
    ) -> SessionRecord {
        SessionRecord {
            item_type: self.item_type,
            item_id: self.item_id.clone(),
            item_title: self.item_title.clone(),
            score,
            status,
            session_id,
            duration: self.elapsed,
            details,
            recorded_at: Utc::now(),
        }
    }

    fn dispatch(&self, label: &'static str, record: SessionRecord) {
        let service = Arc::clone(&self.service);
        self.channel.send(label, move || service.save_record(&record));
    }
}

impl Drop for LifecycleReporter {
    fn drop(&mut self) {
        self.abandon();
    }
}
