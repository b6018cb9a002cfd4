use crate::downloader::{ClientError, DownloadClient, JobState, JobStatus};
use crate::indexer::{CandidateRelease, ReleaseProtocol};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

enum PollScript {
    Status(JobStatus),
    Missing,
    Error(String),
}

/// Scriptable download client for tests.
pub struct MockDownloadClient {
    id: String,
    protocol: ReleaseProtocol,
    priority: u8,
    healthy: AtomicBool,
    poll: Mutex<PollScript>,
    submissions: Mutex<Vec<String>>,
    submit_counter: AtomicU32,
    fail_submit: AtomicBool,
    cancelled: AtomicBool,
}

impl MockDownloadClient {
    pub fn new(id: &str, protocol: ReleaseProtocol, priority: u8) -> Self {
        Self {
            id: id.to_string(),
            protocol,
            priority,
            healthy: AtomicBool::new(true),
            poll: Mutex::new(PollScript::Status(JobStatus {
                state: JobState::Downloading,
                progress: 0.0,
                path: None,
                error: None,
            })),
            submissions: Mutex::new(Vec::new()),
            submit_counter: AtomicU32::new(0),
            fail_submit: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Subsequent polls report this status for every job.
    pub fn set_poll(&self, status: JobStatus) {
        *self.poll.lock().unwrap() = PollScript::Status(status);
    }

    /// Subsequent polls report the job as gone.
    pub fn set_poll_missing(&self) {
        *self.poll.lock().unwrap() = PollScript::Missing;
    }

    /// Subsequent polls fail with a request error.
    pub fn set_poll_error(&self, message: &str) {
        *self.poll.lock().unwrap() = PollScript::Error(message.to_string());
    }

    pub fn fail_submit(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    /// Titles submitted so far, in order.
    pub fn submitted(&self) -> Vec<String> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadClient for MockDownloadClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn protocol(&self) -> ReleaseProtocol {
        self.protocol
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn submit(&self, release: &CandidateRelease) -> Result<String, ClientError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ClientError::Submit("scripted submit failure".to_string()));
        }
        self.submissions.lock().unwrap().push(release.title.clone());
        let n = self.submit_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-job-{n}", self.id))
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        match &*self.poll.lock().unwrap() {
            PollScript::Status(status) => Ok(status.clone()),
            PollScript::Missing => Err(ClientError::JobNotFound(job_id.to_string())),
            PollScript::Error(message) => Err(ClientError::Request(message.clone())),
        }
    }

    async fn cancel(&self, _job_id: &str) -> Result<(), ClientError> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}
