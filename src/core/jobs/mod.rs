#![allow(clippy::result_large_err)] // Job trait returns AppError directly for structured diagnostics.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Unit of background work with a stable identity.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Stable key; scheduling two jobs with the same id targets the same logical job.
    fn id(&self) -> &str;

    fn category(&self) -> &str;

    async fn run(&self) -> Result<(), AppError>;
}

/// Job queue collaborator.
pub trait JobScheduler: Send + Sync {
    fn schedule(&self, job: Arc<dyn Job>) -> Result<ScheduleOutcome, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScheduleOutcome {
    Scheduled,
    /// A job with the same id was already waiting to run.
    Coalesced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Scheduled,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub category: String,
    pub state: JobState,
    pub runs: u32,
    pub scheduled_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// In-process job queue executing jobs on a single tokio worker.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Arc<dyn Job>>,
    records: Arc<DashMap<String, JobRecord>>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl JobQueue {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            tx,
            records: Arc::new(DashMap::new()),
            pending: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        };
        let worker = queue.clone_state();
        tokio::spawn(async move {
            worker.run(rx).await;
        });
        queue
    }

    pub fn record(&self, id: &str) -> Option<JobRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    pub fn records(&self) -> Vec<JobRecord> {
        let mut out: Vec<JobRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        out
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until no scheduled job is left to run.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn clone_state(&self) -> Worker {
        Worker {
            records: self.records.clone(),
            pending: self.pending.clone(),
            idle: self.idle.clone(),
        }
    }
}

impl JobScheduler for JobQueue {
    fn schedule(&self, job: Arc<dyn Job>) -> Result<ScheduleOutcome, AppError> {
        let id = job.id().to_string();
        let record = JobRecord {
            id: id.clone(),
            category: job.category().to_string(),
            state: JobState::Scheduled,
            runs: 0,
            scheduled_at: Utc::now(),
            finished_at: None,
            last_error: None,
        };
        match self.records.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().state == JobState::Scheduled {
                    tracing::debug!(job_id = %id, "job already scheduled; coalescing");
                    return Ok(ScheduleOutcome::Coalesced);
                }
                let runs = entry.get().runs;
                entry.insert(JobRecord { runs, ..record });
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.tx.send(job).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            AppError::new(ErrorCategory::InternalError, "job queue worker has stopped")
                .with_context("job_id", id.as_str())
        })?;
        tracing::debug!(job_id = %id, "job scheduled");
        Ok(ScheduleOutcome::Scheduled)
    }
}

struct Worker {
    records: Arc<DashMap<String, JobRecord>>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Arc<dyn Job>>) {
        while let Some(job) = rx.recv().await {
            let id = job.id().to_string();
            self.update(&id, |record| {
                record.state = JobState::Running;
                record.runs += 1;
            });
            let result = job.run().await;
            self.update(&id, |record| {
                record.finished_at = Some(Utc::now());
                match &result {
                    Ok(()) => {
                        record.state = JobState::Completed;
                        record.last_error = None;
                    }
                    Err(err) => {
                        record.state = JobState::Failed;
                        record.last_error = Some(err.to_string());
                    }
                }
            });
            if let Err(err) = result {
                tracing::error!(
                    job_id = %id,
                    category = job.category(),
                    error = %err,
                    "job failed"
                );
            }
            if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                self.idle.notify_waiters();
            }
        }
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut JobRecord)) {
        if let Some(mut record) = self.records.get_mut(id) {
            apply(record.value_mut());
        }
    }
}
