use async_trait::async_trait;
use contractflow::core::error::AppError;
use contractflow::core::jobs::{Job, JobQueue, JobScheduler, JobState, ScheduleOutcome};
use contractflow::core::types::ErrorCategory;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

struct CountingJob {
    id: String,
    runs: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
    fail: bool,
}

impl CountingJob {
    fn new(id: &str, runs: Arc<AtomicUsize>) -> Self {
        Self {
            id: id.to_string(),
            runs,
            gate: None,
            fail: false,
        }
    }
}

#[async_trait]
impl Job for CountingJob {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        "test"
    }

    async fn run(&self) -> Result<(), AppError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::new(ErrorCategory::InternalError, "boom"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_scheduled_job_runs_and_completes() {
    let queue = JobQueue::start();
    let runs = Arc::new(AtomicUsize::new(0));

    let outcome = queue
        .schedule(Arc::new(CountingJob::new("job-1", runs.clone())))
        .unwrap();
    assert_eq!(outcome, ScheduleOutcome::Scheduled);

    queue.drain().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let record = queue.record("job-1").unwrap();
    assert_eq!(record.state, JobState::Completed);
    assert_eq!(record.category, "test");
    assert_eq!(record.runs, 1);
    assert!(record.finished_at.is_some());
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn test_duplicate_pending_id_is_coalesced() {
    let queue = JobQueue::start();
    let runs = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Semaphore::new(0));

    // Holds the worker so that the next two schedules find "second" still waiting.
    let mut blocker = CountingJob::new("blocker", Arc::new(AtomicUsize::new(0)));
    blocker.gate = Some(gate.clone());
    queue.schedule(Arc::new(blocker)).unwrap();

    let first = queue
        .schedule(Arc::new(CountingJob::new("second", runs.clone())))
        .unwrap();
    let again = queue
        .schedule(Arc::new(CountingJob::new("second", runs.clone())))
        .unwrap();
    assert_eq!(first, ScheduleOutcome::Scheduled);
    assert_eq!(again, ScheduleOutcome::Coalesced);

    gate.add_permits(1);
    queue.drain().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_finished_id_can_run_again() {
    let queue = JobQueue::start();
    let runs = Arc::new(AtomicUsize::new(0));

    queue
        .schedule(Arc::new(CountingJob::new("repeat", runs.clone())))
        .unwrap();
    queue.drain().await;
    let outcome = queue
        .schedule(Arc::new(CountingJob::new("repeat", runs.clone())))
        .unwrap();
    queue.drain().await;

    assert_eq!(outcome, ScheduleOutcome::Scheduled);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(queue.record("repeat").unwrap().runs, 2);
}

#[tokio::test]
async fn test_failed_job_is_recorded() {
    let queue = JobQueue::start();
    let mut job = CountingJob::new("failing", Arc::new(AtomicUsize::new(0)));
    job.fail = true;
    queue.schedule(Arc::new(job)).unwrap();
    queue.drain().await;

    let record = queue.record("failing").unwrap();
    assert_eq!(record.state, JobState::Failed);
    assert!(record.last_error.unwrap().contains("boom"));
}

#[tokio::test]
async fn test_drain_without_jobs_returns() {
    let queue = JobQueue::start();
    queue.drain().await;
    assert!(queue.records().is_empty());
}
