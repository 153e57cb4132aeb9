use contractflow::core::config::ContractConfig;
use contractflow::core::document::{Document, DocumentHandle, SessionContext};
use contractflow::core::error::{AppError, CODE_VETOED};
use contractflow::core::events::{Commit, DocumentEventKind, EventBus};
use contractflow::core::jobs::{Job, JobScheduler, ScheduleOutcome};
use contractflow::core::listeners::{
    register_contract_listeners, ContractDefaultsListener, ContractValidationListener,
};
use contractflow::core::notification::{NotificationDispatcher, ReqwestTransport, NOTIFY_CATEGORY};
use contractflow::core::repository::InMemoryRepository;
use contractflow::core::session::CoreSession;
use contractflow::core::types::{ErrorCategory, PROP_CONTRACT_STATUS};
use std::sync::{Arc, Mutex};

/// Scheduler that only records what it was asked to run.
#[derive(Default)]
struct RecordingScheduler {
    scheduled: Mutex<Vec<(String, String)>>,
}

impl RecordingScheduler {
    fn ids(&self) -> Vec<String> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl JobScheduler for RecordingScheduler {
    fn schedule(&self, job: Arc<dyn Job>) -> Result<ScheduleOutcome, AppError> {
        self.scheduled
            .lock()
            .unwrap()
            .push((job.id().to_string(), job.category().to_string()));
        Ok(ScheduleOutcome::Scheduled)
    }
}

/// Contract handle whose status read fails with the given category.
struct UnreadableStatus(ErrorCategory);

impl DocumentHandle for UnreadableStatus {
    fn doc_type(&self) -> &str {
        "Contract"
    }

    fn title(&self) -> Option<&str> {
        Some("Q1 Deal")
    }

    fn path(&self) -> Option<&str> {
        Some("/contracts/q1")
    }

    fn read_field(&self, field: &str) -> Result<Option<String>, AppError> {
        match self.0 {
            ErrorCategory::FieldNotFound => Err(AppError::field_not_found(field)),
            category => Err(AppError::new(category, "storage offline")),
        }
    }
}

struct Harness {
    repository: Arc<InMemoryRepository>,
    scheduler: Arc<RecordingScheduler>,
    events: EventBus,
}

impl Harness {
    fn new() -> Self {
        let repository = Arc::new(InMemoryRepository::new("default"));
        let scheduler = Arc::new(RecordingScheduler::default());
        let dispatcher = NotificationDispatcher::new(
            repository.clone(),
            Arc::new(ReqwestTransport::default()),
            "",
            PROP_CONTRACT_STATUS,
        );
        let mut builder = EventBus::builder();
        register_contract_listeners(
            &mut builder,
            &ContractConfig::default(),
            scheduler.clone(),
            dispatcher,
        );
        Self {
            repository,
            scheduler,
            events: builder.build(),
        }
    }

    fn session(&self) -> CoreSession {
        CoreSession::new(
            self.repository.clone(),
            self.events.clone(),
            SessionContext::user("alice"),
        )
    }
}

#[test]
fn test_listener_registration_order() {
    let harness = Harness::new();
    assert_eq!(
        harness.events.pre_commit_listeners(DocumentEventKind::DocumentCreated),
        vec![ContractValidationListener::NAME, ContractDefaultsListener::NAME]
    );
    assert_eq!(
        harness.events.pre_commit_listeners(DocumentEventKind::DocumentModified),
        vec![ContractValidationListener::NAME]
    );
    assert_eq!(
        harness.events.post_commit_listeners(DocumentEventKind::DocumentUpdated),
        vec!["approvalNotification"]
    );
}

#[tokio::test]
async fn test_creation_seeds_draft_and_prefix() {
    let harness = Harness::new();
    let session = harness.session();

    let created = session
        .create_document(
            Document::new("Contract", "/contracts/q1", "Q1 Deal")
                .with_empty_field(PROP_CONTRACT_STATUS),
        )
        .await
        .unwrap();

    assert_eq!(created.title(), Some("[CONTRACT] Q1 Deal"));
    assert_eq!(
        created.read_field(PROP_CONTRACT_STATUS).unwrap().as_deref(),
        Some("Draft")
    );
    let stored = session.get_document(&created.id).await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn test_creation_overrides_preset_status() {
    let harness = Harness::new();
    let created = harness
        .session()
        .create_document(
            Document::new("Contract", "/contracts/q1", "[CONTRACT] Q1")
                .with_field(PROP_CONTRACT_STATUS, "Approved"),
        )
        .await
        .unwrap();

    assert_eq!(created.title(), Some("[CONTRACT] Q1"));
    assert_eq!(
        created.read_field(PROP_CONTRACT_STATUS).unwrap().as_deref(),
        Some("Draft")
    );
}

#[tokio::test]
async fn test_creation_without_status_field_only_prefixes() {
    let harness = Harness::new();
    let created = harness
        .session()
        .create_document(Document::new("Contract", "/contracts/q1", "Q1"))
        .await
        .unwrap();

    assert_eq!(created.title(), Some("[CONTRACT] Q1"));
    assert!(created
        .read_field(PROP_CONTRACT_STATUS)
        .unwrap_err()
        .is_field_not_found());
}

#[tokio::test]
async fn test_creation_skips_proxies_and_other_types() {
    let harness = Harness::new();
    let session = harness.session();

    let proxy = session
        .create_document(
            Document::new("Contract", "/contracts/p", "P")
                .with_field(PROP_CONTRACT_STATUS, "Approved")
                .as_proxy(),
        )
        .await
        .unwrap();
    let note = session
        .create_document(Document::new("Note", "/notes/n", ""))
        .await
        .unwrap();

    assert_eq!(proxy.title(), Some("P"));
    assert_eq!(
        proxy.read_field(PROP_CONTRACT_STATUS).unwrap().as_deref(),
        Some("Approved")
    );
    assert_eq!(note.title(), Some(""));
}

#[tokio::test]
async fn test_blank_title_is_vetoed_before_storage() {
    let harness = Harness::new();
    let session = harness.session();

    let err = session
        .create_document(
            Document::new("Contract", "/contracts/blank", "   ")
                .with_empty_field(PROP_CONTRACT_STATUS),
        )
        .await
        .unwrap_err();

    assert_eq!(err.category, ErrorCategory::Vetoed);
    assert_eq!(err.code, CODE_VETOED);
    assert_eq!(
        err.context.get("listener").map(String::as_str),
        Some(ContractValidationListener::NAME)
    );
    assert!(session.query("/", false).await.unwrap().is_empty());
    assert_eq!(session.pending_events().await, 0);
}

#[tokio::test]
async fn test_blanking_title_on_save_is_vetoed() {
    let harness = Harness::new();
    let session = harness.session();
    let mut doc = session
        .create_document(Document::new("Contract", "/contracts/q1", "Q1"))
        .await
        .unwrap();

    doc.title = None;
    let err = session.save_document(doc.clone()).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Vetoed);
    assert_eq!(harness.repository.save_count(), 0);
    let stored = session.get_document(&doc.id).await.unwrap();
    assert_eq!(stored.title(), Some("[CONTRACT] Q1"));
}

#[tokio::test]
async fn test_approved_save_schedules_notification_after_commit() {
    let harness = Harness::new();
    let session = harness.session();
    let mut doc = session
        .create_document(
            Document::new("Contract", "/contracts/q1", "Q1").with_empty_field(PROP_CONTRACT_STATUS),
        )
        .await
        .unwrap();

    doc.write_field(PROP_CONTRACT_STATUS, "Approved").unwrap();
    let saved = session.save_document(doc).await.unwrap();
    session.flush_post_commit().await;
    assert!(harness.scheduler.ids().is_empty(), "nothing fires before commit");

    session.commit().await.unwrap();
    session.flush_post_commit().await;

    let scheduled = harness.scheduler.scheduled.lock().unwrap().clone();
    assert_eq!(
        scheduled,
        vec![(
            format!("notify-approval:default:{}", saved.id),
            NOTIFY_CATEGORY.to_string()
        )]
    );
}

#[tokio::test]
async fn test_non_approved_saves_do_not_schedule() {
    let harness = Harness::new();
    let session = harness.session();
    let mut doc = session
        .create_document(
            Document::new("Contract", "/contracts/q1", "Q1").with_empty_field(PROP_CONTRACT_STATUS),
        )
        .await
        .unwrap();
    let mut note = session
        .create_document(
            Document::new("Note", "/notes/n", "N").with_empty_field(PROP_CONTRACT_STATUS),
        )
        .await
        .unwrap();

    for status in ["In Review", "Rejected", "approved"] {
        doc.write_field(PROP_CONTRACT_STATUS, status).unwrap();
        doc = session.save_document(doc).await.unwrap();
    }
    note.write_field(PROP_CONTRACT_STATUS, "Approved").unwrap();
    session.save_document(note).await.unwrap();
    session.commit().await.unwrap();
    session.flush_post_commit().await;

    assert!(harness.scheduler.ids().is_empty());
}

#[tokio::test]
async fn test_creation_events_never_schedule() {
    let harness = Harness::new();
    let session = harness.session();
    session
        .create_document(
            Document::new("Contract", "/contracts/q1", "Q1")
                .with_field(PROP_CONTRACT_STATUS, "Approved"),
        )
        .await
        .unwrap();
    session.commit().await.unwrap();
    session.flush_post_commit().await;

    assert!(harness.scheduler.ids().is_empty());
}

#[test]
fn test_unreadable_status_is_vetoed() {
    let listener = ContractValidationListener::new(&ContractConfig::default());

    let veto = listener
        .validate(&UnreadableStatus(ErrorCategory::PersistenceError))
        .unwrap_err();
    assert_eq!(veto.listener, ContractValidationListener::NAME);
    assert!(veto.reason.contains("storage offline"));

    let err: AppError = veto.into();
    assert_eq!(err.category, ErrorCategory::Vetoed);
}

#[test]
fn test_missing_status_field_passes_validation() {
    let listener = ContractValidationListener::new(&ContractConfig::default());
    assert_eq!(
        listener.validate(&UnreadableStatus(ErrorCategory::FieldNotFound)),
        Ok(Commit::Unchanged)
    );
}
