use contractflow::core::document::{Document, SessionContext};
use contractflow::core::jobs::{Job, JobQueue, JobScheduler, JobState};
use contractflow::core::notification::{
    ApprovalPayload, DispatchOutcome, NotificationDispatcher, ReqwestTransport, NOTIFY_CATEGORY,
};
use contractflow::core::repository::{DocumentRepository, InMemoryRepository};
use contractflow::core::types::PROP_CONTRACT_STATUS;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn approved_contract(repository: &InMemoryRepository, document: Document) -> Document {
    repository
        .create(
            &SessionContext::system(),
            document.with_field(PROP_CONTRACT_STATUS, "Approved"),
        )
        .await
        .unwrap()
}

fn dispatcher(repository: Arc<InMemoryRepository>, url: String) -> NotificationDispatcher {
    NotificationDispatcher::new(
        repository,
        Arc::new(ReqwestTransport::new(Some(Duration::from_secs(5)))),
        url,
        PROP_CONTRACT_STATUS,
    )
}

#[tokio::test]
async fn test_webhook_receives_approval_payload() {
    let server = MockServer::start().await;
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(
        &repository,
        Document::new("Contract", "/contracts/q1", "[SUBMITTED] Q1 Deal"),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/approved"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "id": doc.id,
            "title": "[SUBMITTED] Q1 Deal",
            "path": "/contracts/q1",
            "status": "Approved"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = dispatcher(repository, format!("{}/approved", server.uri()))
        .dispatch("default", &doc.id)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Delivered(200));
}

#[tokio::test]
async fn test_server_error_is_swallowed_by_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(&repository, Document::new("Contract", "/contracts/a", "A")).await;
    let dispatcher = dispatcher(repository, server.uri());

    let outcome = dispatcher.dispatch("default", &doc.id).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Failed(ref msg) if msg.contains("500")));

    let job = dispatcher.job("default", &doc.id);
    assert!(job.run().await.is_ok());
}

#[tokio::test]
async fn test_failed_delivery_still_completes_the_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(&repository, Document::new("Contract", "/contracts/a", "A")).await;
    let dispatcher = dispatcher(repository, server.uri());
    let queue = JobQueue::start();

    let job = dispatcher.job("default", &doc.id);
    let key = job.id().to_string();
    queue.schedule(Arc::new(job)).unwrap();
    queue.drain().await;

    let record = queue.record(&key).unwrap();
    assert_eq!(record.state, JobState::Completed);
    assert_eq!(record.last_error, None);
}

#[tokio::test]
async fn test_slow_webhook_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(&repository, Document::new("Contract", "/contracts/a", "A")).await;
    let dispatcher = NotificationDispatcher::new(
        repository,
        Arc::new(ReqwestTransport::new(Some(Duration::from_millis(200)))),
        server.uri(),
        PROP_CONTRACT_STATUS,
    );

    let outcome = dispatcher.dispatch("default", &doc.id).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Failed(_)));
}

#[tokio::test]
async fn test_unreachable_webhook_is_reported() {
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(&repository, Document::new("Contract", "/contracts/a", "A")).await;
    let outcome = dispatcher(repository, "http://127.0.0.1:9/approved".to_string())
        .dispatch("default", &doc.id)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DispatchOutcome::Failed(ref msg) if msg.starts_with("Network error")
    ));
}

#[tokio::test]
async fn test_disabled_webhook_skips_delivery() {
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(&repository, Document::new("Contract", "/contracts/a", "A")).await;
    let dispatcher = dispatcher(repository, "  ".to_string());
    assert!(!dispatcher.webhook_enabled());

    let outcome = dispatcher.dispatch("default", &doc.id).await.unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Skipped(ApprovalPayload {
            id: doc.id.clone(),
            title: "A".to_string(),
            path: "/contracts/a".to_string(),
            status: "Approved".to_string(),
        })
    );
}

#[tokio::test]
async fn test_deleted_document_is_not_posted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let repository = Arc::new(InMemoryRepository::new("default"));

    let outcome = dispatcher(repository, server.uri())
        .dispatch("default", "gone")
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::DocumentMissing);
}

#[tokio::test]
async fn test_restricted_document_is_read_with_system_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let repository = Arc::new(InMemoryRepository::new("default"));
    let doc = approved_contract(
        &repository,
        Document::new("Contract", "/contracts/secret", "Secret").with_readers(["legal"]),
    )
    .await;
    assert!(repository
        .get_by_id(&SessionContext::user("alice"), &doc.id)
        .await
        .unwrap()
        .is_none());

    let outcome = dispatcher(repository, server.uri())
        .dispatch("default", &doc.id)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Delivered(204));
}

#[test]
fn test_job_identity() {
    let repository = Arc::new(InMemoryRepository::new("default"));
    let job = dispatcher(repository, String::new()).job("default", "abc-123");
    assert_eq!(job.id(), "notify-approval:default:abc-123");
    assert_eq!(job.category(), NOTIFY_CATEGORY);
    assert_eq!(job.repository(), "default");
    assert_eq!(job.document_id(), "abc-123");
}
