#![allow(clippy::result_large_err)] // Session operations return AppError for consistent diagnostics.

use crate::core::document::{Document, SessionContext};
use crate::core::error::AppError;
use crate::core::events::{DocumentEvent, DocumentEventKind, EventBus};
use crate::core::repository::DocumentRepository;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A unit of work against the repository on behalf of one principal.
///
/// Pre-commit listeners run inline in `create_document`/`save_document` and can veto the
/// write. Post-commit events are buffered and delivered on `commit`.
pub struct CoreSession {
    repository: Arc<dyn DocumentRepository>,
    events: EventBus,
    context: SessionContext,
    pending: Mutex<Vec<DocumentEvent>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl CoreSession {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        events: EventBus,
        context: SessionContext,
    ) -> Self {
        Self {
            repository,
            events,
            context,
            pending: Mutex::new(Vec::new()),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn repository_name(&self) -> &str {
        self.repository.name()
    }

    pub async fn create_document(&self, document: Document) -> Result<Document, AppError> {
        let mut event = DocumentEvent::new(
            DocumentEventKind::DocumentCreated,
            document,
            self.context.clone(),
        );
        self.events.fire_pre_commit(&mut event)?;
        let created = self.repository.create(&self.context, event.document).await?;
        self.enqueue(DocumentEventKind::DocumentCreated, &created).await;
        Ok(created)
    }

    pub async fn save_document(&self, document: Document) -> Result<Document, AppError> {
        let mut event = DocumentEvent::new(
            DocumentEventKind::DocumentModified,
            document,
            self.context.clone(),
        );
        self.events.fire_pre_commit(&mut event)?;
        let saved = self.repository.save(&self.context, event.document).await?;
        self.enqueue(DocumentEventKind::DocumentUpdated, &saved).await;
        Ok(saved)
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, AppError> {
        self.repository
            .get_by_id(&self.context, id)
            .await?
            .ok_or_else(|| AppError::document_not_found(id))
    }

    pub async fn query(
        &self,
        path_prefix: &str,
        exclude_proxies: bool,
    ) -> Result<Vec<Document>, AppError> {
        self.repository
            .query(&self.context, path_prefix, exclude_proxies)
            .await
    }

    /// Commit the repository, then hand buffered events to post-commit listeners.
    pub async fn commit(&self) -> Result<(), AppError> {
        self.repository.commit(&self.context).await?;
        let events: Vec<DocumentEvent> = std::mem::take(&mut *self.pending.lock().await);
        let mut handles = Vec::new();
        for event in events {
            handles.extend(self.events.fire_post_commit(event));
        }
        self.in_flight.lock().await.extend(handles);
        Ok(())
    }

    /// Wait until every post-commit listener spawned so far has returned.
    pub async fn flush_post_commit(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.in_flight.lock().await);
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "post-commit listener task aborted");
            }
        }
    }

    pub async fn pending_events(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn enqueue(&self, kind: DocumentEventKind, document: &Document) {
        self.pending.lock().await.push(DocumentEvent::new(
            kind,
            document.clone(),
            self.context.clone(),
        ));
    }
}
