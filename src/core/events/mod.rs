#![allow(clippy::result_large_err)] // Post-commit listeners return AppError directly for structured diagnostics.

use crate::core::document::{Document, SessionContext};
use crate::core::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Document lifecycle events delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentEventKind {
    /// A document is being created (pre-commit) or was created (post-commit).
    DocumentCreated,
    /// An existing document is about to be written.
    DocumentModified,
    /// An existing document was written and the transaction committed.
    DocumentUpdated,
}

impl DocumentEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentEventKind::DocumentCreated => "documentCreated",
            DocumentEventKind::DocumentModified => "documentModified",
            DocumentEventKind::DocumentUpdated => "documentUpdated",
        }
    }
}

impl fmt::Display for DocumentEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct DocumentEvent {
    pub kind: DocumentEventKind,
    pub document: Document,
    pub context: SessionContext,
}

impl DocumentEvent {
    pub fn new(kind: DocumentEventKind, document: Document, context: SessionContext) -> Self {
        Self {
            kind,
            document,
            context,
        }
    }
}

/// Successful pre-commit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Unchanged,
    /// The listener changed the in-flight document.
    Modified,
}

/// Rejection of the pending transaction by a pre-commit listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{listener} vetoed the transaction: {reason}")]
pub struct Veto {
    pub listener: String,
    pub reason: String,
}

impl Veto {
    pub fn new(listener: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            listener: listener.into(),
            reason: reason.into(),
        }
    }
}

impl From<Veto> for AppError {
    fn from(veto: Veto) -> Self {
        AppError::vetoed(&veto.listener, &veto.reason)
    }
}

/// Listener invoked inline before the repository write; may change the document or veto.
pub trait PreCommitListener: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn handle(&self, event: &mut DocumentEvent) -> Result<Commit, Veto>;
}

/// Listener invoked after commit on its own task. Failures are logged, never propagated.
#[async_trait]
pub trait PostCommitListener: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: DocumentEvent) -> Result<(), AppError>;
}

type PreCommitTable = HashMap<DocumentEventKind, Vec<Arc<dyn PreCommitListener>>>;
type PostCommitTable = HashMap<DocumentEventKind, Vec<Arc<dyn PostCommitListener>>>;

/// Builder used to register listeners at startup.
#[derive(Default)]
pub struct EventBusBuilder {
    pre_commit: PreCommitTable,
    post_commit: PostCommitTable,
}

impl EventBusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pre_commit<T: PreCommitListener>(
        &mut self,
        kind: DocumentEventKind,
        listener: Arc<T>,
    ) -> &mut Self {
        let listeners = self.pre_commit.entry(kind).or_default();
        if listeners.iter().any(|l| l.name() == listener.name()) {
            panic!("duplicate listener registered for {}: {}", kind, listener.name());
        }
        listeners.push(listener);
        self
    }

    pub fn register_post_commit<T: PostCommitListener>(
        &mut self,
        kind: DocumentEventKind,
        listener: Arc<T>,
    ) -> &mut Self {
        let listeners = self.post_commit.entry(kind).or_default();
        if listeners.iter().any(|l| l.name() == listener.name()) {
            panic!("duplicate listener registered for {}: {}", kind, listener.name());
        }
        listeners.push(listener);
        self
    }

    pub fn build(self) -> EventBus {
        EventBus {
            pre_commit: Arc::new(self.pre_commit),
            post_commit: Arc::new(self.post_commit),
        }
    }
}

/// Immutable listener table keyed by event kind.
#[derive(Clone, Default)]
pub struct EventBus {
    pre_commit: Arc<PreCommitTable>,
    post_commit: Arc<PostCommitTable>,
}

impl EventBus {
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    /// Run pre-commit listeners in registration order, stopping at the first veto.
    pub fn fire_pre_commit(&self, event: &mut DocumentEvent) -> Result<Commit, Veto> {
        let mut outcome = Commit::Unchanged;
        if let Some(listeners) = self.pre_commit.get(&event.kind) {
            for listener in listeners {
                if listener.handle(event)? == Commit::Modified {
                    tracing::debug!(
                        listener = listener.name(),
                        event = %event.kind,
                        "listener modified document"
                    );
                    outcome = Commit::Modified;
                }
            }
        }
        Ok(outcome)
    }

    /// Spawn every post-commit listener for the event and return the task handles.
    pub fn fire_post_commit(&self, event: DocumentEvent) -> Vec<JoinHandle<()>> {
        let Some(listeners) = self.post_commit.get(&event.kind) else {
            return Vec::new();
        };
        listeners
            .iter()
            .map(|listener| {
                let listener = listener.clone();
                let event = event.clone();
                tokio::spawn(async move {
                    let kind = event.kind;
                    let document_id = event.document.id.clone();
                    if let Err(err) = listener.handle(event).await {
                        tracing::error!(
                            listener = listener.name(),
                            event = %kind,
                            document_id = %document_id,
                            error = %err,
                            "post-commit listener failed"
                        );
                    }
                })
            })
            .collect()
    }

    pub fn pre_commit_listeners(&self, kind: DocumentEventKind) -> Vec<&'static str> {
        self.pre_commit
            .get(&kind)
            .map(|ls| ls.iter().map(|l| l.name()).collect())
            .unwrap_or_default()
    }

    pub fn post_commit_listeners(&self, kind: DocumentEventKind) -> Vec<&'static str> {
        self.post_commit
            .get(&kind)
            .map(|ls| ls.iter().map(|l| l.name()).collect())
            .unwrap_or_default()
    }
}
