#![allow(clippy::result_large_err)] // Repository operations return AppError for consistent diagnostics.

use crate::core::document::{Document, SessionContext};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

pub const DEFAULT_REPOSITORY: &str = "default";

/// Document store collaborator.
///
/// Implementations own per-document persistence semantics; callers never hold locks across
/// calls.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Repository name, part of notification job identity.
    fn name(&self) -> &str;

    async fn create(&self, ctx: &SessionContext, document: Document) -> Result<Document, AppError>;

    /// Documents whose path starts with `path_prefix`, ordered by path.
    async fn query(
        &self,
        ctx: &SessionContext,
        path_prefix: &str,
        exclude_proxies: bool,
    ) -> Result<Vec<Document>, AppError>;

    async fn get_by_id(&self, ctx: &SessionContext, id: &str)
        -> Result<Option<Document>, AppError>;

    async fn save(&self, ctx: &SessionContext, document: Document) -> Result<Document, AppError>;

    async fn commit(&self, ctx: &SessionContext) -> Result<(), AppError>;
}

/// On-disk representation of an in-memory repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub repository: String,
    #[serde(default)]
    pub documents: Vec<Document>,
}

/// Process-local repository. Saves are visible immediately; `commit` only counts.
pub struct InMemoryRepository {
    name: String,
    documents: RwLock<BTreeMap<String, Document>>,
    saves: AtomicUsize,
    commits: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
            saves: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
        }
    }

    pub fn from_snapshot(snapshot: RepositorySnapshot) -> Self {
        let repository = Self::new(snapshot.repository);
        let mut documents = BTreeMap::new();
        for mut doc in snapshot.documents {
            if doc.id.is_empty() {
                doc.id = uuid::Uuid::new_v4().to_string();
            }
            doc.repository = repository.name.clone();
            documents.insert(doc.id.clone(), doc);
        }
        Self {
            documents: RwLock::new(documents),
            ..repository
        }
    }

    /// Load a snapshot file (`.yaml`/`.yml` or JSON). A missing file yields an empty repository.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::new(DEFAULT_REPOSITORY));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read store file {}: {}", path.display(), e),
            )
        })?;
        let snapshot: RepositorySnapshot = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                AppError::new(
                    ErrorCategory::SerializationError,
                    format!("Failed to parse store file {}: {}", path.display(), e),
                )
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                AppError::new(
                    ErrorCategory::SerializationError,
                    format!("Failed to parse store file {}: {}", path.display(), e),
                )
            })?
        };
        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn snapshot(&self) -> RepositorySnapshot {
        let documents = self.documents.read().await;
        let mut docs: Vec<Document> = documents.values().cloned().collect();
        docs.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
        RepositorySnapshot {
            repository: self.name.clone(),
            documents: docs,
        }
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), AppError> {
        let snapshot = self.snapshot().await;
        let content = if is_yaml(path) {
            serde_yaml::to_string(&snapshot).map_err(|e| {
                AppError::new(ErrorCategory::SerializationError, e.to_string())
            })?
        } else {
            serde_json::to_string_pretty(&snapshot)?
        };
        std::fs::write(path, content).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to write store file {}: {}", path.display(), e),
            )
        })
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(
        &self,
        ctx: &SessionContext,
        mut document: Document,
    ) -> Result<Document, AppError> {
        if document.id.is_empty() {
            document.id = uuid::Uuid::new_v4().to_string();
        }
        document.repository = self.name.clone();
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(AppError::new(
                ErrorCategory::PersistenceError,
                format!("document {} already exists", document.id),
            ));
        }
        tracing::debug!(
            document_id = %document.id,
            principal = ctx.principal(),
            "created document"
        );
        documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn query(
        &self,
        ctx: &SessionContext,
        path_prefix: &str,
        exclude_proxies: bool,
    ) -> Result<Vec<Document>, AppError> {
        let documents = self.documents.read().await;
        let mut matches: Vec<Document> = documents
            .values()
            .filter(|doc| {
                doc.path
                    .as_deref()
                    .map(|p| p.starts_with(path_prefix))
                    .unwrap_or(false)
            })
            .filter(|doc| !(exclude_proxies && doc.is_proxy))
            .filter(|doc| doc.can_read(ctx))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn get_by_id(
        &self,
        ctx: &SessionContext,
        id: &str,
    ) -> Result<Option<Document>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).filter(|doc| doc.can_read(ctx)).cloned())
    }

    async fn save(
        &self,
        ctx: &SessionContext,
        mut document: Document,
    ) -> Result<Document, AppError> {
        let mut documents = self.documents.write().await;
        if !documents.contains_key(&document.id) {
            return Err(AppError::document_not_found(&document.id)
                .with_context("operation", "save"));
        }
        document.repository = self.name.clone();
        documents.insert(document.id.clone(), document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            document_id = %document.id,
            principal = ctx.principal(),
            "saved document"
        );
        Ok(document)
    }

    async fn commit(&self, _ctx: &SessionContext) -> Result<(), AppError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
