#![allow(clippy::result_large_err)] // Post-commit listeners return AppError directly for structured diagnostics.

//! Contract lifecycle listeners.
//!
//! Validation and creation defaults run pre-commit inside the triggering save. Approval
//! detection runs post-commit and only schedules a notification job.

use crate::core::config::ContractConfig;
use crate::core::document::{Document, DocumentHandle};
use crate::core::error::AppError;
use crate::core::events::{
    Commit, DocumentEvent, DocumentEventKind, EventBusBuilder, PostCommitListener,
    PreCommitListener, Veto,
};
use crate::core::jobs::{JobScheduler, ScheduleOutcome};
use crate::core::notification::NotificationDispatcher;
use crate::core::types::ContractStatus;
use async_trait::async_trait;
use std::sync::Arc;

/// Vetoes contracts with a blank title or an unreadable status field.
pub struct ContractValidationListener {
    doc_type: String,
    status_field: String,
}

impl ContractValidationListener {
    pub const NAME: &'static str = "contractValidation";

    pub fn new(config: &ContractConfig) -> Self {
        Self {
            doc_type: config.doc_type.clone(),
            status_field: config.status_field.clone(),
        }
    }

    /// Check a contract through its read capability. Other document types pass unchanged.
    pub fn validate(&self, doc: &dyn DocumentHandle) -> Result<Commit, Veto> {
        if doc.doc_type() != self.doc_type {
            return Ok(Commit::Unchanged);
        }
        if doc.title().map(|t| t.trim().is_empty()).unwrap_or(true) {
            return Err(Veto::new(Self::NAME, "contract title must not be blank"));
        }
        match doc.read_field(&self.status_field) {
            Err(err) if !err.is_field_not_found() => Err(Veto::new(
                Self::NAME,
                format!("cannot read {}: {}", self.status_field, err.message),
            )),
            _ => Ok(Commit::Unchanged),
        }
    }
}

impl PreCommitListener for ContractValidationListener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handle(&self, event: &mut DocumentEvent) -> Result<Commit, Veto> {
        self.validate(&event.document)
    }
}

/// Seeds Draft status and the creation title prefix on new contracts.
pub struct ContractDefaultsListener {
    doc_type: String,
    status_field: String,
    title_prefix: String,
}

impl ContractDefaultsListener {
    pub const NAME: &'static str = "contractDefaults";

    pub fn new(config: &ContractConfig) -> Self {
        Self {
            doc_type: config.doc_type.clone(),
            status_field: config.status_field.clone(),
            title_prefix: config.creation_title_prefix.clone(),
        }
    }

    fn seed_status(&self, doc: &mut Document) -> bool {
        let draft = ContractStatus::Draft.as_str();
        match doc.read_field(&self.status_field) {
            Ok(Some(current)) if current == draft => false,
            Ok(_) => match doc.write_field(&self.status_field, draft) {
                Ok(()) => true,
                Err(err) if err.is_field_not_found() => false,
                Err(err) => {
                    tracing::warn!(error = %err, "could not seed draft status");
                    false
                }
            },
            Err(_) => false,
        }
    }

    fn seed_title(&self, doc: &mut Document) -> bool {
        if self.title_prefix.trim().is_empty() {
            return false;
        }
        let title = doc.title().unwrap_or_default();
        if title.starts_with(&self.title_prefix) {
            return false;
        }
        doc.title = Some(format!("{}{}", self.title_prefix, title));
        true
    }
}

impl PreCommitListener for ContractDefaultsListener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn handle(&self, event: &mut DocumentEvent) -> Result<Commit, Veto> {
        if event.kind != DocumentEventKind::DocumentCreated {
            return Ok(Commit::Unchanged);
        }
        let doc = &mut event.document;
        if doc.doc_type != self.doc_type || doc.is_proxy || doc.is_version {
            return Ok(Commit::Unchanged);
        }
        let status_changed = self.seed_status(doc);
        let title_changed = self.seed_title(doc);
        if status_changed || title_changed {
            Ok(Commit::Modified)
        } else {
            Ok(Commit::Unchanged)
        }
    }
}

/// Schedules an approval notification when a saved contract is Approved.
pub struct ApprovalNotificationListener {
    doc_type: String,
    status_field: String,
    scheduler: Arc<dyn JobScheduler>,
    dispatcher: NotificationDispatcher,
}

impl ApprovalNotificationListener {
    pub const NAME: &'static str = "approvalNotification";

    pub fn new(
        config: &ContractConfig,
        scheduler: Arc<dyn JobScheduler>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            doc_type: config.doc_type.clone(),
            status_field: config.status_field.clone(),
            scheduler,
            dispatcher,
        }
    }
}

#[async_trait]
impl PostCommitListener for ApprovalNotificationListener {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: DocumentEvent) -> Result<(), AppError> {
        let doc = &event.document;
        if doc.doc_type != self.doc_type {
            return Ok(());
        }
        let status = match doc.read_field(&self.status_field) {
            Ok(status) => status,
            Err(err) if err.is_field_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };
        if status.as_deref() != Some(ContractStatus::Approved.as_str()) {
            return Ok(());
        }

        let job = self.dispatcher.job(&doc.repository, &doc.id);
        match self.scheduler.schedule(Arc::new(job))? {
            ScheduleOutcome::Scheduled => {
                tracing::info!(document_id = %doc.id, "approval notification scheduled")
            }
            ScheduleOutcome::Coalesced => {
                tracing::debug!(document_id = %doc.id, "approval notification already pending")
            }
        }
        Ok(())
    }
}

/// Register the contract listeners. Validation runs before creation defaults.
pub fn register_contract_listeners(
    builder: &mut EventBusBuilder,
    config: &ContractConfig,
    scheduler: Arc<dyn JobScheduler>,
    dispatcher: NotificationDispatcher,
) {
    let validation = Arc::new(ContractValidationListener::new(config));
    builder
        .register_pre_commit(DocumentEventKind::DocumentCreated, validation.clone())
        .register_pre_commit(DocumentEventKind::DocumentModified, validation)
        .register_pre_commit(
            DocumentEventKind::DocumentCreated,
            Arc::new(ContractDefaultsListener::new(config)),
        )
        .register_post_commit(
            DocumentEventKind::DocumentUpdated,
            Arc::new(ApprovalNotificationListener::new(config, scheduler, dispatcher)),
        );
}
