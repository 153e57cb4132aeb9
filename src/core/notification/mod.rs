#![allow(clippy::result_large_err)] // Job::run returns AppError directly for structured diagnostics.

//! Best-effort webhook notification for approved contracts.
//!
//! A notification job is identified by `notify-approval:{repository}:{document}` so that the job
//! queue can treat repeated schedules for the same approval as one logical job.

use crate::core::document::{DocumentHandle, SessionContext};
use crate::core::error::AppError;
use crate::core::jobs::Job;
use crate::core::repository::DocumentRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const NOTIFY_CATEGORY: &str = "contractNotify";

const JOB_KEY_PREFIX: &str = "notify-approval";

/// Stable job identity for an approval notification.
pub fn job_key(repository: &str, document_id: &str) -> String {
    format!("{}:{}:{}", JOB_KEY_PREFIX, repository, document_id)
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    pub id: String,
    pub title: String,
    pub path: String,
    pub status: String,
}

/// Webhook delivery failure. Never leaves the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Webhook returned non-success status: {0}")]
    Status(u16),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Outbound HTTP collaborator.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST `body` to `url` and return the response status code.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, DeliveryError>;
}

/// `reqwest` transport. The timeout, if any, is transport configuration.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<u16, DeliveryError> {
        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

/// What a dispatch attempt ended with. Every variant is a successful job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The document was gone by the time the job ran.
    DocumentMissing,
    /// No webhook endpoint is configured.
    Skipped(ApprovalPayload),
    Delivered(u16),
    Failed(String),
}

/// Looks up approved documents and posts them to the configured webhook.
#[derive(Clone)]
pub struct NotificationDispatcher {
    repository: Arc<dyn DocumentRepository>,
    transport: Arc<dyn WebhookTransport>,
    webhook_url: String,
    status_field: String,
}

impl NotificationDispatcher {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        transport: Arc<dyn WebhookTransport>,
        webhook_url: impl Into<String>,
        status_field: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            transport,
            webhook_url: webhook_url.into(),
            status_field: status_field.into(),
        }
    }

    pub fn webhook_enabled(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }

    /// Build the notification job for a document of `repository`.
    pub fn job(&self, repository: &str, document_id: &str) -> NotifyApprovalJob {
        NotifyApprovalJob {
            key: job_key(repository, document_id),
            repository: repository.to_string(),
            document_id: document_id.to_string(),
            dispatcher: self.clone(),
        }
    }

    /// Run one notification attempt. Runs under the system session.
    pub async fn dispatch(
        &self,
        repository: &str,
        document_id: &str,
    ) -> Result<DispatchOutcome, AppError> {
        let context = SessionContext::system();
        let document = if repository == self.repository.name() {
            self.repository.get_by_id(&context, document_id).await?
        } else {
            None
        };
        let Some(document) = document else {
            tracing::warn!(
                repository = %repository,
                document_id = %document_id,
                "approved document no longer exists; skipping notification"
            );
            return Ok(DispatchOutcome::DocumentMissing);
        };

        let status = match document.read_field(&self.status_field) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) if err.is_field_not_found() => String::new(),
            Err(err) => return Err(err),
        };
        let payload = ApprovalPayload {
            id: document.id.clone(),
            title: document.title().unwrap_or_default().to_string(),
            path: document.path().unwrap_or_default().to_string(),
            status,
        };
        tracing::info!(
            document_id = %payload.id,
            title = %payload.title,
            path = %payload.path,
            "contract approved"
        );

        if !self.webhook_enabled() {
            return Ok(DispatchOutcome::Skipped(payload));
        }

        match self.deliver(&payload).await {
            Ok(status) => {
                tracing::info!(
                    document_id = %payload.id,
                    status = status,
                    "approval webhook delivered"
                );
                Ok(DispatchOutcome::Delivered(status))
            }
            Err(err) => {
                tracing::warn!(
                    document_id = %payload.id,
                    error = %err,
                    "approval webhook delivery failed"
                );
                Ok(DispatchOutcome::Failed(err.to_string()))
            }
        }
    }

    async fn deliver(&self, payload: &ApprovalPayload) -> Result<u16, DeliveryError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| DeliveryError::Serialization(e.to_string()))?;
        let status = self.transport.post_json(&self.webhook_url, &body).await?;
        if !(200..300).contains(&status) {
            return Err(DeliveryError::Status(status));
        }
        Ok(status)
    }
}

/// Scheduled unit of work that runs one dispatch.
pub struct NotifyApprovalJob {
    key: String,
    repository: String,
    document_id: String,
    dispatcher: NotificationDispatcher,
}

impl NotifyApprovalJob {
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

#[async_trait]
impl Job for NotifyApprovalJob {
    fn id(&self) -> &str {
        &self.key
    }

    fn category(&self) -> &str {
        NOTIFY_CATEGORY
    }

    async fn run(&self) -> Result<(), AppError> {
        match self.dispatcher.dispatch(&self.repository, &self.document_id).await {
            Ok(outcome) => {
                tracing::debug!(
                    job_id = %self.key,
                    outcome = ?outcome,
                    "notification job finished"
                );
            }
            Err(err) => {
                tracing::warn!(
                    job_id = %self.key,
                    error = %err,
                    "notification job could not read document"
                );
            }
        }
        Ok(())
    }
}
