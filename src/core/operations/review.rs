#![allow(clippy::result_large_err)] // Applicators return AppError directly for structured diagnostics.

use super::{
    require_document, require_non_blank, ContractOperation, OperationInput, OperationOutput,
};
use crate::core::document::{Document, DocumentHandle};
use crate::core::error::AppError;
use crate::core::session::CoreSession;
use crate::core::types::ContractStatus;
use async_trait::async_trait;
use serde_json::Value;

pub const APPROVE: &str = "Contract.Approve";
pub const REJECT: &str = "Contract.Reject";

/// Approve a contract that is currently In Review. Any other state is returned unchanged.
pub async fn approve(
    session: &CoreSession,
    document: Document,
    status_field: &str,
) -> Result<Document, AppError> {
    conclude_review(session, document, status_field, ContractStatus::Approved).await
}

/// Reject a contract that is currently In Review. Any other state is returned unchanged.
pub async fn reject(
    session: &CoreSession,
    document: Document,
    status_field: &str,
) -> Result<Document, AppError> {
    conclude_review(session, document, status_field, ContractStatus::Rejected).await
}

async fn conclude_review(
    session: &CoreSession,
    mut document: Document,
    status_field: &str,
    outcome: ContractStatus,
) -> Result<Document, AppError> {
    require_non_blank("statusField", status_field)?;
    let current = match document.read_field(status_field) {
        Ok(current) => current,
        Err(err) if err.is_field_not_found() => return Ok(document),
        Err(err) => return Err(err),
    };
    if current.as_deref() != Some(ContractStatus::InReview.as_str()) {
        tracing::debug!(
            document_id = %document.id,
            current = current.as_deref().unwrap_or(""),
            outcome = %outcome,
            "contract is not in review; leaving unchanged"
        );
        return Ok(document);
    }

    document.write_field(status_field, outcome.as_str())?;
    let saved = session.save_document(document).await?;
    session.commit().await?;
    tracing::info!(document_id = %saved.id, outcome = %outcome, "review concluded");
    Ok(saved)
}

/// Registry wrapper for [`approve`] and [`reject`].
pub struct ReviewOperation {
    id: &'static str,
    outcome: ContractStatus,
    status_field: String,
}

impl ReviewOperation {
    pub fn approve(status_field: impl Into<String>) -> Self {
        Self {
            id: APPROVE,
            outcome: ContractStatus::Approved,
            status_field: status_field.into(),
        }
    }

    pub fn reject(status_field: impl Into<String>) -> Self {
        Self {
            id: REJECT,
            outcome: ContractStatus::Rejected,
            status_field: status_field.into(),
        }
    }
}

#[async_trait]
impl ContractOperation for ReviewOperation {
    fn id(&self) -> &'static str {
        self.id
    }

    fn validate_params(&self, params: &Value) -> Result<(), AppError> {
        match params {
            Value::Null => Ok(()),
            Value::Object(map) if map.is_empty() => Ok(()),
            _ => Err(AppError::new(
                crate::core::types::ErrorCategory::ValidationError,
                format!("{} takes no parameters", self.id),
            )),
        }
    }

    async fn execute(
        &self,
        session: &CoreSession,
        input: OperationInput,
        _params: &Value,
    ) -> Result<OperationOutput, AppError> {
        let document = require_document(self.id, input)?;
        let reviewed =
            conclude_review(session, document, &self.status_field, self.outcome).await?;
        Ok(OperationOutput::Document(reviewed))
    }
}
