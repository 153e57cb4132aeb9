#![allow(clippy::result_large_err)] // Applicators return AppError directly for structured diagnostics.

use super::{
    require_document, require_non_blank, ContractOperation, OperationInput, OperationOutput,
};
use crate::core::config::{ConfigValidator, SubmitConfig};
use crate::core::document::{Document, DocumentHandle};
use crate::core::error::AppError;
use crate::core::planner::{plan, DocumentView, TransitionParams};
use crate::core::rules::{has_field, has_non_blank_title, title_missing_prefix, type_is};
use crate::core::session::CoreSession;
use crate::core::types::PROP_TITLE;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub const SUBMIT_FOR_APPROVAL: &str = "Contract.SubmitForApproval";

/// Move a contract into review.
///
/// The document must be of `params.required_type`, have a non-blank title that does not yet
/// carry `params.title_prefix`, and define `status_field`; otherwise this fails with a
/// precondition error. An empty plan returns the document untouched.
pub async fn submit_for_approval(
    session: &CoreSession,
    mut document: Document,
    params: &TransitionParams,
    status_field: &str,
) -> Result<Document, AppError> {
    require_non_blank("requiredType", &params.required_type)?;
    require_non_blank("statusInReview", &params.target_status)?;
    require_non_blank("statusField", status_field)?;

    let gate = type_is(params.required_type.as_str())
        .and(has_non_blank_title())
        .and(title_missing_prefix(params.title_prefix.as_str()))
        .and(has_field(status_field));
    if !gate.test(&document)? {
        return Err(AppError::precondition(format!(
            "document does not satisfy {}",
            gate.name()
        ))
        .with_context("document_id", document.id.as_str()));
    }

    let view = DocumentView::new(
        document.doc_type.as_str(),
        document.title().unwrap_or_default(),
        document.has_schema_field(status_field),
    );
    let patch = plan(&view, params)?;
    if patch.is_empty() {
        tracing::debug!(document_id = %document.id, "submit planned no changes");
        return Ok(document);
    }

    if let Some(title) = patch.new_title() {
        document.write_field(PROP_TITLE, title)?;
    }
    if let Some(status) = patch.new_status() {
        document.write_field(status_field, status)?;
    }
    let saved = session.save_document(document).await?;
    session.commit().await?;
    tracing::info!(document_id = %saved.id, "contract submitted for approval");
    Ok(saved)
}

/// JSON parameters; absent keys fall back to configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SubmitParams {
    required_type: Option<String>,
    status_in_review: Option<String>,
    title_prefix: Option<String>,
    enforce_contract_type: Option<bool>,
}

pub struct SubmitForApprovalOperation {
    defaults: SubmitConfig,
    status_field: String,
}

impl SubmitForApprovalOperation {
    pub fn new(defaults: SubmitConfig, status_field: impl Into<String>) -> Self {
        Self {
            defaults,
            status_field: status_field.into(),
        }
    }

    fn resolve(&self, params: &Value) -> Result<TransitionParams, AppError> {
        let parsed: SubmitParams = if params.is_null() {
            SubmitParams::default()
        } else {
            serde_json::from_value(params.clone())?
        };
        let resolved = TransitionParams::new(
            parsed
                .required_type
                .unwrap_or_else(|| self.defaults.required_type.clone()),
            parsed
                .status_in_review
                .unwrap_or_else(|| self.defaults.target_status.clone()),
            parsed
                .title_prefix
                .unwrap_or_else(|| self.defaults.title_prefix.clone()),
            parsed
                .enforce_contract_type
                .unwrap_or(self.defaults.enforce_type),
        );
        require_non_blank("requiredType", &resolved.required_type)?;
        require_non_blank("statusInReview", &resolved.target_status)?;
        ConfigValidator::validate_status("statusInReview", &resolved.target_status)?;
        Ok(resolved)
    }
}

#[async_trait]
impl ContractOperation for SubmitForApprovalOperation {
    fn id(&self) -> &'static str {
        SUBMIT_FOR_APPROVAL
    }

    fn validate_params(&self, params: &Value) -> Result<(), AppError> {
        self.resolve(params).map(|_| ())
    }

    async fn execute(
        &self,
        session: &CoreSession,
        input: OperationInput,
        params: &Value,
    ) -> Result<OperationOutput, AppError> {
        let transition = self.resolve(params)?;
        let document = require_document(self.id(), input)?;
        let submitted =
            submit_for_approval(session, document, &transition, &self.status_field).await?;
        Ok(OperationOutput::Document(submitted))
    }
}
