#![allow(clippy::result_large_err)] // Applicators return AppError directly for structured diagnostics.

use super::{require_non_blank, ContractOperation, OperationInput, OperationOutput};
use crate::core::config::{ChangeStatusConfig, ConfigValidator};
use crate::core::document::{Document, DocumentHandle};
use crate::core::error::AppError;
use crate::core::planner::{plan, DocumentView, TransitionParams};
use crate::core::rules::{has_field, type_is, Rule};
use crate::core::session::CoreSession;
use crate::core::types::{ContractStatus, ErrorCategory};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHANGE_STATUS_IN_PATH: &str = "Contract.ChangeStatusInPath";

/// Bulk status change over every non-proxy document under `path`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeStatusRequest {
    pub path: String,
    pub required_type: String,
    pub target_status: String,
    pub enforce_type: bool,
    /// Only touch documents currently in this status; blank matches any status.
    pub only_if_current_status: String,
}

impl ChangeStatusRequest {
    pub fn from_config(path: impl Into<String>, config: &ChangeStatusConfig) -> Self {
        Self {
            path: path.into(),
            required_type: config.required_type.clone(),
            target_status: config.target_status.clone(),
            enforce_type: config.enforce_type,
            only_if_current_status: config.only_if_current_status.clone(),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        require_non_blank("path", &self.path)?;
        require_non_blank("requiredType", &self.required_type)?;
        require_non_blank("targetStatus", &self.target_status)?;
        Ok(())
    }
}

fn status_matches(status_field: &str, expected: &str) -> Rule {
    let field = status_field.to_string();
    let expected = expected.to_string();
    Rule::new(format!("statusIs({})", expected), move |doc| {
        if expected.trim().is_empty() {
            return Ok(true);
        }
        Ok(doc.read_field(&field)?.as_deref() == Some(expected.as_str()))
    })
}

/// Set the target status on every matching document and return the ones actually changed.
///
/// Documents are saved one at a time. If a save fails the error is returned and documents
/// saved earlier in the batch stay saved.
pub async fn change_status_in_path(
    session: &CoreSession,
    request: &ChangeStatusRequest,
    status_field: &str,
) -> Result<Vec<Document>, AppError> {
    request.validate()?;
    require_non_blank("statusField", status_field)?;

    let filter = type_is(request.required_type.as_str())
        .and(has_field(status_field))
        .and(status_matches(status_field, &request.only_if_current_status));
    let params = TransitionParams::new(
        request.required_type.as_str(),
        request.target_status.as_str(),
        "",
        request.enforce_type,
    );

    let candidates = session.query(&request.path, true).await?;
    let mut changed = Vec::new();
    for mut document in candidates {
        if !filter.test(&document)? {
            continue;
        }
        let view = DocumentView::new(
            document.doc_type.as_str(),
            document.title().unwrap_or_default(),
            true,
        );
        let patch = match plan(&view, &params) {
            Ok(patch) => patch,
            Err(err) if err.category == ErrorCategory::InvalidType => {
                tracing::debug!(document_id = %document.id, "excluded by type");
                continue;
            }
            Err(err) => return Err(err),
        };
        let Some(new_status) = patch.new_status() else {
            continue;
        };
        let current = document.read_field(status_field)?;
        if current.as_deref() == Some(new_status) {
            continue;
        }

        document.write_field(status_field, new_status)?;
        changed.push(session.save_document(document).await?);
    }

    if !changed.is_empty() {
        session.commit().await?;
    }
    tracing::info!(
        path = %request.path,
        target_status = %request.target_status,
        changed = changed.len(),
        "bulk status change finished"
    );
    Ok(changed)
}

/// Promote every In Review contract under `path` to Approved and return their ids.
pub async fn approve_in_path(
    session: &CoreSession,
    path: &str,
    required_type: &str,
    status_field: &str,
) -> Result<Vec<String>, AppError> {
    let request = ChangeStatusRequest {
        path: path.to_string(),
        required_type: required_type.to_string(),
        target_status: ContractStatus::Approved.to_string(),
        enforce_type: true,
        only_if_current_status: ContractStatus::InReview.to_string(),
    };
    let approved = change_status_in_path(session, &request, status_field).await?;
    Ok(approved.into_iter().map(|doc| doc.id).collect())
}

/// JSON parameters; only `path` is mandatory, the rest fall back to configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ChangeStatusParams {
    path: Option<String>,
    required_type: Option<String>,
    target_status: Option<String>,
    enforce_type: Option<bool>,
    only_if_current_status: Option<String>,
}

pub struct ChangeStatusInPathOperation {
    defaults: ChangeStatusConfig,
    status_field: String,
}

impl ChangeStatusInPathOperation {
    pub fn new(defaults: ChangeStatusConfig, status_field: impl Into<String>) -> Self {
        Self {
            defaults,
            status_field: status_field.into(),
        }
    }

    fn resolve(&self, params: &Value) -> Result<ChangeStatusRequest, AppError> {
        let parsed: ChangeStatusParams = if params.is_null() {
            ChangeStatusParams::default()
        } else {
            serde_json::from_value(params.clone())?
        };
        let request = ChangeStatusRequest {
            path: parsed.path.unwrap_or_default(),
            required_type: parsed
                .required_type
                .unwrap_or_else(|| self.defaults.required_type.clone()),
            target_status: parsed
                .target_status
                .unwrap_or_else(|| self.defaults.target_status.clone()),
            enforce_type: parsed.enforce_type.unwrap_or(self.defaults.enforce_type),
            only_if_current_status: parsed
                .only_if_current_status
                .unwrap_or_else(|| self.defaults.only_if_current_status.clone()),
        };
        request.validate()?;
        ConfigValidator::validate_status("targetStatus", &request.target_status)?;
        if !request.only_if_current_status.trim().is_empty() {
            ConfigValidator::validate_status(
                "onlyIfCurrentStatus",
                &request.only_if_current_status,
            )?;
        }
        Ok(request)
    }
}

#[async_trait]
impl ContractOperation for ChangeStatusInPathOperation {
    fn id(&self) -> &'static str {
        CHANGE_STATUS_IN_PATH
    }

    fn validate_params(&self, params: &Value) -> Result<(), AppError> {
        self.resolve(params).map(|_| ())
    }

    async fn execute(
        &self,
        session: &CoreSession,
        _input: OperationInput,
        params: &Value,
    ) -> Result<OperationOutput, AppError> {
        let request = self.resolve(params)?;
        let changed = change_status_in_path(session, &request, &self.status_field).await?;
        Ok(OperationOutput::Documents(changed))
    }
}
