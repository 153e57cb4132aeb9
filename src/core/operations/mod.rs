#![allow(clippy::result_large_err)] // Operation trait and registry return AppError directly for structured diagnostics without boxing.

//! Caller-facing contract operations.
//!
//! Each applicator is a plain async function over a [`CoreSession`]; the registry wraps them
//! as named operations taking JSON parameters.

pub mod change_status;
pub mod review;
pub mod submit;

pub use change_status::{
    approve_in_path, change_status_in_path, ChangeStatusInPathOperation, ChangeStatusRequest,
    CHANGE_STATUS_IN_PATH,
};
pub use review::{approve, reject, ReviewOperation, APPROVE, REJECT};
pub use submit::{submit_for_approval, SubmitForApprovalOperation, SUBMIT_FOR_APPROVAL};

use crate::core::config::ContractflowConfig;
use crate::core::document::Document;
use crate::core::error::AppError;
use crate::core::session::CoreSession;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What an operation acts on.
#[derive(Debug, Clone)]
pub enum OperationInput {
    None,
    Document(Document),
}

#[derive(Debug, Clone)]
pub enum OperationOutput {
    Document(Document),
    Documents(Vec<Document>),
}

impl OperationOutput {
    pub fn documents(&self) -> Vec<&Document> {
        match self {
            OperationOutput::Document(doc) => vec![doc],
            OperationOutput::Documents(docs) => docs.iter().collect(),
        }
    }
}

/// Trait implemented by contract operations.
#[async_trait]
pub trait ContractOperation: Send + Sync + 'static {
    /// Operation id used by callers.
    fn id(&self) -> &'static str;

    /// Validate params ahead of execution.
    fn validate_params(&self, params: &Value) -> Result<(), AppError>;

    async fn execute(
        &self,
        session: &CoreSession,
        input: OperationInput,
        params: &Value,
    ) -> Result<OperationOutput, AppError>;
}

/// Builder used to register operations at startup.
pub struct OperationRegistryBuilder {
    operations: HashMap<String, Arc<dyn ContractOperation>>,
}

impl Default for OperationRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationRegistryBuilder {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    pub fn register<T: ContractOperation>(&mut self, operation: T) -> &mut Self {
        let id = operation.id();
        if self.operations.contains_key(id) {
            panic!("duplicate operation registered: {}", id);
        }
        self.operations.insert(id.to_string(), Arc::new(operation));
        self
    }

    pub fn build(self) -> OperationRegistry {
        OperationRegistry {
            inner: Arc::new(self.operations),
        }
    }
}

/// Immutable operation table.
#[derive(Clone)]
pub struct OperationRegistry {
    inner: Arc<HashMap<String, Arc<dyn ContractOperation>>>,
}

impl OperationRegistry {
    pub fn builder() -> OperationRegistryBuilder {
        OperationRegistryBuilder::new()
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ContractOperation>> {
        self.inner.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.inner.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Validate `params` and run the operation registered under `id`.
    pub async fn run(
        &self,
        id: &str,
        session: &CoreSession,
        input: OperationInput,
        params: &Value,
    ) -> Result<OperationOutput, AppError> {
        let operation = self.get(id).ok_or_else(|| {
            AppError::new(ErrorCategory::NotFound, format!("unknown operation '{}'", id))
                .with_context("operation", id)
        })?;
        operation.validate_params(params)?;
        tracing::debug!(
            operation = id,
            principal = session.context().principal(),
            "running operation"
        );
        operation.execute(session, input, params).await
    }
}

/// Register the built-in contract operations configured from `config`.
pub fn register_builtins(builder: &mut OperationRegistryBuilder, config: &ContractflowConfig) {
    let status_field = config.contract.status_field.as_str();
    builder
        .register(SubmitForApprovalOperation::new(
            config.submit.clone(),
            status_field,
        ))
        .register(ReviewOperation::approve(status_field))
        .register(ReviewOperation::reject(status_field))
        .register(ChangeStatusInPathOperation::new(
            config.change_status.clone(),
            status_field,
        ));
}

pub(crate) fn require_non_blank(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::missing_param(name));
    }
    Ok(())
}

pub(crate) fn require_document(
    operation: &str,
    input: OperationInput,
) -> Result<Document, AppError> {
    match input {
        OperationInput::Document(document) => Ok(document),
        OperationInput::None => Err(AppError::new(
            ErrorCategory::ValidationError,
            format!("{} requires a document input", operation),
        )
        .with_context("operation", operation)),
    }
}
