use crate::core::types::{ErrorCategory, ErrorSeverity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const CODE_INVALID_TYPE: &str = "CF-PLAN-001";
pub const CODE_PRECONDITION: &str = "CF-OP-001";
pub const CODE_MISSING_PARAM: &str = "CF-OP-002";
pub const CODE_FIELD_NOT_FOUND: &str = "CF-DOC-404";
pub const CODE_DOCUMENT_NOT_FOUND: &str = "CF-REPO-404";
pub const CODE_VETOED: &str = "CF-TX-409";

#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub context: HashMap<String, String>,
    pub recovery_suggestions: Vec<String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let severity = match category {
            ErrorCategory::ValidationError
            | ErrorCategory::InvalidType
            | ErrorCategory::Precondition
            | ErrorCategory::Vetoed
            | ErrorCategory::PersistenceError
            | ErrorCategory::SerializationError
            | ErrorCategory::IoError
            | ErrorCategory::InternalError => ErrorSeverity::Error,
            ErrorCategory::NotFound | ErrorCategory::Delivery => ErrorSeverity::Warning,
            ErrorCategory::FieldNotFound => ErrorSeverity::Debug,
            ErrorCategory::Unknown => ErrorSeverity::Info,
        };
        AppError {
            category,
            severity,
            code: format!("ERR-{}", uuid::Uuid::new_v4()),
            message: message.into(),
            context: HashMap::new(),
            recovery_suggestions: vec![],
            occurred_at: Utc::now(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>>(
        category: ErrorCategory,
        message: T,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(anyhow::anyhow!(source));
        error
    }

    pub fn with_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_suggestion<T: Into<String>>(mut self, suggestion: T) -> Self {
        self.recovery_suggestions.push(suggestion.into());
        self
    }

    pub fn add_context(&mut self, key: &str, value: &str) {
        self.context.insert(key.to_string(), value.to_string());
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    /// `true` for the expected "field/schema not present on this document" condition.
    pub fn is_field_not_found(&self) -> bool {
        self.category == ErrorCategory::FieldNotFound
    }

    pub fn invalid_type(required_type: &str) -> Self {
        AppError::new(
            ErrorCategory::InvalidType,
            format!("transition can only run on type '{}'", required_type),
        )
        .with_code(CODE_INVALID_TYPE)
        .with_context("required_type", required_type)
    }

    pub fn precondition<T: Into<String>>(message: T) -> Self {
        AppError::new(ErrorCategory::Precondition, message).with_code(CODE_PRECONDITION)
    }

    pub fn missing_param(name: &str) -> Self {
        AppError::new(
            ErrorCategory::ValidationError,
            format!("parameter '{}' is required and must not be blank", name),
        )
        .with_code(CODE_MISSING_PARAM)
        .with_context("parameter", name)
    }

    pub fn field_not_found(field: &str) -> Self {
        AppError::new(
            ErrorCategory::FieldNotFound,
            format!("field '{}' is not defined for this document", field),
        )
        .with_code(CODE_FIELD_NOT_FOUND)
        .with_context("field", field)
    }

    pub fn document_not_found(id: &str) -> Self {
        AppError::new(ErrorCategory::NotFound, format!("document {} not found", id))
            .with_code(CODE_DOCUMENT_NOT_FOUND)
            .with_context("document_id", id)
    }

    pub fn vetoed(listener: &str, reason: &str) -> Self {
        AppError::new(
            ErrorCategory::Vetoed,
            format!("transaction rejected by {}: {}", listener, reason),
        )
        .with_code(CODE_VETOED)
        .with_context("listener", listener)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if !self.context.is_empty() {
            let mut pairs: Vec<_> = self.context.iter().collect();
            pairs.sort();
            write!(f, " (Context: {:?})", pairs)?;
        }
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError {
            category: ErrorCategory::InternalError,
            severity: ErrorSeverity::Error,
            code: "ANYHOW_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            recovery_suggestions: vec!["Check the error details".to_string()],
            occurred_at: Utc::now(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError {
            category: ErrorCategory::IoError,
            severity: ErrorSeverity::Error,
            code: "IO_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            recovery_suggestions: vec!["Check file permissions and paths".to_string()],
            occurred_at: Utc::now(),
            source: Some(anyhow::anyhow!(e)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::new(ErrorCategory::SerializationError, e.to_string())
            .with_code("SERDE_JSON_ERROR")
    }
}
