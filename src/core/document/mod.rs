#![allow(clippy::result_large_err)] // Field access returns AppError so callers can match on the category.

use crate::core::error::AppError;
use crate::core::types::PROP_TITLE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only capability over a document, used by rules and views.
pub trait DocumentHandle {
    fn doc_type(&self) -> &str;

    fn title(&self) -> Option<&str>;

    fn path(&self) -> Option<&str>;

    /// Read a named field.
    ///
    /// Returns `Ok(None)` when the field exists but holds no value, and an error with
    /// `ErrorCategory::FieldNotFound` when the document's schema does not define it.
    fn read_field(&self, field: &str) -> Result<Option<String>, AppError>;
}

/// Identity of the caller a repository operation runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    principal: String,
    elevated: bool,
}

impl SessionContext {
    /// Regular user session, subject to document read restrictions.
    pub fn user(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            elevated: false,
        }
    }

    /// Elevated system session used for out-of-band work such as notifications.
    pub fn system() -> Self {
        Self {
            principal: "system".to_string(),
            elevated: true,
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn is_elevated(&self) -> bool {
        self.elevated
    }
}

/// A live document as stored by the repository.
///
/// Keys of `properties` are the fields the document's schema defines; a key mapped to `None`
/// is a defined but unset field. The title is stored separately and addressed as `dc:title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub repository: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_proxy: bool,
    #[serde(default)]
    pub is_version: bool,
    /// Principals allowed to read the document; empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readers: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Option<String>>,
}

impl Document {
    pub fn new(
        doc_type: impl Into<String>,
        path: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            repository: String::new(),
            doc_type: doc_type.into(),
            path: Some(path.into()),
            title: Some(title.into()),
            is_proxy: false,
            is_version: false,
            readers: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Declare a schema field and give it a value.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(field.into(), Some(value.into()));
        self
    }

    /// Declare a schema field without a value.
    pub fn with_empty_field(mut self, field: impl Into<String>) -> Self {
        self.properties.insert(field.into(), None);
        self
    }

    pub fn with_readers<I, S>(mut self, readers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.readers = readers.into_iter().map(Into::into).collect();
        self
    }

    pub fn as_proxy(mut self) -> Self {
        self.is_proxy = true;
        self
    }

    pub fn as_version(mut self) -> Self {
        self.is_version = true;
        self
    }

    pub fn has_schema_field(&self, field: &str) -> bool {
        field == PROP_TITLE || self.properties.contains_key(field)
    }

    /// Write a field defined by the document's schema.
    pub fn write_field(&mut self, field: &str, value: impl Into<String>) -> Result<(), AppError> {
        if field == PROP_TITLE {
            self.title = Some(value.into());
            return Ok(());
        }
        match self.properties.get_mut(field) {
            Some(slot) => {
                *slot = Some(value.into());
                Ok(())
            }
            None => Err(AppError::field_not_found(field)),
        }
    }

    pub fn can_read(&self, context: &SessionContext) -> bool {
        context.is_elevated()
            || self.readers.is_empty()
            || self.readers.iter().any(|r| r == context.principal())
    }
}

impl DocumentHandle for Document {
    fn doc_type(&self) -> &str {
        &self.doc_type
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn read_field(&self, field: &str) -> Result<Option<String>, AppError> {
        if field == PROP_TITLE {
            return Ok(self.title.clone());
        }
        self.properties
            .get(field)
            .cloned()
            .ok_or_else(|| AppError::field_not_found(field))
    }
}
