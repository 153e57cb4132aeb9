#![allow(clippy::result_large_err)] // Rules surface unexpected field read failures as AppError.

//! Composable document predicates used to gate mutations.
//!
//! A rule answers `true`/`false` for a document. Rules only fail when reading the document
//! fails for a reason other than a missing field; a missing field is an ordinary `false`.

use crate::core::document::DocumentHandle;
use crate::core::error::AppError;
use std::fmt;
use std::sync::Arc;

type Check = dyn Fn(&dyn DocumentHandle) -> Result<bool, AppError> + Send + Sync;

/// A named predicate over a [`DocumentHandle`].
#[derive(Clone)]
pub struct Rule {
    name: String,
    check: Arc<Check>,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&dyn DocumentHandle) -> Result<bool, AppError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, doc: &dyn DocumentHandle) -> Result<bool, AppError> {
        (self.check)(doc)
    }

    /// Logical AND, evaluated left to right; `other` is skipped once `self` is false.
    pub fn and(self, other: Rule) -> Rule {
        let name = format!("{} AND {}", self.name, other.name);
        Rule::new(name, move |doc| {
            if !self.test(doc)? {
                return Ok(false);
            }
            other.test(doc)
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

pub fn type_is(required_type: impl Into<String>) -> Rule {
    let required = required_type.into();
    Rule::new(format!("typeIs({})", required), move |doc| {
        Ok(doc.doc_type() == required)
    })
}

pub fn path_starts_with(prefix: impl Into<String>) -> Rule {
    let prefix = prefix.into();
    Rule::new(format!("pathStartsWith({})", prefix), move |doc| {
        Ok(doc.path().map(|p| p.starts_with(&prefix)).unwrap_or(false))
    })
}

pub fn has_non_blank_title() -> Rule {
    Rule::new("hasNonBlankTitle", |doc| {
        Ok(doc.title().map(|t| !t.trim().is_empty()).unwrap_or(false))
    })
}

/// True when `prefix` is non-blank and the title does not start with it.
///
/// A blank prefix means no prefix is required, so the rule is false.
pub fn title_missing_prefix(prefix: impl Into<String>) -> Rule {
    let prefix = prefix.into();
    Rule::new(format!("titleMissingPrefix({})", prefix), move |doc| {
        if prefix.trim().is_empty() {
            return Ok(false);
        }
        Ok(!doc.title().unwrap_or("").starts_with(&prefix))
    })
}

pub fn has_field(field: impl Into<String>) -> Rule {
    let field = field.into();
    Rule::new(format!("hasField({})", field), move |doc| {
        match doc.read_field(&field) {
            Ok(_) => Ok(true),
            Err(err) if err.is_field_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    })
}
