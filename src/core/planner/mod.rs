#![allow(clippy::result_large_err)] // Planning failures are AppError so applicators can propagate them unchanged.

//! Pure transition planning: decide which title/status changes a document needs.
//!
//! Nothing here touches a repository. The planner never compares against the current status;
//! that comparison belongs to the applicators.

use crate::core::error::AppError;
use serde::{Deserialize, Serialize};

/// What the planner needs to know about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentView {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub title: String,
    pub has_status_field: bool,
}

impl DocumentView {
    pub fn new(
        doc_type: impl Into<String>,
        title: impl Into<String>,
        has_status_field: bool,
    ) -> Self {
        Self {
            doc_type: doc_type.into(),
            title: title.into(),
            has_status_field,
        }
    }
}

/// Rule parameters for a transition. Absent strings deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionParams {
    pub required_type: String,
    pub target_status: String,
    pub title_prefix: String,
    pub enforce_type: bool,
}

impl TransitionParams {
    pub fn new(
        required_type: impl Into<String>,
        target_status: impl Into<String>,
        title_prefix: impl Into<String>,
        enforce_type: bool,
    ) -> Self {
        Self {
            required_type: required_type.into(),
            target_status: target_status.into(),
            title_prefix: title_prefix.into(),
            enforce_type,
        }
    }
}

/// Minimal description of intended mutations. A field is present only when it must change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    new_title: Option<String>,
    new_status: Option<String>,
}

impl Patch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            new_title: Some(title.into()),
            new_status: None,
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            new_title: None,
            new_status: Some(status.into()),
        }
    }

    pub fn new_title(&self) -> Option<&str> {
        self.new_title.as_deref()
    }

    pub fn new_status(&self) -> Option<&str> {
        self.new_status.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.new_title.is_none() && self.new_status.is_none()
    }

    /// Right-biased override: fields present in `other` win.
    pub fn merge(self, other: Patch) -> Patch {
        Patch {
            new_title: other.new_title.or(self.new_title),
            new_status: other.new_status.or(self.new_status),
        }
    }
}

/// Plan the patch for `view` under `params`.
///
/// Fails with `ErrorCategory::InvalidType` when `enforce_type` is set and the view's type
/// differs from `required_type`.
pub fn plan(view: &DocumentView, params: &TransitionParams) -> Result<Patch, AppError> {
    if params.enforce_type && view.doc_type != params.required_type {
        return Err(AppError::invalid_type(&params.required_type)
            .with_context("actual_type", view.doc_type.as_str()));
    }

    let title_patch =
        if params.title_prefix.trim().is_empty() || view.title.starts_with(&params.title_prefix) {
            Patch::empty()
        } else {
            Patch::title(format!("{}{}", params.title_prefix, view.title))
        };

    let status_patch = if view.has_status_field {
        Patch::status(params.target_status.clone())
    } else {
        Patch::empty()
    };

    Ok(title_patch.merge(status_patch))
}
