pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

use crate::core::planner::TransitionParams;
use crate::core::types::{
    ContractStatus, CREATION_TITLE_PREFIX, DOC_TYPE_CONTRACT, PROP_CONTRACT_STATUS,
    SUBMITTED_TITLE_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration loaded from contractflow.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContractflowConfig {
    #[serde(default)]
    pub contract: ContractConfig,

    /// Defaults for submit-for-approval
    #[serde(default)]
    pub submit: SubmitConfig,

    /// Defaults for bulk status changes
    #[serde(default)]
    pub change_status: ChangeStatusConfig,

    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Contract document shape used by the lifecycle listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub doc_type: String,
    pub status_field: String,
    /// Prefix the creation listener puts in front of every new contract title
    pub creation_title_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    pub required_type: String,
    pub target_status: String,
    pub title_prefix: String,
    pub enforce_type: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeStatusConfig {
    pub required_type: String,
    pub target_status: String,
    pub enforce_type: bool,
    /// Blank means no filter on the current status
    pub only_if_current_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Approval webhook endpoint; blank disables delivery
    pub webhook_url: String,

    /// Transport timeout for the webhook call
    pub timeout_seconds: u64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        ContractConfig {
            doc_type: DOC_TYPE_CONTRACT.to_string(),
            status_field: PROP_CONTRACT_STATUS.to_string(),
            creation_title_prefix: CREATION_TITLE_PREFIX.to_string(),
        }
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        SubmitConfig {
            required_type: DOC_TYPE_CONTRACT.to_string(),
            target_status: ContractStatus::InReview.to_string(),
            title_prefix: SUBMITTED_TITLE_PREFIX.to_string(),
            enforce_type: true,
        }
    }
}

impl Default for ChangeStatusConfig {
    fn default() -> Self {
        ChangeStatusConfig {
            required_type: DOC_TYPE_CONTRACT.to_string(),
            target_status: ContractStatus::Approved.to_string(),
            enforce_type: true,
            only_if_current_status: String::new(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            webhook_url: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl SubmitConfig {
    pub fn transition_params(&self) -> TransitionParams {
        TransitionParams::new(
            self.required_type.clone(),
            self.target_status.clone(),
            self.title_prefix.clone(),
            self.enforce_type,
        )
    }
}

impl NotificationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}
