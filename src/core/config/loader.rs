#![allow(clippy::result_large_err)]

use super::{ConfigValidator, ContractflowConfig};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "contractflow.toml";
pub const CODE_CONFIG_READ: &str = "CF-CFG-001";
pub const CODE_CONFIG_PARSE: &str = "CF-CFG-002";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/contractflow.toml)
    /// Environment variables override config file values; the result is validated.
    pub fn load_from_workspace(workspace_path: &Path) -> Result<ContractflowConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let mut config = Self::load_from_file(&config_path)?.unwrap_or_default();

        Self::apply_env_overrides(&mut config);
        ConfigValidator::validate(&config)?;

        tracing::debug!(path = %config_path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<ContractflowConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
            .with_code(CODE_CONFIG_READ)
        })?;

        let config: ContractflowConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code(CODE_CONFIG_PARSE)
        })?;

        Ok(Some(config))
    }

    fn apply_env_overrides(config: &mut ContractflowConfig) {
        if let Ok(doc_type) = env::var("CONTRACTFLOW_CONTRACT_TYPE") {
            config.contract.doc_type = doc_type;
        }

        if let Ok(status_field) = env::var("CONTRACTFLOW_STATUS_FIELD") {
            config.contract.status_field = status_field;
        }

        if let Ok(prefix) = env::var("CONTRACTFLOW_SUBMIT_TITLE_PREFIX") {
            config.submit.title_prefix = prefix;
        }

        if let Ok(enforce) = env::var("CONTRACTFLOW_SUBMIT_ENFORCE_TYPE") {
            if let Ok(enforce) = enforce.parse::<bool>() {
                config.submit.enforce_type = enforce;
            }
        }

        if let Ok(url) = env::var("CONTRACTFLOW_WEBHOOK_URL") {
            config.notification.webhook_url = url;
        }

        if let Ok(timeout) = env::var("CONTRACTFLOW_WEBHOOK_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.notification.timeout_seconds = timeout;
            }
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "CONTRACTFLOW_CONTRACT_TYPE - Override the contract document type (default: Contract)",
            "CONTRACTFLOW_STATUS_FIELD - Override the status field name (default: contract:status)",
            "CONTRACTFLOW_SUBMIT_TITLE_PREFIX - Override the submit title prefix (default: \"[SUBMITTED] \")",
            "CONTRACTFLOW_SUBMIT_ENFORCE_TYPE - Override submit type enforcement (true/false, default: true)",
            "CONTRACTFLOW_WEBHOOK_URL - Override the approval webhook URL (blank disables delivery)",
            "CONTRACTFLOW_WEBHOOK_TIMEOUT_SECONDS - Override the webhook timeout (default: 10, 0 disables)",
        ]
    }
}
