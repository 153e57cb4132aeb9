#![allow(clippy::result_large_err)]

use super::ContractflowConfig;
use crate::core::error::AppError;
use crate::core::types::{ContractStatus, ErrorCategory};

pub const CODE_CONFIG_INVALID: &str = "CF-CFG-003";

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &ContractflowConfig) -> Result<(), AppError> {
        if config.contract.doc_type.trim().is_empty() {
            return Err(invalid("contract.doc_type cannot be empty"));
        }

        if config.contract.status_field.trim().is_empty() {
            return Err(invalid("contract.status_field cannot be empty"));
        }

        Self::validate_status("submit.target_status", &config.submit.target_status)?;
        Self::validate_status(
            "change_status.target_status",
            &config.change_status.target_status,
        )?;
        if !config.change_status.only_if_current_status.trim().is_empty() {
            Self::validate_status(
                "change_status.only_if_current_status",
                &config.change_status.only_if_current_status,
            )?;
        }

        let webhook = config.notification.webhook_url.trim();
        if !webhook.is_empty() {
            let parsed = url::Url::parse(webhook).map_err(|e| {
                invalid(format!("notification.webhook_url is not a valid URL: {}", e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid(format!(
                    "notification.webhook_url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }

    /// Status values must be one of the four lifecycle literals.
    pub fn validate_status(key: &str, value: &str) -> Result<ContractStatus, AppError> {
        value.parse::<ContractStatus>().map_err(|_| {
            invalid(format!(
                "{} must be one of {:?}, got '{}'",
                key,
                ContractStatus::all().map(|s| s.as_str()),
                value
            ))
            .with_context("key", key)
        })
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCategory::ValidationError, message).with_code(CODE_CONFIG_INVALID)
}
