use contractflow::core::config::loader::CONFIG_FILE_NAME;
use contractflow::core::config::{ConfigLoader, ConfigValidator, ContractflowConfig};
use contractflow::core::types::ErrorCategory;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "CONTRACTFLOW_CONTRACT_TYPE",
    "CONTRACTFLOW_STATUS_FIELD",
    "CONTRACTFLOW_SUBMIT_TITLE_PREFIX",
    "CONTRACTFLOW_SUBMIT_ENFORCE_TYPE",
    "CONTRACTFLOW_WEBHOOK_URL",
    "CONTRACTFLOW_WEBHOOK_TIMEOUT_SECONDS",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, content: &str) {
    fs::write(dir.path().join(CONFIG_FILE_NAME), content).unwrap();
}

#[test]
#[serial]
fn test_full_config_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
[contract]
doc_type = "Agreement"
status_field = "agreement:state"
creation_title_prefix = "[NEW] "

[submit]
required_type = "Agreement"
target_status = "In Review"
title_prefix = "[REVIEW] "
enforce_type = false

[change_status]
required_type = "Agreement"
target_status = "Rejected"
only_if_current_status = "In Review"

[notification]
webhook_url = "https://hooks.example.com/approved"
timeout_seconds = 3
"#,
    );

    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(config.contract.doc_type, "Agreement");
    assert_eq!(config.contract.status_field, "agreement:state");
    assert_eq!(config.contract.creation_title_prefix, "[NEW] ");
    assert!(!config.submit.enforce_type);
    assert_eq!(config.submit.title_prefix, "[REVIEW] ");
    assert_eq!(config.change_status.target_status, "Rejected");
    assert_eq!(config.change_status.only_if_current_status, "In Review");
    assert!(config.change_status.enforce_type);
    assert_eq!(config.notification.timeout_seconds, 3);
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config = ConfigLoader::load_from_workspace(dir.path()).unwrap();
    assert_eq!(config, ContractflowConfig::default());
    assert_eq!(ConfigLoader::load_from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap(), None);
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var("CONTRACTFLOW_CONTRACT_TYPE", "Agreement");
    env::set_var("CONTRACTFLOW_STATUS_FIELD", "agreement:state");
    env::set_var("CONTRACTFLOW_SUBMIT_TITLE_PREFIX", "");
    env::set_var("CONTRACTFLOW_WEBHOOK_TIMEOUT_SECONDS", "0");
    env::set_var("CONTRACTFLOW_SUBMIT_ENFORCE_TYPE", "not-a-bool");

    let config = ConfigLoader::load_from_workspace(dir.path());
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.contract.doc_type, "Agreement");
    assert_eq!(config.contract.status_field, "agreement:state");
    assert_eq!(config.submit.title_prefix, "");
    assert!(config.submit.enforce_type, "unparsable bool keeps the default");
    assert_eq!(config.notification.timeout(), None);
}

#[test]
#[serial]
fn test_invalid_webhook_from_env_fails_validation() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var("CONTRACTFLOW_WEBHOOK_URL", "not a url");
    let result = ConfigLoader::load_from_workspace(dir.path());
    clear_env();

    let err = result.unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
    assert!(err.message.contains("webhook_url"));
}

#[test]
#[serial]
fn test_bad_status_literal_in_file_fails() {
    clear_env();
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[submit]\ntarget_status = \"in review\"\n");
    let err = ConfigLoader::load_from_workspace(dir.path()).unwrap_err();
    assert!(err.message.contains("submit.target_status"));
}

#[test]
fn test_validator_accepts_all_lifecycle_literals() {
    for status in ["Draft", "In Review", "Approved", "Rejected"] {
        assert!(ConfigValidator::validate_status("k", status).is_ok());
    }
    assert!(ConfigValidator::validate_status("k", "").is_err());
}

#[test]
fn test_env_var_documentation_lists_overrides() {
    let docs = ConfigLoader::env_var_documentation();
    for var in ENV_VARS {
        assert!(docs.iter().any(|line| line.starts_with(var)), "{} undocumented", var);
    }
}
