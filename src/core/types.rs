use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document type managed by the contract lifecycle.
pub const DOC_TYPE_CONTRACT: &str = "Contract";

/// Property holding the contract lifecycle status.
pub const PROP_CONTRACT_STATUS: &str = "contract:status";

/// Property holding the document title.
pub const PROP_TITLE: &str = "dc:title";

/// Title prefix seeded on newly created contracts.
pub const CREATION_TITLE_PREFIX: &str = "[CONTRACT] ";

/// Title prefix applied when a contract is submitted for approval.
pub const SUBMITTED_TITLE_PREFIX: &str = "[SUBMITTED] ";

/// Contract lifecycle status: Draft -> In Review -> Approved | Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    Draft,
    #[serde(rename = "In Review")]
    InReview,
    Approved,
    Rejected,
}

impl ContractStatus {
    /// Literal value stored in the status property.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "Draft",
            ContractStatus::InReview => "In Review",
            ContractStatus::Approved => "Approved",
            ContractStatus::Rejected => "Rejected",
        }
    }

    pub fn all() -> [ContractStatus; 4] {
        [
            ContractStatus::Draft,
            ContractStatus::InReview,
            ContractStatus::Approved,
            ContractStatus::Rejected,
        ]
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ContractStatus::all()
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| {
                format!(
                    "unknown contract status '{}'; expected one of Draft, In Review, Approved, Rejected",
                    value
                )
            })
    }
}

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ValidationError,
    InvalidType,
    Precondition,
    FieldNotFound,
    NotFound,
    Delivery,
    Vetoed,
    PersistenceError,
    SerializationError,
    IoError,
    InternalError,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}
