pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod jobs;
pub mod lifecycle;
pub mod listeners;
pub mod notification;
pub mod operations;
pub mod planner;
pub mod repository;
pub mod rules;
pub mod session;
pub mod types;

pub use config::{ConfigLoader, ContractflowConfig};
pub use document::{Document, DocumentHandle, SessionContext};
pub use error::AppError;
pub use events::{Commit, DocumentEvent, DocumentEventKind, EventBus, Veto};
pub use jobs::{Job, JobQueue, JobScheduler, ScheduleOutcome};
pub use lifecycle::ContractLifecycle;
pub use planner::{plan, DocumentView, Patch, TransitionParams};
pub use repository::{DocumentRepository, InMemoryRepository};
pub use session::CoreSession;
pub use types::*;
