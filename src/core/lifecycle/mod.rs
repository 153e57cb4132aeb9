use crate::core::config::ContractflowConfig;
use crate::core::document::SessionContext;
use crate::core::events::EventBus;
use crate::core::jobs::{JobQueue, JobScheduler};
use crate::core::listeners::register_contract_listeners;
use crate::core::notification::{NotificationDispatcher, ReqwestTransport, WebhookTransport};
use crate::core::operations::{register_builtins, OperationRegistry};
use crate::core::repository::DocumentRepository;
use crate::core::session::CoreSession;
use std::sync::Arc;

/// Process-wide wiring of the contract lifecycle: listeners, job queue, dispatcher and
/// operations over one repository.
#[derive(Clone)]
pub struct ContractLifecycle {
    config: ContractflowConfig,
    repository: Arc<dyn DocumentRepository>,
    events: EventBus,
    jobs: JobQueue,
    dispatcher: NotificationDispatcher,
    operations: OperationRegistry,
}

impl ContractLifecycle {
    /// Wire everything up. Must be called from within a tokio runtime.
    pub fn new(
        config: ContractflowConfig,
        repository: Arc<dyn DocumentRepository>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        let jobs = JobQueue::start();
        let dispatcher = NotificationDispatcher::new(
            repository.clone(),
            transport,
            config.notification.webhook_url.clone(),
            config.contract.status_field.clone(),
        );

        let mut bus = EventBus::builder();
        let scheduler: Arc<dyn JobScheduler> = Arc::new(jobs.clone());
        register_contract_listeners(&mut bus, &config.contract, scheduler, dispatcher.clone());

        let mut operations = OperationRegistry::builder();
        register_builtins(&mut operations, &config);

        tracing::debug!(
            repository = repository.name(),
            webhook_enabled = dispatcher.webhook_enabled(),
            "contract lifecycle initialised"
        );

        Self {
            config,
            repository,
            events: bus.build(),
            jobs,
            dispatcher,
            operations: operations.build(),
        }
    }

    /// Wire up with the `reqwest` transport using the configured timeout.
    pub fn with_http_transport(
        config: ContractflowConfig,
        repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.notification.timeout()));
        Self::new(config, repository, transport)
    }

    pub fn session(&self, context: SessionContext) -> CoreSession {
        CoreSession::new(self.repository.clone(), self.events.clone(), context)
    }

    /// Wait for post-commit listeners of `session` and every job they scheduled.
    pub async fn settle(&self, session: &CoreSession) {
        session.flush_post_commit().await;
        self.jobs.drain().await;
    }

    pub fn config(&self) -> &ContractflowConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn DocumentRepository> {
        &self.repository
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn jobs(&self) -> &JobQueue {
        &self.jobs
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }
}
