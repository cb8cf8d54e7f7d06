//! Dependency initialization and wiring for the answerboard service.
use std::sync::Arc;

use answerboard_ledger::{
    AcceptanceService, ContentService, NotificationDispatcher, NotificationInbox, VoteService,
};
use answerboard_repository::{
    InMemoryRepository, NotificationRepository, PostgresRepository, QuestionRepository,
    VotableRepository,
};
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::errors::ServerError;
use crate::server::state::AppState;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Services shared by the request handlers.
    pub state: AppState,
    /// Background task persisting notifications. Must be spawned by the caller.
    pub dispatcher: NotificationDispatcher,
}

impl Dependencies {
    /// Connects the configured storage backend and builds the services on top
    /// of it.
    ///
    /// For the postgres backend, pending migrations are applied first.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServerError)` - If the database cannot be reached or migrated
    pub async fn new(config: &Config) -> Result<Self, ServerError> {
        match &config.storage {
            StorageBackend::Postgres { database_url } => {
                let repository =
                    PostgresRepository::connect(database_url, config.database_max_connections).await?;
                repository.migrate().await?;
                info!("PostgreSQL repository ready");
                Ok(Self::wire(Arc::new(repository), config))
            }
            StorageBackend::Memory => {
                info!("Using in-memory repository");
                Ok(Self::wire(Arc::new(InMemoryRepository::new()), config))
            }
        }
    }

    /// Builds the services over a single repository implementing every
    /// storage interface.
    pub fn wire<R>(repository: Arc<R>, config: &Config) -> Self
    where
        R: VotableRepository + QuestionRepository + NotificationRepository + 'static,
    {
        let (dispatcher, emitter) =
            NotificationDispatcher::new(repository.clone(), config.notification_queue_capacity);

        let votes = VoteService::new(repository.clone(), emitter.clone())
            .with_max_retries(config.vote_max_retries);
        let acceptance = AcceptanceService::new(repository.clone(), emitter)
            .with_max_retries(config.vote_max_retries);
        let content = ContentService::new(repository.clone());
        let inbox = NotificationInbox::new(repository);

        Self {
            state: AppState {
                votes: Arc::new(votes),
                acceptance: Arc::new(acceptance),
                content: Arc::new(content),
                inbox: Arc::new(inbox),
            },
            dispatcher,
        }
    }
}
