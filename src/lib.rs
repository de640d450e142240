pub mod cli;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::Config;
use crate::error::Result;
use crate::routes::Navigation;
use crate::services::{
    api_client::{Gateway, HttpGateway},
    jobs_service::RecruitmentStore,
    notification_service::NotificationService,
    session_service::{SessionState, SessionStore},
    session_storage::{DurableStorage, FileStorage},
    Subscription,
};

/// Everything a page needs, wired once per client instance.
#[derive(Clone)]
pub struct Portal {
    pub session: Arc<SessionStore>,
    pub store: Arc<RecruitmentStore>,
    pub notifications: NotificationService,
    storage: Arc<dyn DurableStorage>,
    sync_interval: Duration,
}

impl Portal {
    /// Builds a client whose session lives in the configured session file.
    pub fn new(config: &Config) -> Result<Self> {
        let storage = FileStorage::open(&config.session_file)?;
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: &Config, storage: Arc<dyn DurableStorage>) -> Result<Self> {
        let (state, receiver) = SessionStore::channel();
        let gateway = Arc::new(HttpGateway::new(config, receiver)?);
        Ok(Self::assemble(
            gateway,
            storage,
            state,
            config.session_sync_interval,
        ))
    }

    pub fn assemble(
        gateway: Arc<dyn Gateway>,
        storage: Arc<dyn DurableStorage>,
        state: watch::Sender<SessionState>,
        sync_interval: Duration,
    ) -> Self {
        let notifications = NotificationService::default();
        let receiver = state.subscribe();
        let session = Arc::new(SessionStore::new(
            Arc::clone(&gateway),
            Arc::clone(&storage),
            notifications.clone(),
            state,
        ));
        let store = Arc::new(RecruitmentStore::new(
            gateway,
            receiver,
            notifications.clone(),
        ));

        Self {
            session,
            store,
            notifications,
            storage,
            sync_interval,
        }
    }

    /// Restores the session and starts the background listeners. They stop
    /// when the returned subscriptions are dropped.
    pub fn start(&self) -> Vec<Subscription> {
        self.session.bootstrap();
        let mut subscriptions = vec![self.session.watch_storage(), self.store.watch_identity()];
        if let Some(watcher) = self.storage.watch_external(self.sync_interval) {
            subscriptions.push(watcher);
        }
        subscriptions
    }

    /// One-shot variant of [`Portal::start`]: restore and load, no listeners.
    pub async fn load(&self) -> SessionState {
        let state = self.session.bootstrap();
        self.store.refresh().await;
        state
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        routes::resolve(path, &self.session.state())
    }
}
