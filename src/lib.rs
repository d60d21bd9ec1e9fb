pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod models;
pub mod seed;
pub mod services;
pub mod storage;

use std::sync::Arc;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use demo::DemoSimulator;
pub use events::{EventBus, MarketEvent};
pub use services::{
    LatencySimulator, OfferService, RequestService, SessionService, UserService,
};
pub use storage::{Storage, StoreKey};

use crate::config::Backend;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

/// Application state shared across all components.
///
/// An explicit, injectable container in place of module-level singletons:
/// construct one per process (or per test) and drop it to tear everything
/// down.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub storage: Storage,
    pub events: EventBus<MarketEvent>,
    pub requests: RequestService,
    pub offers: OfferService,
    pub sessions: SessionService,
    pub users: UserService,
    pub demo: Arc<DemoSimulator>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        if config.backend == Backend::Remote {
            return Err(AppError::ConfigError(
                "the remote backend is not implemented; set backend to \"mock\"".to_string(),
            ));
        }

        let backend: Arc<dyn KeyValueStore> = match config.storage.driver.as_str() {
            "memory" => match config.storage.quota_bytes {
                Some(quota) => Arc::new(MemoryStore::with_quota(quota as usize)),
                None => Arc::new(MemoryStore::new()),
            },
            "file" => Arc::new(FileStore::open(&config.storage.path).await?),
            other => {
                return Err(AppError::ConfigError(format!(
                    "unknown storage driver: {}",
                    other
                )))
            }
        };

        let storage = Storage::new(backend, config.storage.namespace.clone());
        let events: EventBus<MarketEvent> = EventBus::new();
        let latency = LatencySimulator::new(config.latency.clone());

        let requests = RequestService::new(storage.clone(), events.clone(), latency.clone());
        let offers = OfferService::new(storage.clone(), events.clone(), latency.clone());
        let sessions = SessionService::new(storage.clone(), events.clone(), latency.clone());
        let users = UserService::new(storage.clone(), events.clone(), latency);

        let demo = Arc::new(DemoSimulator::new(config.simulation.clone()));

        Ok(Self {
            config: Arc::new(config),
            storage,
            events,
            requests,
            offers,
            sessions,
            users,
            demo,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.demo.stop().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_creation() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).await.expect("Failed to build state");

        assert_eq!(state.events.subscriber_count().await, 0);
        assert!(!state.demo.is_running().await);
    }

    #[tokio::test]
    async fn test_remote_backend_is_rejected() {
        let mut config = Settings::new_for_test().expect("Failed to load test config");
        config.backend = Backend::Remote;

        match AppState::new(config).await {
            Err(AppError::ConfigError(_)) => {}
            other => panic!("Expected a config error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_unknown_storage_driver_is_rejected() {
        let mut config = Settings::new_for_test().expect("Failed to load test config");
        config.storage.driver = "redis".to_string();

        assert!(matches!(
            AppState::new(config).await,
            Err(AppError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_app_state_clone_shares_config() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).await.expect("Failed to build state");

        let cloned = state.clone();

        // Verify Arc references are shared
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.demo, &cloned.demo));
    }
}
