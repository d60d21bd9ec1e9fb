//! Entity services for the MicroCollab data layer
//!
//! CRUD-shaped operations over the arrays held in [`Storage`]. Each
//! operation reads the full array for its entity, mutates it in memory and
//! writes the whole array back, then emits a [`MarketEvent`]. Cross-entity
//! flows run sequentially with no atomicity; a failure mid-sequence leaves
//! the stores as they were at that point.

mod offers;
mod requests;
mod sessions;
mod users;

pub use offers::{NewOffer, OfferService};
pub use requests::{NewRequest, RequestDetail, RequestFilter, RequestPatch, RequestService, RequestSort};
pub use sessions::SessionService;
pub use users::{AuthState, UserPatch, UserService};

use std::time::Duration;

use rand::Rng;

use crate::config::LatencyConfig;
use crate::models::Notification;
use crate::storage::{Storage, StoreKey};

/// Artificial latency applied ahead of every operation, emulating network
/// round trips for UI loading states. Ranges are per operation class.
#[derive(Debug, Clone)]
pub struct LatencySimulator {
    config: LatencyConfig,
}

impl LatencySimulator {
    pub fn new(config: LatencyConfig) -> Self {
        Self { config }
    }

    /// No delays at all; the default for tests.
    pub fn disabled() -> Self {
        Self {
            config: LatencyConfig {
                enabled: false,
                read_min_ms: 0,
                read_max_ms: 0,
                write_min_ms: 0,
                write_max_ms: 0,
                delete_min_ms: 0,
                delete_max_ms: 0,
            },
        }
    }

    pub async fn read(&self) {
        self.delay(self.config.read_min_ms, self.config.read_max_ms)
            .await;
    }

    pub async fn write(&self) {
        self.delay(self.config.write_min_ms, self.config.write_max_ms)
            .await;
    }

    pub async fn delete(&self) {
        self.delay(self.config.delete_min_ms, self.config.delete_max_ms)
            .await;
    }

    async fn delay(&self, min_ms: u64, max_ms: u64) {
        if !self.config.enabled || max_ms == 0 {
            return;
        }
        let ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(min_ms..=max_ms.max(min_ms))
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Appends a notification to the notifications array.
pub(crate) async fn push_notification(storage: &Storage, notification: Notification) {
    let mut notifications: Vec<Notification> = storage.load_list(StoreKey::Notifications).await;
    notifications.push(notification);
    storage.store_list(StoreKey::Notifications, &notifications).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_disabled_latency_is_instant() {
        let latency = LatencySimulator::disabled();
        let started = Instant::now();
        tokio_test::block_on(async {
            latency.read().await;
            latency.write().await;
            latency.delete().await;
        });
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_latency_within_configured_range() {
        let latency = LatencySimulator::new(LatencyConfig {
            enabled: true,
            read_min_ms: 10,
            read_max_ms: 30,
            write_min_ms: 0,
            write_max_ms: 0,
            delete_min_ms: 0,
            delete_max_ms: 0,
        });

        let started = Instant::now();
        latency.read().await;
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
