//! Event module for the MicroCollab data layer
//!
//! An in-process typed publish/subscribe bus standing in for browser custom
//! events: same-process only, best-effort delivery, no replay.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Offer, Request, Session, User};

/// A live subscription. Dropping the receiver ends it; the bus prunes the
/// dead sender on the next emit.
pub struct Subscription<E> {
    pub id: Uuid,
    pub receiver: mpsc::UnboundedReceiver<E>,
}

pub struct EventBus<E> {
    subscribers: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<E>>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, tx);
        info!("Added subscriber {} to event bus", id);
        Subscription { id, receiver: rx }
    }

    pub async fn unsubscribe(&self, id: &Uuid) -> bool {
        let removed = self.subscribers.write().await.remove(id).is_some();
        if removed {
            info!("Removed subscriber {} from event bus", id);
        }
        removed
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

impl<E: Clone> EventBus<E> {
    /// Delivers `event` to every live subscriber, pruning any whose
    /// receiver has been dropped.
    pub async fn emit(&self, event: E) {
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, sender) in subscribers.iter() {
                if sender.send(event.clone()).is_err() {
                    warn!("Dropping closed subscriber {}", id);
                    dead.push(*id);
                }
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }
}

/// One variant per marketplace event, carrying the affected entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MarketEvent {
    #[serde(rename = "request:created")]
    RequestCreated(Request),
    #[serde(rename = "request:updated")]
    RequestUpdated(Request),
    #[serde(rename = "request:deleted")]
    RequestDeleted(Request),
    #[serde(rename = "offer:created")]
    OfferCreated(Offer),
    #[serde(rename = "offer:updated")]
    OfferUpdated(Offer),
    #[serde(rename = "offer:accepted")]
    OfferAccepted(Offer),
    #[serde(rename = "offer:declined")]
    OfferDeclined(Offer),
    #[serde(rename = "session:created")]
    SessionCreated(Session),
    #[serde(rename = "session:started")]
    SessionStarted(Session),
    #[serde(rename = "session:ended")]
    SessionEnded(Session),
    #[serde(rename = "session:cancelled")]
    SessionCancelled(Session),
    #[serde(rename = "user:updated")]
    UserUpdated(User),
}

impl MarketEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MarketEvent::RequestCreated(_) => "request:created",
            MarketEvent::RequestUpdated(_) => "request:updated",
            MarketEvent::RequestDeleted(_) => "request:deleted",
            MarketEvent::OfferCreated(_) => "offer:created",
            MarketEvent::OfferUpdated(_) => "offer:updated",
            MarketEvent::OfferAccepted(_) => "offer:accepted",
            MarketEvent::OfferDeclined(_) => "offer:declined",
            MarketEvent::SessionCreated(_) => "session:created",
            MarketEvent::SessionStarted(_) => "session:started",
            MarketEvent::SessionEnded(_) => "session:ended",
            MarketEvent::SessionCancelled(_) => "session:cancelled",
            MarketEvent::UserUpdated(_) => "user:updated",
        }
    }
}
