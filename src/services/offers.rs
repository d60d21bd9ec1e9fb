use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::events::{EventBus, MarketEvent};
use crate::models::{
    Notification, NotificationKind, Offer, OfferStatus, Request, RequestStatus, Session,
};
use crate::storage::{Storage, StoreKey};
use crate::Result;

use super::{push_notification, LatencySimulator};

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub request_id: Uuid,
    pub offered_by: Uuid,
    pub message: String,
    pub proposed_time: Option<DateTime<Utc>>,
    pub proposed_rate: Option<u32>,
}

#[derive(Clone)]
pub struct OfferService {
    storage: Storage,
    events: EventBus<MarketEvent>,
    latency: LatencySimulator,
}

impl OfferService {
    pub fn new(storage: Storage, events: EventBus<MarketEvent>, latency: LatencySimulator) -> Self {
        Self {
            storage,
            events,
            latency,
        }
    }

    pub async fn list_for_request(&self, request_id: Uuid) -> Vec<Offer> {
        self.latency.read().await;

        let mut offers: Vec<Offer> = self.storage.load_list(StoreKey::Offers).await;
        offers.retain(|o| o.request_id == request_id);
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        offers
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Vec<Offer> {
        self.latency.read().await;

        let mut offers: Vec<Offer> = self.storage.load_list(StoreKey::Offers).await;
        offers.retain(|o| o.offered_by == user_id);
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        offers
    }

    pub async fn get(&self, id: Uuid) -> Result<Offer> {
        self.latency.read().await;

        let offers: Vec<Offer> = self.storage.load_list(StoreKey::Offers).await;
        offers
            .into_iter()
            .find(|o| o.id == id)
            .ok_or_else(|| ServiceError::OfferNotFound(id).into())
    }

    /// Submits an offer on an open request and notifies the requester.
    pub async fn create(&self, new: NewOffer) -> Result<Offer> {
        self.latency.write().await;

        let requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let request = requests
            .iter()
            .find(|r| r.id == new.request_id)
            .ok_or(ServiceError::RequestNotFound(new.request_id))?;

        if request.status != RequestStatus::Open {
            return Err(ServiceError::Conflict(format!(
                "request {} is not open for offers",
                request.id
            ))
            .into());
        }

        let mut offer = Offer::new(new.request_id, new.offered_by, new.message);
        offer.proposed_time = new.proposed_time;
        offer.proposed_rate = new.proposed_rate;

        let mut offers: Vec<Offer> = self.storage.load_list(StoreKey::Offers).await;
        offers.push(offer.clone());
        self.storage.store_list(StoreKey::Offers, &offers).await;

        push_notification(
            &self.storage,
            Notification::new(
                request.created_by,
                NotificationKind::OfferReceived,
                "New offer".to_string(),
                format!("You received an offer on \"{}\"", request.title),
            ),
        )
        .await;

        info!("Created offer {} on request {}", offer.id, offer.request_id);
        self.events.emit(MarketEvent::OfferCreated(offer.clone())).await;

        Ok(offer)
    }

    /// Accepts an offer: the offer becomes `accepted`, every sibling offer
    /// on the same request becomes `declined`, the request moves to
    /// `in_progress`, and exactly one session is created from the offer.
    ///
    /// The steps run sequentially over separate arrays with no rollback; a
    /// failure partway leaves the earlier writes in place.
    pub async fn accept(&self, offer_id: Uuid) -> Result<Session> {
        self.latency.write().await;

        let mut offers: Vec<Offer> = self.storage.load_list(StoreKey::Offers).await;
        let accepted = offers
            .iter()
            .find(|o| o.id == offer_id)
            .cloned()
            .ok_or(ServiceError::OfferNotFound(offer_id))?;

        if accepted.status != OfferStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "offer {} has already been resolved",
                offer_id
            ))
            .into());
        }

        let now = Utc::now();
        let mut declined = Vec::new();
        for offer in offers.iter_mut() {
            if offer.request_id != accepted.request_id {
                continue;
            }
            if offer.id == offer_id {
                offer.status = OfferStatus::Accepted;
                offer.updated_at = now;
            } else if offer.status == OfferStatus::Pending {
                offer.status = OfferStatus::Declined;
                offer.updated_at = now;
                declined.push(offer.clone());
            }
        }
        let accepted = offers
            .iter()
            .find(|o| o.id == offer_id)
            .cloned()
            .ok_or(ServiceError::OfferNotFound(offer_id))?;
        self.storage.store_list(StoreKey::Offers, &offers).await;

        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == accepted.request_id)
            .ok_or(ServiceError::RequestNotFound(accepted.request_id))?;
        request.status = RequestStatus::InProgress;
        request.updated_at = now;
        let request = request.clone();
        self.storage.store_list(StoreKey::Requests, &requests).await;

        let session = Session::new(
            request.id,
            accepted.id,
            accepted.offered_by,
            request.created_by,
            accepted.proposed_time.unwrap_or(now),
        );
        let mut sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        sessions.push(session.clone());
        self.storage.store_list(StoreKey::Sessions, &sessions).await;

        push_notification(
            &self.storage,
            Notification::new(
                accepted.offered_by,
                NotificationKind::OfferAccepted,
                "Offer accepted".to_string(),
                format!("Your offer on \"{}\" was accepted", request.title),
            ),
        )
        .await;

        info!(
            "Accepted offer {} on request {}; session {} scheduled",
            accepted.id, request.id, session.id
        );

        self.events.emit(MarketEvent::OfferAccepted(accepted)).await;
        for offer in declined {
            self.events.emit(MarketEvent::OfferDeclined(offer)).await;
        }
        self.events.emit(MarketEvent::RequestUpdated(request)).await;
        self.events.emit(MarketEvent::SessionCreated(session.clone())).await;

        Ok(session)
    }

    pub async fn decline(&self, offer_id: Uuid) -> Result<Offer> {
        self.latency.write().await;

        let mut offers: Vec<Offer> = self.storage.load_list(StoreKey::Offers).await;
        let offer = offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or(ServiceError::OfferNotFound(offer_id))?;

        if offer.status != OfferStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "offer {} has already been resolved",
                offer_id
            ))
            .into());
        }

        offer.status = OfferStatus::Declined;
        offer.updated_at = Utc::now();
        let declined = offer.clone();
        self.storage.store_list(StoreKey::Offers, &offers).await;

        push_notification(
            &self.storage,
            Notification::new(
                declined.offered_by,
                NotificationKind::OfferDeclined,
                "Offer declined".to_string(),
                "Your offer was declined".to_string(),
            ),
        )
        .await;

        self.events.emit(MarketEvent::OfferDeclined(declined.clone())).await;

        Ok(declined)
    }
}
