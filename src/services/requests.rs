use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, ServiceError};
use crate::events::{EventBus, MarketEvent};
use crate::models::{BudgetType, Request, RequestMode, RequestStatus, Urgency, User};
use crate::storage::{Storage, StoreKey};
use crate::Result;

use super::LatencySimulator;

/// Listing filter. Empty/unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Match when any request tag equals any filter tag (case-insensitive)
    pub tags: Vec<String>,
    pub max_duration_hours: Option<u32>,
    pub urgency: Option<Urgency>,
    pub mode: Option<RequestMode>,
    pub status: Option<RequestStatus>,
    /// Case-insensitive substring over title and description
    pub search: Option<String>,
}

impl RequestFilter {
    fn matches(&self, request: &Request) -> bool {
        if !self.tags.is_empty() && !request.matches_tags(&self.tags) {
            return false;
        }
        if let Some(max) = self.max_duration_hours {
            if request.duration_hours > max {
                return false;
            }
        }
        if let Some(urgency) = self.urgency {
            if request.urgency != urgency {
                return false;
            }
        }
        if let Some(mode) = self.mode {
            if request.mode != mode {
                return false;
            }
        }
        if let Some(status) = self.status {
            if request.status != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystack = format!(
                "{} {}",
                request.title.to_lowercase(),
                request.description.to_lowercase()
            );
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestSort {
    #[default]
    Newest,
    /// Critical first, then normal, then low; newest within a rank
    Urgency,
    /// Highest budget first, unbudgeted requests last
    Budget,
    /// Random shuffle, presented as "best match"
    BestMatch,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub duration_hours: u32,
    pub urgency: Urgency,
    pub mode: RequestMode,
    pub budget: Option<u32>,
    pub budget_type: BudgetType,
    pub created_by: Uuid,
}

/// Partial update; unset fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub duration_hours: Option<u32>,
    pub urgency: Option<Urgency>,
    pub mode: Option<RequestMode>,
    pub budget: Option<u32>,
    pub budget_type: Option<BudgetType>,
}

/// A request joined with its author for detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetail {
    pub request: Request,
    pub author: Option<User>,
}

#[derive(Clone)]
pub struct RequestService {
    storage: Storage,
    events: EventBus<MarketEvent>,
    latency: LatencySimulator,
}

impl RequestService {
    pub fn new(storage: Storage, events: EventBus<MarketEvent>, latency: LatencySimulator) -> Self {
        Self {
            storage,
            events,
            latency,
        }
    }

    pub async fn list(&self, filter: &RequestFilter, sort: RequestSort) -> Vec<Request> {
        self.latency.read().await;

        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        requests.retain(|r| filter.matches(r));

        match sort {
            RequestSort::Newest => {
                requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            RequestSort::Urgency => {
                requests.sort_by(|a, b| {
                    a.urgency
                        .rank()
                        .cmp(&b.urgency.rank())
                        .then(b.created_at.cmp(&a.created_at))
                });
            }
            RequestSort::Budget => {
                requests.sort_by(|a, b| b.budget.cmp(&a.budget));
            }
            RequestSort::BestMatch => {
                requests.shuffle(&mut rand::thread_rng());
            }
        }

        requests
    }

    /// Fetches one request enriched with its author record.
    pub async fn get(&self, id: Uuid) -> Result<RequestDetail> {
        self.latency.read().await;

        let requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let request = requests
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(ServiceError::RequestNotFound(id))?;

        let users: Vec<User> = self.storage.load_list(StoreKey::Users).await;
        let author = users.into_iter().find(|u| u.id == request.created_by);

        Ok(RequestDetail { request, author })
    }

    pub async fn create(&self, new: NewRequest) -> Result<Request> {
        if new.title.trim().is_empty() {
            return Err(AppError::ValidationError("request title is empty".into()));
        }

        self.latency.write().await;

        let mut request = Request::new(new.title, new.description, new.created_by);
        request.tags = new.tags;
        request.duration_hours = new.duration_hours;
        request.urgency = new.urgency;
        request.mode = new.mode;
        request.budget = new.budget;
        request.budget_type = new.budget_type;

        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        requests.push(request.clone());
        self.storage.store_list(StoreKey::Requests, &requests).await;

        info!("Created request {} \"{}\"", request.id, request.title);
        self.events.emit(MarketEvent::RequestCreated(request.clone())).await;

        Ok(request)
    }

    pub async fn update(&self, id: Uuid, patch: RequestPatch) -> Result<Request> {
        self.latency.write().await;

        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ServiceError::RequestNotFound(id))?;

        if let Some(title) = patch.title {
            request.title = title;
        }
        if let Some(description) = patch.description {
            request.description = description;
        }
        if let Some(tags) = patch.tags {
            request.tags = tags;
        }
        if let Some(duration_hours) = patch.duration_hours {
            request.duration_hours = duration_hours;
        }
        if let Some(urgency) = patch.urgency {
            request.urgency = urgency;
        }
        if let Some(mode) = patch.mode {
            request.mode = mode;
        }
        if let Some(budget) = patch.budget {
            request.budget = Some(budget);
        }
        if let Some(budget_type) = patch.budget_type {
            request.budget_type = budget_type;
        }
        request.updated_at = Utc::now();

        let updated = request.clone();
        self.storage.store_list(StoreKey::Requests, &requests).await;

        self.events.emit(MarketEvent::RequestUpdated(updated.clone())).await;

        Ok(updated)
    }

    /// Writes `status` without checking the transition, as the original
    /// data layer does.
    pub async fn set_status(&self, id: Uuid, status: RequestStatus) -> Result<Request> {
        self.latency.write().await;

        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ServiceError::RequestNotFound(id))?;

        request.status = status;
        request.updated_at = Utc::now();

        let updated = request.clone();
        self.storage.store_list(StoreKey::Requests, &requests).await;

        self.events.emit(MarketEvent::RequestUpdated(updated.clone())).await;

        Ok(updated)
    }

    /// Removes the request. Offers and sessions that reference it are left
    /// in place; there is no cascade.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.latency.delete().await;

        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let position = requests
            .iter()
            .position(|r| r.id == id)
            .ok_or(ServiceError::RequestNotFound(id))?;

        let removed = requests.remove(position);
        self.storage.store_list(StoreKey::Requests, &requests).await;

        info!("Deleted request {}", id);
        self.events.emit(MarketEvent::RequestDeleted(removed)).await;

        Ok(())
    }
}
