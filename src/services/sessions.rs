use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::events::{EventBus, MarketEvent};
use crate::models::{
    Message, MessageKind, Notification, NotificationKind, Request, RequestStatus, Session,
    SessionStatus,
};
use crate::storage::{Storage, StoreKey};
use crate::Result;

use super::{push_notification, LatencySimulator};

#[derive(Clone)]
pub struct SessionService {
    storage: Storage,
    events: EventBus<MarketEvent>,
    latency: LatencySimulator,
}

impl SessionService {
    pub fn new(storage: Storage, events: EventBus<MarketEvent>, latency: LatencySimulator) -> Self {
        Self {
            storage,
            events,
            latency,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Session> {
        self.latency.read().await;

        let sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        sessions
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ServiceError::SessionNotFound(id).into())
    }

    /// Sessions where the user is either the helper or the requester.
    pub async fn list_for_user(&self, user_id: Uuid) -> Vec<Session> {
        self.latency.read().await;

        let mut sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        sessions.retain(|s| s.involves(user_id));
        sessions.sort_by(|a, b| b.scheduled_start.cmp(&a.scheduled_start));
        sessions
    }

    /// Marks the session active and stamps the actual start time.
    pub async fn start(&self, id: Uuid) -> Result<Session> {
        self.latency.write().await;

        let mut sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ServiceError::SessionNotFound(id))?;

        session.status = SessionStatus::Active;
        session.actual_start = Some(Utc::now());
        let started = session.clone();
        self.storage.store_list(StoreKey::Sessions, &sessions).await;

        info!("Started session {}", id);
        self.events.emit(MarketEvent::SessionStarted(started.clone())).await;

        Ok(started)
    }

    /// Completes the session and its parent request. The session array is
    /// written before the request array; there is no rollback if the parent
    /// request has gone missing in between.
    pub async fn end(&self, id: Uuid, notes: Option<String>) -> Result<Session> {
        self.latency.write().await;

        let now = Utc::now();

        let mut sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ServiceError::SessionNotFound(id))?;

        session.status = SessionStatus::Completed;
        session.end_time = Some(now);
        session.duration_minutes = Some(session.elapsed_minutes(now));
        if notes.is_some() {
            session.notes = notes;
        }
        let ended = session.clone();
        self.storage.store_list(StoreKey::Sessions, &sessions).await;

        let request = self
            .flip_request_status(ended.request_id, RequestStatus::Completed)
            .await?;

        push_notification(
            &self.storage,
            Notification::new(
                ended.requester_id,
                NotificationKind::SessionEnded,
                "Session complete".to_string(),
                format!("Your session for \"{}\" has ended", request.title),
            ),
        )
        .await;

        info!(
            "Ended session {} after {} minutes",
            id,
            ended.duration_minutes.unwrap_or(0)
        );
        self.events.emit(MarketEvent::SessionEnded(ended.clone())).await;
        self.events.emit(MarketEvent::RequestUpdated(request)).await;

        Ok(ended)
    }

    /// Cancels the session and reopens its parent request.
    pub async fn cancel(&self, id: Uuid) -> Result<Session> {
        self.latency.write().await;

        let mut sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ServiceError::SessionNotFound(id))?;

        session.status = SessionStatus::Cancelled;
        session.end_time = Some(Utc::now());
        let cancelled = session.clone();
        self.storage.store_list(StoreKey::Sessions, &sessions).await;

        let request = self
            .flip_request_status(cancelled.request_id, RequestStatus::Open)
            .await?;

        push_notification(
            &self.storage,
            Notification::new(
                cancelled.requester_id,
                NotificationKind::SessionCancelled,
                "Session cancelled".to_string(),
                format!("Your session for \"{}\" was cancelled", request.title),
            ),
        )
        .await;

        info!("Cancelled session {}", id);
        self.events.emit(MarketEvent::SessionCancelled(cancelled.clone())).await;
        self.events.emit(MarketEvent::RequestUpdated(request)).await;

        Ok(cancelled)
    }

    pub async fn send_message(
        &self,
        session_id: Uuid,
        sender_id: Uuid,
        content: String,
        kind: MessageKind,
    ) -> Result<Message> {
        self.latency.write().await;

        let sessions: Vec<Session> = self.storage.load_list(StoreKey::Sessions).await;
        if !sessions.iter().any(|s| s.id == session_id) {
            return Err(ServiceError::SessionNotFound(session_id).into());
        }

        let message = Message::new(session_id, sender_id, content, kind);
        let mut messages: Vec<Message> = self.storage.load_list(StoreKey::Messages).await;
        messages.push(message.clone());
        self.storage.store_list(StoreKey::Messages, &messages).await;

        Ok(message)
    }

    pub async fn messages(&self, session_id: Uuid) -> Vec<Message> {
        self.latency.read().await;

        let mut messages: Vec<Message> = self.storage.load_list(StoreKey::Messages).await;
        messages.retain(|m| m.session_id == session_id);
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        messages
    }

    async fn flip_request_status(&self, request_id: Uuid, status: RequestStatus) -> Result<Request> {
        let mut requests: Vec<Request> = self.storage.load_list(StoreKey::Requests).await;
        let request = requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(ServiceError::RequestNotFound(request_id))?;

        request.status = status;
        request.updated_at = Utc::now();
        let updated = request.clone();
        self.storage.store_list(StoreKey::Requests, &requests).await;

        Ok(updated)
    }
}
