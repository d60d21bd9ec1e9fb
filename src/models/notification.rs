use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OfferReceived,
    OfferAccepted,
    OfferDeclined,
    SessionScheduled,
    SessionStarted,
    SessionEnded,
    SessionCancelled,
    RequestCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: Uuid, kind: NotificationKind, title: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title,
            content,
            link: None,
            read: false,
            created_at: Utc::now(),
        }
    }
}
