use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Code,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(session_id: Uuid, sender_id: Uuid, content: String, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            sender_id,
            content,
            kind,
            created_at: Utc::now(),
        }
    }
}
