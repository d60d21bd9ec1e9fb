use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
}

/// A helper's proposal to fulfill a request. Accepting one offer declines
/// every sibling offer on the same request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub request_id: Uuid,
    pub offered_by: Uuid,
    pub message: String,
    pub proposed_time: Option<DateTime<Utc>>,
    pub proposed_rate: Option<u32>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn new(request_id: Uuid, offered_by: Uuid, message: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request_id,
            offered_by,
            message,
            proposed_time: None,
            proposed_rate: None,
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }
}
