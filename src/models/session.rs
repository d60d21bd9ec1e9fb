use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

/// A collaboration instance created from an accepted offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub request_id: Uuid,
    pub offer_id: Uuid,
    pub helper_id: Uuid,
    pub requester_id: Uuid,
    pub status: SessionStatus,
    pub scheduled_start: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
}

impl Session {
    pub fn new(
        request_id: Uuid,
        offer_id: Uuid,
        helper_id: Uuid,
        requester_id: Uuid,
        scheduled_start: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            offer_id,
            helper_id,
            requester_id,
            status: SessionStatus::Scheduled,
            scheduled_start,
            actual_start: None,
            end_time: None,
            duration_minutes: None,
            notes: None,
        }
    }

    /// Minutes between the session start and `until`, clamped to zero.
    /// Falls back to the scheduled start when the session never went active.
    pub fn elapsed_minutes(&self, until: DateTime<Utc>) -> u32 {
        let start = self.actual_start.unwrap_or(self.scheduled_start);
        (until - start).num_minutes().max(0) as u32
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.helper_id == user_id || self.requester_id == user_id
    }
}
