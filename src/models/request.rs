use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How soon the requester needs help. Sort order puts `Critical` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    /// Lower rank sorts earlier when ordering by urgency.
    pub fn rank(&self) -> u8 {
        match self {
            Urgency::Critical => 0,
            Urgency::Normal => 1,
            Urgency::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    Async,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    Hourly,
    Fixed,
}

/// Request lifecycle: `open -> in_progress -> completed`, with
/// `in_progress -> open` when a session is cancelled. `completed` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

/// A posted help-wanted item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub duration_hours: u32,
    pub urgency: Urgency,
    pub mode: RequestMode,
    pub budget: Option<u32>,
    pub budget_type: BudgetType,
    pub status: RequestStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    pub fn new(title: String, description: String, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            tags: Vec::new(),
            duration_hours: 1,
            urgency: Urgency::Normal,
            mode: RequestMode::Async,
            budget: None,
            budget_type: BudgetType::Fixed,
            status: RequestStatus::Open,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when any of the request's tags matches any filter tag,
    /// case-insensitively.
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        self.tags
            .iter()
            .any(|t| tags.iter().any(|f| t.eq_ignore_ascii_case(f)))
    }
}
