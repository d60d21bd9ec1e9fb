use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Requester,
    Helper,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub timezone: String,
    pub availability_status: AvailabilityStatus,
    pub avatar_url: String,
    pub rating: f64,
    pub sessions_completed: u32,
    pub hourly_rate: Option<u32>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            bio: String::new(),
            skills: Vec::new(),
            timezone: "UTC".to_string(),
            availability_status: AvailabilityStatus::Available,
            avatar_url: String::new(),
            rating: 0.0,
            sessions_completed: 0,
            hourly_rate: None,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}
