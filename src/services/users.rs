use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::events::{EventBus, MarketEvent};
use crate::models::{AvailabilityStatus, User};
use crate::storage::{Storage, StoreKey};
use crate::Result;

use super::LatencySimulator;

/// Mock sign-in record kept under the `auth` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub user_id: Uuid,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub avatar_url: Option<String>,
    pub hourly_rate: Option<u32>,
}

#[derive(Clone)]
pub struct UserService {
    storage: Storage,
    events: EventBus<MarketEvent>,
    latency: LatencySimulator,
}

impl UserService {
    pub fn new(storage: Storage, events: EventBus<MarketEvent>, latency: LatencySimulator) -> Self {
        Self {
            storage,
            events,
            latency,
        }
    }

    pub async fn list(&self) -> Vec<User> {
        self.latency.read().await;
        self.storage.load_list(StoreKey::Users).await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.latency.read().await;

        let users: Vec<User> = self.storage.load_list(StoreKey::Users).await;
        users
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(|| ServiceError::UserNotFound(id).into())
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.latency.read().await;

        let users: Vec<User> = self.storage.load_list(StoreKey::Users).await;
        users.into_iter().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Mock authentication: looks the account up by email and records the
    /// signed-in user under the `auth` and `current-user` keys.
    pub async fn sign_in(&self, email: &str) -> Result<User> {
        let users: Vec<User> = self.storage.load_list(StoreKey::Users).await;
        let user = users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| ServiceError::EmailNotFound(email.to_string()))?;

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let auth = AuthState {
            user_id: user.id,
            token,
            issued_at: Utc::now(),
        };
        self.storage.set(StoreKey::Auth, &auth).await;
        self.storage.set(StoreKey::CurrentUser, &user).await;

        info!("Signed in {} ({})", user.name, user.email);
        Ok(user)
    }

    pub async fn sign_out(&self) {
        self.storage.remove(StoreKey::Auth).await;
        self.storage.remove(StoreKey::CurrentUser).await;
        info!("Signed out");
    }

    pub async fn current(&self) -> Option<User> {
        self.storage.get(StoreKey::CurrentUser).await
    }

    pub async fn auth_state(&self) -> Option<AuthState> {
        self.storage.get(StoreKey::Auth).await
    }

    pub async fn update_profile(&self, id: Uuid, patch: UserPatch) -> Result<User> {
        self.latency.write().await;

        let mut users: Vec<User> = self.storage.load_list(StoreKey::Users).await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ServiceError::UserNotFound(id))?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(bio) = patch.bio {
            user.bio = bio;
        }
        if let Some(skills) = patch.skills {
            user.skills = skills;
        }
        if let Some(timezone) = patch.timezone {
            user.timezone = timezone;
        }
        if let Some(avatar_url) = patch.avatar_url {
            user.avatar_url = avatar_url;
        }
        if let Some(hourly_rate) = patch.hourly_rate {
            user.hourly_rate = Some(hourly_rate);
        }

        let updated = user.clone();
        self.storage.store_list(StoreKey::Users, &users).await;
        self.sync_current_user(&updated).await;

        self.events.emit(MarketEvent::UserUpdated(updated.clone())).await;

        Ok(updated)
    }

    pub async fn set_availability(&self, id: Uuid, status: AvailabilityStatus) -> Result<User> {
        self.latency.write().await;

        let mut users: Vec<User> = self.storage.load_list(StoreKey::Users).await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ServiceError::UserNotFound(id))?;

        user.availability_status = status;
        let updated = user.clone();
        self.storage.store_list(StoreKey::Users, &users).await;
        self.sync_current_user(&updated).await;

        self.events.emit(MarketEvent::UserUpdated(updated.clone())).await;

        Ok(updated)
    }

    /// Keeps the `current-user` copy in step with profile edits.
    async fn sync_current_user(&self, user: &User) {
        if let Some(current) = self.current().await {
            if current.id == user.id {
                self.storage.set(StoreKey::CurrentUser, user).await;
            }
        }
    }
}
