//! Seed data for the MicroCollab store
//!
//! Template-based generation: fixed pools of names, skills and phrasings
//! combined at random. The shape of the seed universe is deterministic
//! (counts come from [`SeedConfig`]); the content is not, and there is no
//! seed control.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::models::{
    AvailabilityStatus, BudgetType, Message, MessageKind, Notification, NotificationKind, Offer,
    OfferStatus, Request, RequestMode, RequestStatus, Session, SessionStatus, Urgency, User,
    UserRole,
};
use crate::storage::{Storage, StoreKey};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Edsger", "Barbara", "Alan", "Margaret", "Donald", "Radia", "Niklaus", "Frances",
    "Dennis", "Katherine",
];

const LAST_NAMES: &[&str] = &[
    "Okafor", "Lindqvist", "Tanaka", "Moreau", "Petrov", "Alvarez", "Nakamura", "Osei", "Kowalski",
    "Haddad",
];

const SKILLS: &[&str] = &[
    "React", "Python", "Rust", "TypeScript", "PostgreSQL", "Kubernetes", "GraphQL", "Terraform",
    "Go", "Figma",
];

const TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Los_Angeles",
    "Europe/Berlin",
    "Europe/London",
    "Asia/Tokyo",
    "Australia/Sydney",
];

const TITLE_TEMPLATES: &[&str] = &[
    "Need help debugging a {} issue",
    "Pair on a tricky {} refactor",
    "Code review for a {} project",
    "Help setting up {} from scratch",
    "Walk me through {} best practices",
    "Stuck on a {} performance problem",
];

const DESCRIPTION_TEMPLATES: &[&str] = &[
    "I've been stuck on this for two days and could use a second pair of eyes.",
    "Looking for someone experienced to pair with for an hour or two.",
    "Small, well-scoped task; I can share a repro repository up front.",
    "Happy to do this async over comments if that works better for you.",
    "Deadline is coming up, so quick turnaround is appreciated.",
];

const OFFER_MESSAGES: &[&str] = &[
    "I've dealt with this exact problem before, happy to help.",
    "I can take a look tonight and share notes.",
    "This is my main stack; should be a quick one.",
    "Free this afternoon if you want to pair live.",
    "I maintain a library in this area, glad to walk you through it.",
];

/// Everything produced by one generation run.
#[derive(Debug, Default)]
pub struct SeedData {
    pub users: Vec<User>,
    pub requests: Vec<Request>,
    pub offers: Vec<Offer>,
    pub sessions: Vec<Session>,
    pub messages: Vec<Message>,
    pub notifications: Vec<Notification>,
}

pub fn random_user(rng: &mut impl Rng) -> User {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Okafor");
    let name = format!("{} {}", first, last);
    let email = format!(
        "{}.{}{}@example.com",
        first.to_lowercase(),
        last.to_lowercase(),
        rng.gen_range(1..100)
    );

    let role = match rng.gen_range(0..3) {
        0 => UserRole::Requester,
        1 => UserRole::Helper,
        _ => UserRole::Both,
    };

    let mut user = User::new(email, name, role);
    let skill_count = rng.gen_range(1..=3);
    let mut skills: Vec<&str> = SKILLS.choose_multiple(rng, skill_count).copied().collect();
    skills.sort_unstable();
    user.skills = skills.into_iter().map(str::to_string).collect();
    user.timezone = TIMEZONES.choose(rng).copied().unwrap_or("UTC").to_string();
    user.availability_status = match rng.gen_range(0..3) {
        0 => AvailabilityStatus::Available,
        1 => AvailabilityStatus::Busy,
        _ => AvailabilityStatus::Offline,
    };
    user.avatar_url = format!("https://avatars.example.com/{}", user.id);
    user.rating = (rng.gen_range(30..=50) as f64) / 10.0;
    user.sessions_completed = rng.gen_range(0..40);
    if rng.gen_bool(0.6) {
        user.hourly_rate = Some(rng.gen_range(20..120));
    }
    user.bio = format!("{} enthusiast based in {}", user.skills.join(" / "), user.timezone);
    user
}

pub fn random_request(rng: &mut impl Rng, created_by: Uuid) -> Request {
    let skill = SKILLS.choose(rng).copied().unwrap_or("Rust");
    let template = TITLE_TEMPLATES.choose(rng).copied().unwrap_or("{}");
    let title = template.replace("{}", skill);
    let description = DESCRIPTION_TEMPLATES
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string();

    let mut request = Request::new(title, description, created_by);
    request.tags = vec![skill.to_string()];
    if rng.gen_bool(0.4) {
        if let Some(extra) = SKILLS.choose(rng) {
            if !request.tags.iter().any(|t| t == extra) {
                request.tags.push((*extra).to_string());
            }
        }
    }
    request.duration_hours = rng.gen_range(1..=8);
    request.urgency = match rng.gen_range(0..10) {
        0..=1 => Urgency::Critical,
        2..=6 => Urgency::Normal,
        _ => Urgency::Low,
    };
    request.mode = if rng.gen_bool(0.5) {
        RequestMode::Async
    } else {
        RequestMode::Live
    };
    if rng.gen_bool(0.7) {
        request.budget = Some(rng.gen_range(25..500));
        request.budget_type = if rng.gen_bool(0.5) {
            BudgetType::Hourly
        } else {
            BudgetType::Fixed
        };
    }
    // Spread creation times over the last two weeks so "newest" ordering
    // is meaningful
    let age_minutes = rng.gen_range(0..60 * 24 * 14);
    request.created_at = Utc::now() - Duration::minutes(age_minutes);
    request.updated_at = request.created_at;
    request
}

pub fn random_offer(rng: &mut impl Rng, request_id: Uuid, offered_by: Uuid) -> Offer {
    let message = OFFER_MESSAGES.choose(rng).copied().unwrap_or_default().to_string();
    let mut offer = Offer::new(request_id, offered_by, message);
    if rng.gen_bool(0.6) {
        offer.proposed_time = Some(Utc::now() + Duration::hours(rng.gen_range(1..72)));
    }
    if rng.gen_bool(0.5) {
        offer.proposed_rate = Some(rng.gen_range(20..120));
    }
    offer
}

/// Builds the seed universe: users, open requests, pending offers, and a
/// handful of sessions derived from accepted offers (with the request and
/// offer statuses kept consistent).
pub fn generate(cfg: &SeedConfig) -> SeedData {
    let mut rng = rand::thread_rng();
    let mut data = SeedData::default();

    for _ in 0..cfg.users {
        data.users.push(random_user(&mut rng));
    }
    if data.users.is_empty() {
        return data;
    }

    for _ in 0..cfg.requests {
        let author = data.users.choose(&mut rng).map(|u| u.id).unwrap_or_default();
        data.requests.push(random_request(&mut rng, author));
    }

    for _ in 0..cfg.offers {
        let Some(request) = data.requests.choose(&mut rng) else {
            break;
        };
        let helper = data
            .users
            .iter()
            .filter(|u| u.id != request.created_by)
            .collect::<Vec<_>>();
        let Some(helper) = helper.choose(&mut rng) else {
            continue;
        };
        data.offers.push(random_offer(&mut rng, request.id, helper.id));
    }

    // Promote a few offers into sessions
    let session_count = cfg.sessions.min(data.offers.len());
    for i in 0..session_count {
        let offer_id = data.offers[i].id;
        let request_id = data.offers[i].request_id;

        let Some(request) = data.requests.iter_mut().find(|r| r.id == request_id) else {
            continue;
        };
        if request.status != RequestStatus::Open {
            continue;
        }

        let offer = &mut data.offers[i];
        offer.status = OfferStatus::Accepted;
        request.status = RequestStatus::InProgress;

        let mut session = Session::new(
            request.id,
            offer.id,
            offer.offered_by,
            request.created_by,
            offer.proposed_time.unwrap_or_else(Utc::now),
        );

        // Mix of scheduled, active and completed sessions
        match i % 3 {
            0 => {}
            1 => {
                session.status = SessionStatus::Active;
                session.actual_start = Some(Utc::now() - Duration::minutes(20));
            }
            _ => {
                let started = Utc::now() - Duration::hours(3);
                let ended = started + Duration::minutes(rng.gen_range(30..150));
                session.status = SessionStatus::Completed;
                session.actual_start = Some(started);
                session.end_time = Some(ended);
                session.duration_minutes = Some(session.elapsed_minutes(ended));
                request.status = RequestStatus::Completed;
            }
        }

        data.messages.push(Message::new(
            session.id,
            session.requester_id,
            "Thanks for picking this up!".to_string(),
            MessageKind::Text,
        ));
        data.messages.push(Message::new(
            session.id,
            session.helper_id,
            "Happy to help. Can you share the repro?".to_string(),
            MessageKind::Text,
        ));

        data.notifications.push(Notification::new(
            offer.offered_by,
            NotificationKind::OfferAccepted,
            "Offer accepted".to_string(),
            format!("Your offer on \"{}\" was accepted", request.title),
        ));

        data.sessions.push(session);
    }

    data
}

/// Populates the store from templates when it has never been seeded.
/// Returns whether seeding ran.
pub async fn seed_if_empty(storage: &Storage, cfg: &SeedConfig) -> bool {
    if storage.has(StoreKey::Users).await {
        return false;
    }

    let data = generate(cfg);
    info!(
        "Seeding store: {} users, {} requests, {} offers, {} sessions",
        data.users.len(),
        data.requests.len(),
        data.offers.len(),
        data.sessions.len()
    );

    storage.store_list(StoreKey::Users, &data.users).await;
    storage.store_list(StoreKey::Requests, &data.requests).await;
    storage.store_list(StoreKey::Offers, &data.offers).await;
    storage.store_list(StoreKey::Sessions, &data.sessions).await;
    storage.store_list(StoreKey::Messages, &data.messages).await;
    storage
        .store_list(StoreKey::Notifications, &data.notifications)
        .await;

    true
}

/// Dev-only control: wipe every key and reseed from templates.
pub async fn reset(storage: &Storage, cfg: &SeedConfig) {
    info!("Resetting mock data");
    storage.clear_all().await;
    seed_if_empty(storage, cfg).await;
}
