//! Demo activity simulator
//!
//! A self-contained marketplace world for the standalone demo surface. It
//! keeps its own in-memory maps, never touches [`crate::storage::Storage`],
//! and loses all state on restart. A timer task periodically applies a
//! weighted random event and pushes it to subscribers; entities are only
//! ever added, never removed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::events::{EventBus, Subscription};
use crate::models::{Offer, OfferStatus, Request, RequestStatus, User};
use crate::seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoEventKind {
    RequestPosted,
    OfferSubmitted,
    SessionStarted,
    SessionCompleted,
}

/// One entry of the append-only activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoEvent {
    pub id: Uuid,
    pub kind: DemoEventKind,
    pub message: String,
    pub subject_id: Uuid,
    pub at: DateTime<Utc>,
}

impl DemoEvent {
    fn new(kind: DemoEventKind, message: String, subject_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message,
            subject_id,
            at: Utc::now(),
        }
    }
}

/// Counters exposed to the demo UI. All fields only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoStats {
    pub requests: usize,
    pub offers: usize,
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub events: usize,
}

#[derive(Debug)]
struct DemoWorld {
    users: Vec<User>,
    requests: HashMap<Uuid, Request>,
    offers: HashMap<Uuid, Offer>,
    events: Vec<DemoEvent>,
    sessions_started: u64,
    sessions_completed: u64,
}

pub struct DemoSimulator {
    config: SimulationConfig,
    world: Arc<RwLock<DemoWorld>>,
    bus: EventBus<DemoEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DemoSimulator {
    /// Builds the simulator with a freshly seeded world.
    pub fn new(config: SimulationConfig) -> Self {
        let mut rng = rand::thread_rng();

        let users: Vec<User> = (0..6).map(|_| seed::random_user(&mut rng)).collect();

        let mut requests = HashMap::new();
        let mut offers = HashMap::new();
        let request_count =
            rng.gen_range(config.min_seed_requests..=config.max_seed_requests.max(config.min_seed_requests));
        for _ in 0..request_count {
            let author = users.choose(&mut rng).map(|u| u.id).unwrap_or_default();
            let request = seed::random_request(&mut rng, author);

            let offer_count = rng.gen_range(0..=config.max_seed_offers_per_request);
            for _ in 0..offer_count {
                if let Some(helper) = users.iter().filter(|u| u.id != author).collect::<Vec<_>>().choose(&mut rng) {
                    let offer = seed::random_offer(&mut rng, request.id, helper.id);
                    offers.insert(offer.id, offer);
                }
            }
            requests.insert(request.id, request);
        }

        info!(
            "Demo world seeded with {} requests and {} offers",
            requests.len(),
            offers.len()
        );

        Self {
            config,
            world: Arc::new(RwLock::new(DemoWorld {
                users,
                requests,
                offers,
                events: Vec::new(),
                sessions_started: 0,
                sessions_completed: 0,
            })),
            bus: EventBus::new(),
            task: Mutex::new(None),
        }
    }

    pub async fn subscribe(&self) -> Subscription<DemoEvent> {
        self.bus.subscribe().await
    }

    /// Applies one weighted random event to the world and notifies
    /// subscribers. Draws with no eligible subject fall back to posting a
    /// new request, so every tick produces exactly one event.
    pub async fn tick_once(&self) {
        Self::apply_tick(&self.config, &self.world, &self.bus).await;
    }

    async fn apply_tick(
        config: &SimulationConfig,
        world: &RwLock<DemoWorld>,
        bus: &EventBus<DemoEvent>,
    ) {
        let event = {
            let mut world = world.write().await;
            let mut rng = rand::thread_rng();

            let request_w = config.request_weight;
            let offer_w = config.offer_weight;
            let start_w = config.session_start_weight;
            let total = (request_w + offer_w + start_w + config.session_complete_weight).max(1);
            let draw = rng.gen_range(0..total);

            let event = if draw < request_w {
                Self::post_request(&mut world, &mut rng)
            } else if draw < request_w + offer_w {
                Self::submit_offer(&mut world, &mut rng)
                    .unwrap_or_else(|| Self::post_request(&mut world, &mut rng))
            } else if draw < request_w + offer_w + start_w {
                Self::start_session(&mut world, &mut rng)
                    .unwrap_or_else(|| Self::post_request(&mut world, &mut rng))
            } else {
                Self::complete_session(&mut world, &mut rng)
                    .unwrap_or_else(|| Self::post_request(&mut world, &mut rng))
            };

            world.events.push(event.clone());
            event
        };

        debug!("Demo tick: {}", event.message);
        bus.emit(event).await;
    }

    fn post_request(world: &mut DemoWorld, rng: &mut impl Rng) -> DemoEvent {
        let author = world.users.choose(rng).cloned();
        let author_id = author.as_ref().map(|u| u.id).unwrap_or_default();
        let request = seed::random_request(rng, author_id);

        let message = format!(
            "{} posted \"{}\"",
            author.map(|u| u.name).unwrap_or_else(|| "Someone".to_string()),
            request.title
        );
        let event = DemoEvent::new(DemoEventKind::RequestPosted, message, request.id);
        world.requests.insert(request.id, request);
        event
    }

    fn submit_offer(world: &mut DemoWorld, rng: &mut impl Rng) -> Option<DemoEvent> {
        let open: Vec<&Request> = world
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Open)
            .collect();
        let request = open.choose(rng)?;
        let request_id = request.id;
        let request_title = request.title.clone();
        let author_id = request.created_by;

        let helpers: Vec<&User> = world.users.iter().filter(|u| u.id != author_id).collect();
        let helper = helpers.choose(rng)?;
        let helper_id = helper.id;
        let helper_name = helper.name.clone();

        let offer = seed::random_offer(rng, request_id, helper_id);
        let message = format!("{} offered to help with \"{}\"", helper_name, request_title);
        let event = DemoEvent::new(DemoEventKind::OfferSubmitted, message, offer.id);
        world.offers.insert(offer.id, offer);
        Some(event)
    }

    fn start_session(world: &mut DemoWorld, rng: &mut impl Rng) -> Option<DemoEvent> {
        let candidates: Vec<Uuid> = world
            .offers
            .values()
            .filter(|o| o.status == OfferStatus::Pending)
            .filter(|o| {
                world
                    .requests
                    .get(&o.request_id)
                    .map(|r| r.status == RequestStatus::Open)
                    .unwrap_or(false)
            })
            .map(|o| o.id)
            .collect();
        let offer_id = *candidates.choose(rng)?;

        let request_id = {
            let offer = world.offers.get_mut(&offer_id)?;
            offer.status = OfferStatus::Accepted;
            offer.request_id
        };
        let request = world.requests.get_mut(&request_id)?;
        request.status = RequestStatus::InProgress;
        world.sessions_started += 1;

        let message = format!("A session kicked off for \"{}\"", request.title);
        Some(DemoEvent::new(DemoEventKind::SessionStarted, message, request_id))
    }

    fn complete_session(world: &mut DemoWorld, rng: &mut impl Rng) -> Option<DemoEvent> {
        let in_progress: Vec<Uuid> = world
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::InProgress)
            .map(|r| r.id)
            .collect();
        let request_id = *in_progress.choose(rng)?;

        let request = world.requests.get_mut(&request_id)?;
        request.status = RequestStatus::Completed;
        world.sessions_completed += 1;

        let message = format!("A session wrapped up for \"{}\"", request.title);
        Some(DemoEvent::new(
            DemoEventKind::SessionCompleted,
            message,
            request_id,
        ))
    }

    /// Starts the tick task. A second call while running is a no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
            return;
        }

        let config = self.config.clone();
        let world = Arc::clone(&self.world);
        let bus = self.bus.clone();
        let tick = std::time::Duration::from_secs(self.config.tick_seconds.max(1));
        info!("Starting demo simulation with a {:?} tick", tick);

        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first interval tick completes immediately; skip it so the
            // first event lands a full period after start, like setInterval
            interval.tick().await;
            loop {
                interval.tick().await;
                Self::apply_tick(&config, &world, &bus).await;
            }
        }));
    }

    /// Stops the tick task. The world is left as is.
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            info!("Stopped demo simulation");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    /// Snapshot of the activity feed so far.
    pub async fn events(&self) -> Vec<DemoEvent> {
        self.world.read().await.events.clone()
    }

    pub async fn stats(&self) -> DemoStats {
        let world = self.world.read().await;
        DemoStats {
            requests: world.requests.len(),
            offers: world.offers.len(),
            sessions_started: world.sessions_started,
            sessions_completed: world.sessions_completed,
            events: world.events.len(),
        }
    }
}
