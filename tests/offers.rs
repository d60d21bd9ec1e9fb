use microcollab::models::{
    BudgetType, Notification, Offer, OfferStatus, Request, RequestMode, RequestStatus, Urgency,
    User, UserRole,
};
use microcollab::services::{NewOffer, NewRequest, OfferService, RequestService};
use microcollab::storage::StoreKey;
use microcollab::{EventBus, LatencySimulator, MarketEvent, Storage};
use uuid::Uuid;

struct Harness {
    storage: Storage,
    events: EventBus<MarketEvent>,
    requests: RequestService,
    offers: OfferService,
}

fn setup() -> Harness {
    let storage = Storage::in_memory();
    let events: EventBus<MarketEvent> = EventBus::new();
    let latency = LatencySimulator::disabled();
    Harness {
        requests: RequestService::new(storage.clone(), events.clone(), latency.clone()),
        offers: OfferService::new(storage.clone(), events.clone(), latency),
        storage,
        events,
    }
}

async fn seed_user(storage: &Storage, name: &str) -> User {
    let user = User::new(
        format!("{}@example.com", name.to_lowercase()),
        name.to_string(),
        UserRole::Both,
    );
    let mut users: Vec<User> = storage.load_list(StoreKey::Users).await;
    users.push(user.clone());
    storage.store_list(StoreKey::Users, &users).await;
    user
}

async fn open_request(harness: &Harness, author: Uuid) -> Request {
    harness
        .requests
        .create(NewRequest {
            title: "Pair on a Rust borrow checker fight".to_string(),
            description: "It should only take an hour".to_string(),
            tags: vec!["Rust".to_string()],
            duration_hours: 1,
            urgency: Urgency::Normal,
            mode: RequestMode::Live,
            budget: Some(80),
            budget_type: BudgetType::Hourly,
            created_by: author,
        })
        .await
        .unwrap()
}

async fn pending_offer(harness: &Harness, request_id: Uuid, helper: Uuid) -> Offer {
    harness
        .offers
        .create(NewOffer {
            request_id,
            offered_by: helper,
            message: "I can help".to_string(),
            proposed_time: None,
            proposed_rate: Some(60),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_accept_declines_siblings_and_creates_one_session() {
    let harness = setup();
    let requester = seed_user(&harness.storage, "Req").await;
    let helper_a = seed_user(&harness.storage, "HelperA").await;
    let helper_b = seed_user(&harness.storage, "HelperB").await;
    let helper_c = seed_user(&harness.storage, "HelperC").await;

    let request = open_request(&harness, requester.id).await;
    pending_offer(&harness, request.id, helper_a.id).await;
    let winning = pending_offer(&harness, request.id, helper_b.id).await;
    pending_offer(&harness, request.id, helper_c.id).await;

    let session = harness.offers.accept(winning.id).await.unwrap();

    // Exactly one accepted offer; all siblings declined
    let offers = harness.offers.list_for_request(request.id).await;
    let accepted: Vec<&Offer> = offers
        .iter()
        .filter(|o| o.status == OfferStatus::Accepted)
        .collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id, winning.id);
    assert!(offers
        .iter()
        .filter(|o| o.id != winning.id)
        .all(|o| o.status == OfferStatus::Declined));

    // The request moved to in_progress
    let detail = harness.requests.get(request.id).await.unwrap();
    assert_eq!(detail.request.status, RequestStatus::InProgress);

    // Exactly one session referencing the request and the accepted offer
    let sessions: Vec<microcollab::models::Session> =
        harness.storage.load_list(StoreKey::Sessions).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session.id);
    assert_eq!(sessions[0].request_id, request.id);
    assert_eq!(sessions[0].offer_id, winning.id);
    assert_eq!(sessions[0].helper_id, helper_b.id);
    assert_eq!(sessions[0].requester_id, requester.id);
}

#[tokio::test]
async fn test_accept_emits_the_expected_events() {
    let harness = setup();
    let requester = seed_user(&harness.storage, "Req").await;
    let helper_a = seed_user(&harness.storage, "HelperA").await;
    let helper_b = seed_user(&harness.storage, "HelperB").await;

    let request = open_request(&harness, requester.id).await;
    let winning = pending_offer(&harness, request.id, helper_a.id).await;
    pending_offer(&harness, request.id, helper_b.id).await;

    let mut subscription = harness.events.subscribe().await;
    harness.offers.accept(winning.id).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = subscription.receiver.try_recv() {
        kinds.push(event.kind());
    }

    assert!(kinds.contains(&"offer:accepted"));
    assert!(kinds.contains(&"offer:declined"));
    assert!(kinds.contains(&"request:updated"));
    assert!(kinds.contains(&"session:created"));
}

#[tokio::test]
async fn test_offer_lifecycle_guards() {
    let harness = setup();
    let requester = seed_user(&harness.storage, "Req").await;
    let helper = seed_user(&harness.storage, "Helper").await;

    // Offers on unknown requests are rejected
    let err = harness
        .offers
        .create(NewOffer {
            request_id: Uuid::new_v4(),
            offered_by: helper.id,
            message: "hello".to_string(),
            proposed_time: None,
            proposed_rate: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));

    // Accepting a missing offer is an error carrying the id
    let missing = Uuid::new_v4();
    let err = harness.offers.accept(missing).await.unwrap_err();
    assert!(err.to_string().contains(&missing.to_string()));

    // Accepting twice is a conflict
    let request = open_request(&harness, requester.id).await;
    let offer = pending_offer(&harness, request.id, helper.id).await;
    harness.offers.accept(offer.id).await.unwrap();
    let err = harness.offers.accept(offer.id).await.unwrap_err();
    assert!(err.to_string().contains("already been resolved"));

    // The request is no longer open, so new offers are conflicts too
    let err = harness
        .offers
        .create(NewOffer {
            request_id: request.id,
            offered_by: helper.id,
            message: "late".to_string(),
            proposed_time: None,
            proposed_rate: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not open"));
}

#[tokio::test]
async fn test_decline_leaves_the_request_open() {
    let harness = setup();
    let requester = seed_user(&harness.storage, "Req").await;
    let helper = seed_user(&harness.storage, "Helper").await;

    let request = open_request(&harness, requester.id).await;
    let offer = pending_offer(&harness, request.id, helper.id).await;

    let declined = harness.offers.decline(offer.id).await.unwrap();
    assert_eq!(declined.status, OfferStatus::Declined);

    let detail = harness.requests.get(request.id).await.unwrap();
    assert_eq!(detail.request.status, RequestStatus::Open);
}

#[tokio::test]
async fn test_offer_flow_writes_notifications() {
    let harness = setup();
    let requester = seed_user(&harness.storage, "Req").await;
    let helper = seed_user(&harness.storage, "Helper").await;

    let request = open_request(&harness, requester.id).await;
    let offer = pending_offer(&harness, request.id, helper.id).await;
    harness.offers.accept(offer.id).await.unwrap();

    let notifications: Vec<Notification> =
        harness.storage.load_list(StoreKey::Notifications).await;
    assert!(notifications.iter().any(|n| n.user_id == requester.id));
    assert!(notifications.iter().any(|n| n.user_id == helper.id));
    assert!(notifications.iter().all(|n| !n.read));
}
