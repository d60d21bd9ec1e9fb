use microcollab::models::{BudgetType, RequestMode, RequestStatus, Urgency, User, UserRole};
use microcollab::services::{NewRequest, RequestFilter, RequestService, RequestSort};
use microcollab::storage::StoreKey;
use microcollab::{EventBus, LatencySimulator, Storage};
use uuid::Uuid;

fn setup() -> (RequestService, Storage) {
    let storage = Storage::in_memory();
    let service = RequestService::new(
        storage.clone(),
        EventBus::new(),
        LatencySimulator::disabled(),
    );
    (service, storage)
}

fn new_request(title: &str, tags: &[&str], urgency: Urgency, created_by: Uuid) -> NewRequest {
    NewRequest {
        title: title.to_string(),
        description: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        duration_hours: 2,
        urgency,
        mode: RequestMode::Async,
        budget: None,
        budget_type: BudgetType::Fixed,
        created_by,
    }
}

#[tokio::test]
async fn test_tag_filter_excludes_non_matching_requests() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let react = service
        .create(new_request("r1", &["React"], Urgency::Critical, author))
        .await
        .unwrap();
    service
        .create(new_request("r2", &["Python"], Urgency::Low, author))
        .await
        .unwrap();

    let filter = RequestFilter {
        tags: vec!["React".to_string()],
        ..Default::default()
    };
    let results = service.list(&filter, RequestSort::Newest).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, react.id);
}

#[tokio::test]
async fn test_urgency_sort_orders_critical_first() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    // Insert in a deliberately shuffled order
    for (title, urgency) in [
        ("low-1", Urgency::Low),
        ("critical-1", Urgency::Critical),
        ("normal-1", Urgency::Normal),
        ("low-2", Urgency::Low),
        ("critical-2", Urgency::Critical),
        ("normal-2", Urgency::Normal),
    ] {
        service
            .create(new_request(title, &["Rust"], urgency, author))
            .await
            .unwrap();
    }

    let results = service
        .list(&RequestFilter::default(), RequestSort::Urgency)
        .await;

    let ranks: Vec<u8> = results.iter().map(|r| r.urgency.rank()).collect();
    let mut sorted = ranks.clone();
    sorted.sort_unstable();
    assert_eq!(ranks, sorted, "urgency ranks must be non-decreasing");
    assert_eq!(results[0].urgency, Urgency::Critical);
    assert_eq!(results[5].urgency, Urgency::Low);
}

#[tokio::test]
async fn test_example_scenario_from_two_requests() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let r1 = service
        .create(new_request("r1", &["React"], Urgency::Critical, author))
        .await
        .unwrap();
    let r2 = service
        .create(new_request("r2", &["Python"], Urgency::Low, author))
        .await
        .unwrap();

    let filter = RequestFilter {
        tags: vec!["React".to_string()],
        ..Default::default()
    };
    let filtered = service.list(&filter, RequestSort::Newest).await;
    assert_eq!(
        filtered.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![r1.id]
    );

    let sorted = service
        .list(&RequestFilter::default(), RequestSort::Urgency)
        .await;
    assert_eq!(
        sorted.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![r1.id, r2.id]
    );
}

#[tokio::test]
async fn test_search_and_duration_filters() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let mut short = new_request("Fix the flaky login test", &["React"], Urgency::Normal, author);
    short.duration_hours = 1;
    let short = service.create(short).await.unwrap();

    let mut long = new_request("Migrate the billing service", &["Go"], Urgency::Normal, author);
    long.duration_hours = 8;
    service.create(long).await.unwrap();

    let filter = RequestFilter {
        search: Some("LOGIN".to_string()),
        ..Default::default()
    };
    let results = service.list(&filter, RequestSort::Newest).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, short.id);

    let filter = RequestFilter {
        max_duration_hours: Some(2),
        ..Default::default()
    };
    let results = service.list(&filter, RequestSort::Newest).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, short.id);
}

#[tokio::test]
async fn test_budget_sort_puts_unbudgeted_last() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let mut cheap = new_request("cheap", &["Rust"], Urgency::Normal, author);
    cheap.budget = Some(50);
    let cheap = service.create(cheap).await.unwrap();

    let mut rich = new_request("rich", &["Rust"], Urgency::Normal, author);
    rich.budget = Some(400);
    let rich = service.create(rich).await.unwrap();

    let free = service
        .create(new_request("free", &["Rust"], Urgency::Normal, author))
        .await
        .unwrap();

    let results = service
        .list(&RequestFilter::default(), RequestSort::Budget)
        .await;
    assert_eq!(
        results.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![rich.id, cheap.id, free.id]
    );
}

#[tokio::test]
async fn test_best_match_returns_the_same_set() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let mut expected = Vec::new();
    for i in 0..8 {
        let request = service
            .create(new_request(&format!("r{}", i), &["Rust"], Urgency::Normal, author))
            .await
            .unwrap();
        expected.push(request.id);
    }

    let results = service
        .list(&RequestFilter::default(), RequestSort::BestMatch)
        .await;
    let mut ids: Vec<Uuid> = results.iter().map(|r| r.id).collect();
    ids.sort();
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_get_joins_the_author() {
    let (service, storage) = setup();

    let author = User::new("ada@example.com".to_string(), "Ada".to_string(), UserRole::Both);
    storage.store_list(StoreKey::Users, &[author.clone()]).await;

    let request = service
        .create(new_request("r1", &["React"], Urgency::Normal, author.id))
        .await
        .unwrap();

    let detail = service.get(request.id).await.unwrap();
    assert_eq!(detail.request.id, request.id);
    assert_eq!(detail.author.unwrap().email, "ada@example.com");
}

#[tokio::test]
async fn test_update_delete_and_missing_ids() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let request = service
        .create(new_request("r1", &["React"], Urgency::Normal, author))
        .await
        .unwrap();

    let updated = service
        .update(
            request.id,
            microcollab::services::RequestPatch {
                title: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "renamed");
    assert!(updated.updated_at >= request.updated_at);

    service.delete(request.id).await.unwrap();
    assert!(service.get(request.id).await.is_err());
    assert!(service.delete(request.id).await.is_err());

    let missing = Uuid::new_v4();
    assert!(service
        .update(missing, Default::default())
        .await
        .is_err());
}

#[tokio::test]
async fn test_status_filter_hides_non_open_requests() {
    let (service, _) = setup();
    let author = Uuid::new_v4();

    let open = service
        .create(new_request("open", &["Rust"], Urgency::Normal, author))
        .await
        .unwrap();
    let done = service
        .create(new_request("done", &["Rust"], Urgency::Normal, author))
        .await
        .unwrap();
    service
        .set_status(done.id, RequestStatus::Completed)
        .await
        .unwrap();

    let filter = RequestFilter {
        status: Some(RequestStatus::Open),
        ..Default::default()
    };
    let results = service.list(&filter, RequestSort::Newest).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, open.id);
}
