#![allow(clippy::unwrap_used)]
// End-to-end page flows against a mock REST backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use servdesk_core::{
    EntityId, Level, ListSettings, LoadOutcome, ManagementPage, ModalState, NotificationLog,
    RestClient, Service, Transaction, TransactionDraft, TransactionStatus, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<RestClient>, Arc<NotificationLog>) {
    let server = MockServer::start().await;
    let client = RestClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, Arc::new(client), Arc::new(NotificationLog::new()))
}

fn services_body() -> serde_json::Value {
    json!({
        "data": [
            { "id": 1, "name": "Deep Clean", "price": 499, "is_active": true,
              "updated_at": "2024-03-02T10:00:00Z" },
            { "id": 2, "name": "AC Repair", "price": "799.00", "is_active": false,
              "updated_at": "2024-03-03T10:00:00Z" },
            { "id": 3, "name": "Plumbing", "price": 299, "is_active": true }
        ]
    })
}

// ── Services (client-side) ──────────────────────────────────────────

#[tokio::test]
async fn services_are_fetched_once_and_refined_locally() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(services_body()))
        .expect(1)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Service, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log.clone());
    assert_eq!(page.mount().await, LoadOutcome::Applied);

    // Default sort is updated_at desc; the undated row sorts last.
    let names: Vec<String> = page.visible().items.into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["AC Repair", "Deep Clean", "Plumbing"]);

    page.set_filter("status", "active").await.unwrap();
    assert_eq!(page.visible().items.len(), 2);
    assert_eq!(log.snapshot().len(), 0);
}

#[tokio::test]
async fn failed_toggle_restores_row_and_reports_once() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(services_body()))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/services/1/status"))
        .and(body_json(json!({ "is_active": false })))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Status locked" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Service, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log.clone());
    page.mount().await;

    assert!(page.toggle(EntityId::Number(1)).await.is_err());

    let row = page.list().find(&EntityId::Number(1)).unwrap();
    assert!(row.is_active);
    assert_eq!(log.count(Level::Error), 1);
    assert_eq!(log.snapshot()[0].message, "Status locked");
}

#[tokio::test]
async fn delete_succeeds_on_2xx_without_success_flag() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(services_body()))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/services/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Service deleted" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Service, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log.clone());
    page.mount().await;

    let resp = page.delete(EntityId::Number(2)).await.unwrap();
    assert!(resp.success);
    assert!(page.list().find(&EntityId::Number(2)).is_none());
    assert_eq!(page.visible().items.len(), 2);
    assert_eq!(log.count(Level::Error), 0);
    assert_eq!(log.count(Level::Success), 1);
}

#[tokio::test]
async fn failed_load_keeps_previous_rows() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(services_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Service, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log.clone());
    page.mount().await;
    assert_eq!(page.reload().await, LoadOutcome::Failed);

    let view = page.visible();
    assert_eq!(view.items.len(), 3);
    assert_eq!(view.error.as_deref(), Some("Failed to fetch services"));
    assert!(!view.is_loading);
}

// ── Transactions (server-side) ──────────────────────────────────────

#[tokio::test]
async fn transactions_read_criteria_from_the_url() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("status", "refunded"))
        .and(query_param("page", "3"))
        .and(query_param("sortBy", "amount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "items": [
                    { "id": "tx_1", "amount": 250, "status": "refunded",
                      "payment_method": "upi", "created_at": "2024-03-01" }
                ],
                "pagination": { "currentPage": 3, "totalPages": 4, "itemsPerPage": 10 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Transaction, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log);
    let outcome = page
        .mount_with_query("?status=refunded&page=3&sortBy=amount&status=bogus&utm_source=x")
        .await;
    assert_eq!(outcome, LoadOutcome::Applied);

    let view = page.visible();
    assert_eq!(view.page, 3);
    assert_eq!(view.total_pages, 4);
    assert_eq!(view.items[0].status, TransactionStatus::Refunded);
}

#[tokio::test]
async fn transaction_search_is_debounced_into_one_request() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("search", "pay_12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let settings = ListSettings {
        debounce: Duration::from_millis(200),
        ..ListSettings::default()
    };
    let page: Arc<ManagementPage<Transaction, RestClient>> =
        ManagementPage::new(client, settings, log);
    page.mount().await;

    let mut rx = page.subscribe_list();
    for raw in ["pay_1", "pay_12", "pay_123", "pay_1234", "pay_12345"] {
        page.set_search_input(raw);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Wait for the debounced load to land.
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            rx.changed().await.unwrap();
            let state = rx.borrow_and_update().clone();
            if !state.is_loading && page.filters().text("search") == "pay_12345" {
                break;
            }
        }
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let searches: Vec<_> = requests
        .iter()
        .filter(|r| r.url.query().is_some_and(|q| q.contains("search=")))
        .collect();
    assert_eq!(searches.len(), 1);
}

#[tokio::test]
async fn url_page_survives_a_search_term() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(query_param("search", "pay"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Transaction, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log);
    assert_eq!(page.mount_with_query("?search=pay&page=3").await, LoadOutcome::Applied);

    // Outlast the debounce window so the search task has seen the term.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(page.filters().page(), 3);
    assert_eq!(page.filters().text("search"), "pay");
    assert_eq!(page.search_input(), "pay");
}

#[tokio::test]
async fn transaction_create_reloads_and_closes_dialog() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(body_json(json!({ "status": "refunded" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "tx_5", "amount": 90, "status": "refunded" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Transaction, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log.clone());
    page.mount().await;

    page.open_create();
    let draft = TransactionDraft {
        status: TransactionStatus::Refunded,
        note: None,
    };
    let created = page.submit(&draft, Vec::new()).await.unwrap();
    assert_eq!(created.id, EntityId::Text("tx_5".into()));
    assert_eq!(page.modal(), ModalState::Idle);
    // Server-paged lists take the new row from the refetch, not locally.
    assert!(page.visible().items.is_empty());
    assert_eq!(log.count(Level::Success), 1);
}

#[tokio::test]
async fn transaction_create_network_failure_keeps_dialog() {
    let (server, client, log) = setup().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let page: Arc<ManagementPage<Transaction, RestClient>> =
        ManagementPage::new(client, ListSettings::default(), log.clone());
    page.mount().await;

    page.open_create();
    let draft = TransactionDraft {
        status: TransactionStatus::Completed,
        note: None,
    };
    assert!(page.submit(&draft, Vec::new()).await.is_err());
    assert_eq!(page.modal(), ModalState::Create);
    assert_eq!(log.count(Level::Error), 1);
}
