use catalog_sniper::app::ports::HttpResponse;
use catalog_sniper::config::{CatalogQuery, Config, Endpoints};
use catalog_sniper::infra::{Scripted, ScriptedSession};
use catalog_sniper::pipeline::{
    Coordinator, OwnershipFilter, PageFetcher, PageWorker, PurchaseExecutor, RetryPolicy,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const SEARCH: &str = "/v1/search/items/details";
const USER_ID: u64 = 42;

fn endpoints() -> Endpoints {
    Endpoints::single_host("http://roblox.test")
}

fn item(asset_id: u64) -> Value {
    json!({
        "id": asset_id,
        "itemType": "Asset",
        "productId": asset_id * 100,
        "creatorTargetId": 1,
        "price": 0
    })
}

fn page(cursor: Option<&str>, items: Vec<Value>) -> HttpResponse {
    HttpResponse::json_body(200, &json!({"previousPageCursor": null, "nextPageCursor": cursor, "data": items}))
}

fn not_owned() -> HttpResponse {
    HttpResponse {
        status: 200,
        content_type: "text/html; charset=utf-8".to_string(),
        retry_after: None,
        bytes: Vec::new(),
    }
}

fn coordinator(session: Arc<ScriptedSession>, bundles: HashSet<u64>) -> Coordinator {
    let retry = RetryPolicy::unbounded(Duration::from_millis(1));
    Coordinator::new(
        PageFetcher::new(session.clone(), endpoints(), CatalogQuery::default(), retry),
        PageWorker::new(
            OwnershipFilter::new(session.clone(), endpoints(), USER_ID, bundles),
            PurchaseExecutor::new(session, endpoints(), retry),
        ),
        None,
    )
}

/// P1: asset 1 (owned as a bundle) and asset 2; P2: asset 3; P3: empty, last.
fn three_page_catalog(session: &ScriptedSession) {
    session.respond("cursor=C2", page(Some("C3"), vec![item(3)]));
    session.respond("cursor=C3", page(None, vec![]));
    session.respond(SEARCH, page(Some("C2"), vec![item(1), item(2)]));
    session.respond("/ownership/hasasset", not_owned());
    session.respond_json("/v1/purchases/products/", 200, json!({"purchased": true, "reason": "Success"}));
}

#[tokio::test]
async fn test_three_page_run() {
    let session = Arc::new(ScriptedSession::new());
    three_page_catalog(&session);

    let summary = coordinator(session.clone(), HashSet::from([1])).run().await.unwrap();

    assert_eq!(session.count("GET", SEARCH), 3);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.items_seen, 3);
    assert_eq!(summary.already_owned, 1);
    assert_eq!(summary.purchased, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(session.count("POST", "/v1/purchases/products/"), 2);
    assert_eq!(session.count("POST", "/v1/purchases/products/200"), 1);
    assert_eq!(session.count("POST", "/v1/purchases/products/300"), 1);
}

#[tokio::test]
async fn test_bundle_owned_item_is_never_probed_or_bought() {
    let session = Arc::new(ScriptedSession::new());
    three_page_catalog(&session);

    coordinator(session.clone(), HashSet::from([1])).run().await.unwrap();

    assert_eq!(session.count("GET", "assetId=1"), 0);
    assert_eq!(session.count("POST", "/v1/purchases/products/100"), 0);
}

#[tokio::test]
async fn test_probe_owned_item_is_not_bought() {
    let session = Arc::new(ScriptedSession::new());
    session.respond(SEARCH, page(None, vec![item(5), item(6)]));
    session.respond_json("assetId=5", 200, json!(true));
    session.respond("assetId=6", not_owned());
    session.respond_json("/v1/purchases/products/", 200, json!({}));

    let summary = coordinator(session.clone(), HashSet::new()).run().await.unwrap();

    assert_eq!(summary.already_owned, 1);
    assert_eq!(summary.purchased, 1);
    assert_eq!(session.count("POST", "/v1/purchases/products/500"), 0);
    assert_eq!(session.count("POST", "/v1/purchases/products/600"), 1);
}

#[tokio::test]
async fn test_next_page_fetch_does_not_wait_for_page_worker() {
    let session = Arc::new(ScriptedSession::new());
    let gate = Arc::new(Notify::new());

    // The purchase on page 1 only completes after page 2 has been requested.
    session.route(
        "cursor=C2",
        vec![Scripted::Release {
            gate: gate.clone(),
            response: page(None, vec![]),
        }],
    );
    session.respond(SEARCH, page(Some("C2"), vec![item(2)]));
    session.respond("/ownership/hasasset", not_owned());
    session.route(
        "/v1/purchases/products/200",
        vec![Scripted::Gated {
            gate,
            response: HttpResponse::json_body(200, &json!({"purchased": true})),
        }],
    );

    let summary = tokio::time::timeout(Duration::from_secs(5), coordinator(session.clone(), HashSet::new()).run())
        .await
        .expect("page 2 fetch waited on page 1 processing")
        .unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.purchased, 1);
}

#[tokio::test]
async fn test_rate_limited_purchase_completes_before_run_ends() {
    let session = Arc::new(ScriptedSession::new());
    session.respond(SEARCH, page(None, vec![item(7)]));
    session.respond("/ownership/hasasset", not_owned());
    session.route(
        "/v1/purchases/products/700",
        vec![
            Scripted::Respond(HttpResponse::json_body(429, &json!({"errors": []}))),
            Scripted::Respond(HttpResponse::json_body(429, &json!({"errors": []}))),
            Scripted::Respond(HttpResponse::json_body(200, &json!({"purchased": true}))),
        ],
    );

    let summary = coordinator(session.clone(), HashSet::new()).run().await.unwrap();

    assert_eq!(summary.purchased, 1);
    assert_eq!(summary.purchase_submissions, 3);
    assert_eq!(session.count("POST", "/v1/purchases/products/700"), 3);
}

#[tokio::test]
async fn test_purchase_server_fault_is_resubmitted() {
    let session = Arc::new(ScriptedSession::new());
    session.respond(SEARCH, page(None, vec![item(8)]));
    session.respond("/ownership/hasasset", not_owned());
    session.route(
        "/v1/purchases/products/800",
        vec![
            Scripted::Respond(HttpResponse::json_body(503, &json!({"errors": [{"message": "Service Unavailable"}]}))),
            Scripted::Respond(HttpResponse::json_body(200, &json!({"purchased": true}))),
        ],
    );

    let summary = coordinator(session.clone(), HashSet::new()).run().await.unwrap();

    assert_eq!(summary.purchased, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(session.count("POST", "/v1/purchases/products/800"), 2);
}

#[tokio::test]
async fn test_off_sale_listings_do_not_abort_run() {
    let session = Arc::new(ScriptedSession::new());
    let off_sale = json!({"id": 2, "itemType": "Asset", "productId": 200, "creatorTargetId": 1, "priceStatus": "Off Sale"});
    session.respond(SEARCH, page(None, vec![off_sale, item(3)]));
    session.respond("/ownership/hasasset", not_owned());
    session.respond_json("/v1/purchases/products/", 200, json!({"purchased": true}));

    let summary = coordinator(session.clone(), HashSet::new()).run().await.unwrap();

    assert_eq!(summary.not_for_sale, 1);
    assert_eq!(summary.purchased, 1);
    assert_eq!(session.count("POST", "/v1/purchases/products/200"), 0);
    assert_eq!(session.count("POST", "/v1/purchases/products/300"), 1);
}

#[tokio::test]
async fn test_all_owned_catalog_submits_nothing() {
    let session = Arc::new(ScriptedSession::new());
    session.respond("cursor=C2", page(None, vec![item(3), item(4)]));
    session.respond(SEARCH, page(Some("C2"), vec![item(1), item(2)]));
    session.respond_json("/ownership/hasasset", 200, json!(true));

    let bundles = HashSet::from([1, 3]);
    for _ in 0..2 {
        let summary = coordinator(session.clone(), bundles.clone()).run().await.unwrap();
        assert_eq!(summary.already_owned, 4);
        assert_eq!(summary.purchased, 0);
    }
    assert_eq!(session.count("POST", "/v1/purchases/products/"), 0);
}

#[tokio::test]
async fn test_cursor_chain_terminates_on_finite_catalog() {
    let session = Arc::new(ScriptedSession::new());
    let pages = 25;
    // Registered high to low so "cursor=P2" cannot shadow "cursor=P25"
    for n in (2..=pages).rev() {
        let next = (n < pages).then(|| format!("P{}", n + 1));
        session.respond(&format!("cursor=P{}", n), page(next.as_deref(), vec![]));
    }
    session.respond(SEARCH, page(Some("P2"), vec![]));

    let summary = coordinator(session.clone(), HashSet::new()).run().await.unwrap();

    assert_eq!(summary.pages_fetched, pages);
    assert_eq!(session.count("GET", SEARCH), pages);
}

#[tokio::test]
async fn test_from_config_degrades_when_bundles_unavailable() {
    let session = Arc::new(ScriptedSession::new());
    session.respond_json("/v1/users/42/bundles", 500, json!({"errors": []}));
    session.respond(SEARCH, page(None, vec![item(9)]));
    session.respond("/ownership/hasasset", not_owned());
    session.respond_json("/v1/purchases/products/900", 200, json!({}));

    let config = Config {
        endpoints: endpoints(),
        ..Default::default()
    };
    let summary = Coordinator::from_config(session.clone(), &config, USER_ID)
        .await
        .run()
        .await
        .unwrap();

    assert_eq!(summary.purchased, 1);
    assert_eq!(session.count("GET", "/v1/users/42/bundles"), 1);
}
