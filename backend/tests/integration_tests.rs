use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use backend::config::Config;
use backend::public::CACHE_POLICY;
use backend::{app, AppState};
use serde_json::{json, Value};
use std::{fs, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

const TOKEN: &str = "test-token";

fn test_app(temp_dir: &TempDir) -> (Router, Arc<AppState>) {
    let config = Config {
        content_dir: temp_dir.path().to_path_buf(),
        api_token: Some(TOKEN.to_string()),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config));
    (app(state.clone()), state)
}

fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn public(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

async fn seed(app: &Router) {
    let response = app
        .clone()
        .oneshot(admin(
            "POST",
            "/api/groups",
            Some(json!({"id": "uk", "name": "UK", "countries": [{"code": "GB", "default": true}]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(admin(
            "POST",
            "/api/groups/uk/products",
            Some(json!({"id": "Accounts Desktop!", "name": "Accounts Desktop", "type": "desktop"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_mutations_require_token() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/groups/uk/products")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"id":"x","name":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert!(body["error"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/groups")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_configured_token_locks_admin() {
    let temp_dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::new(Config {
        content_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    }));
    let response = app(state)
        .oneshot(admin("GET", "/api/groups", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_product() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let config = temp_dir
        .path()
        .join("groups/uk/products/accounts-desktop/config.json");
    assert!(config.exists());

    let response = app
        .clone()
        .oneshot(admin("GET", "/api/groups/uk", None))
        .await
        .unwrap();
    let group = body_json(response).await;
    assert_eq!(group["productIds"], json!(["accounts-desktop"]));

    let response = app
        .clone()
        .oneshot(admin(
            "POST",
            "/api/groups/uk/products",
            Some(json!({"id": "accounts desktop", "name": "Dup"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(admin("POST", "/api/groups/uk/products", Some(json!({"name": "No id"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "product id and name are required");
}

#[tokio::test]
async fn test_update_and_delete_product() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let response = app
        .clone()
        .oneshot(admin(
            "PUT",
            "/api/groups/uk/products/accounts-desktop",
            Some(json!({"personas": ["partner"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let product = body_json(response).await;
    assert_eq!(product["personas"], json!(["partner"]));
    assert_eq!(product["type"], "desktop");

    let response = app
        .clone()
        .oneshot(admin("PUT", "/api/groups/uk/products/ghost", Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(admin("DELETE", "/api/groups/uk/products/accounts-desktop", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert!(!temp_dir
        .path()
        .join("groups/uk/products/accounts-desktop")
        .exists());
}

#[tokio::test]
async fn test_topic_reconciliation_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let body = json!({"supportHubs": [
        {"productId": "Accounts Desktop!", "id": "Getting Started", "title": "Getting started"},
        {"productId": "Accounts Desktop!", "id": "vat", "title": "VAT"},
        {"productId": "someone-else", "id": "ignored", "title": "Ignored"}
    ]});
    let response = app
        .clone()
        .oneshot(admin("PUT", "/api/groups/uk/products/accounts-desktop/topics", Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["supportHubs"].as_array().unwrap().len(), 2);

    let topics_dir = temp_dir
        .path()
        .join("groups/uk/products/accounts-desktop/topics");
    assert!(topics_dir.join("getting-started/articles.json").exists());
    assert!(!topics_dir.join("ignored").exists());

    let response = app
        .clone()
        .oneshot(admin("GET", "/api/groups/uk/products/accounts-desktop/topics", None))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed["supportHubs"][0]["id"], "Getting Started");
    assert_eq!(listed["supportHubs"][0]["productId"], "Accounts Desktop!");

    let response = app
        .clone()
        .oneshot(admin(
            "PUT",
            "/api/groups/uk/products/accounts-desktop/topics/getting-started/articles",
            Some(json!([{"id": "vat", "type": "subtopic"}])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(admin("GET", "/api/groups/uk/products/accounts-desktop/articles", None))
        .await
        .unwrap();
    let index = body_json(response).await;
    let article = &index["accounts-desktop"]["getting-started"][0];
    assert_eq!(article["title"], "VAT");
    assert_eq!(article["resolution"], "inherited");
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/groups/uk/products/accounts-desktop/topics")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_public_reads_are_country_filtered_and_cached() {
    let temp_dir = TempDir::new().unwrap();
    let (app, state) = test_app(&temp_dir);
    seed(&app).await;

    let response = app
        .clone()
        .oneshot(admin(
            "POST",
            "/api/groups/uk/products",
            Some(json!({"id": "ie-only", "name": "Irish", "countries": ["IE"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(public("/api/public/data/gb/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        CACHE_POLICY
    );
    let products = body_json(response).await;
    assert_eq!(products.as_array().unwrap().len(), 1);
    assert_eq!(products[0]["folderId"], "accounts-desktop");
    assert_eq!(state.cache.len(), 1);

    let response = app
        .clone()
        .oneshot(admin("DELETE", "/api/groups/uk/products/accounts-desktop", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.cache.is_empty());

    let response = app
        .oneshot(public("/api/public/data/gb/products"))
        .await
        .unwrap();
    let products = body_json(response).await;
    assert_eq!(products, json!([]));
}

#[tokio::test]
async fn test_public_release_notes_and_contact() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let notes = json!([
        {"date": "2024-01-01", "title": "Old"},
        {"date": "2025-06-01", "title": "New"},
        {"date": "2023-03-03", "title": "Oldest"}
    ]);
    let response = app
        .clone()
        .oneshot(admin(
            "PUT",
            "/api/groups/uk/products/accounts-desktop/release-notes",
            Some(notes),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(admin("PUT", "/api/groups/uk/contact", Some(json!({"phone": "0191 000"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(public("/api/public/data/GB/release-notes"))
        .await
        .unwrap();
    let index = body_json(response).await;
    let titles: Vec<_> = index["accounts-desktop"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["New", "Old", "Oldest"]);

    let response = app
        .oneshot(public("/api/public/data/gb/contact"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"phone": "0191 000"}));
}

#[tokio::test]
async fn test_public_missing_product_is_404() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let response = app
        .oneshot(public("/api/public/data/gb/products/nope/topics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "product nope not found");
}

#[tokio::test]
async fn test_undecodable_path_returns_json_error() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;

    let response = app
        .clone()
        .oneshot(admin("DELETE", "/api/groups/uk/products/%FF", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("product"));

    let response = app
        .oneshot(public("/api/public/data/%FF/contact"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_public_cache_is_bounded() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        content_dir: temp_dir.path().to_path_buf(),
        api_token: Some(TOKEN.to_string()),
        cache_capacity: 8,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config));
    let app = app(state.clone());
    seed(&app).await;

    for i in 0..50 {
        let response = app
            .clone()
            .oneshot(public(&format!("/api/public/data/x{i}/contact")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(state.cache.len(), 8);
}

#[tokio::test]
async fn test_verify_and_repair_endpoints() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    seed(&app).await;
    fs::create_dir_all(temp_dir.path().join("groups/uk/products/stray")).unwrap();
    fs::write(
        temp_dir.path().join("groups/uk/products/stray/config.json"),
        r#"{"id": "stray", "name": "Stray"}"#,
    )
    .unwrap();

    let response = app
        .clone()
        .oneshot(admin("GET", "/api/groups/uk/verify", None))
        .await
        .unwrap();
    let report = body_json(response).await;
    assert_eq!(report["productIds"]["unindexed"], json!(["stray"]));

    let response = app
        .clone()
        .oneshot(admin("POST", "/api/groups/uk/repair", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(admin("GET", "/api/groups/uk", None))
        .await
        .unwrap();
    let group = body_json(response).await;
    assert_eq!(group["productIds"], json!(["accounts-desktop", "stray"]));
}

#[tokio::test]
async fn test_health() {
    let temp_dir = TempDir::new().unwrap();
    let (app, _) = test_app(&temp_dir);
    let response = app.oneshot(public("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
