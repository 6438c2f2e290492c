//! Public, country-resolved reads. No token; responses carry a shared cache policy.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Uri},
    middleware::map_response,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::extract::JsonPath;
use crate::store::{aggregate::Placement, ContentStore, GroupDocument};
use crate::{blocking, AppState};

pub const CACHE_POLICY: &str = "public, max-age=300, stale-while-revalidate=3600";

type Shared = State<Arc<AppState>>;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/public/data/{country}/group", get(group))
        .route("/api/public/data/{country}/products", get(products))
        .route("/api/public/data/{country}/products/{product}", get(product))
        .route(
            "/api/public/data/{country}/products/{product}/topics",
            get(product_topics),
        )
        .route(
            "/api/public/data/{country}/products/{product}/topics/{topic}/articles",
            get(topic_articles),
        )
        .route("/api/public/data/{country}/topics", get(topics))
        .route("/api/public/data/{country}/articles", get(articles))
        .route("/api/public/data/{country}/release-notes", get(release_notes))
        .route("/api/public/data/{country}/incidents", get(incidents))
        .route("/api/public/data/{country}/popups", get(popups))
        .route("/api/public/data/{country}/banners", get(banners))
        .route("/api/public/data/{country}/contact", get(contact))
        .layer(map_response(cache_policy))
}

/// Only successful reads may be cached downstream.
async fn cache_policy(mut response: Response) -> Response {
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
    }
    response
}

/// Serves from the response cache, keyed by request URI, or computes and stores.
async fn cached<T, F>(state: &AppState, uri: &Uri, f: F) -> StoreResult<Json<Value>>
where
    F: FnOnce(&ContentStore) -> StoreResult<T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let key = uri.to_string();
    if let Some(hit) = state.cache.get(&key) {
        return Ok(Json(hit));
    }
    let generation = state.cache.generation();
    let value = serde_json::to_value(blocking(state, f).await?)?;
    state.cache.insert(key, value.clone(), generation);
    Ok(Json(value))
}

async fn group(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.group_for_country(&country)).await
}

async fn products(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.products_for_country(&country)).await
}

async fn product(
    State(state): Shared,
    uri: Uri,
    JsonPath((country, product)): JsonPath<(String, String)>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.product_for_country(&country, &product)).await
}

async fn product_topics(
    State(state): Shared,
    uri: Uri,
    JsonPath((country, product)): JsonPath<(String, String)>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| {
        store.product_topics_for_country(&country, &product)
    })
    .await
}

async fn topic_articles(
    State(state): Shared,
    uri: Uri,
    JsonPath((country, product, topic)): JsonPath<(String, String, String)>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| {
        store.topic_articles_for_country(&country, &product, &topic)
    })
    .await
}

async fn topics(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.topics_for_country(&country)).await
}

async fn articles(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.articles_for_country(&country)).await
}

async fn release_notes(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.release_notes_for_country(&country)).await
}

async fn incidents(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.incidents_for_country(&country)).await
}

async fn popups(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
    Query(placement): Query<Placement>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| {
        store.announcements_for_country(&country, GroupDocument::Popups, &placement)
    })
    .await
}

async fn banners(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
    Query(placement): Query<Placement>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| {
        store.announcements_for_country(&country, GroupDocument::Banners, &placement)
    })
    .await
}

async fn contact(
    State(state): Shared,
    uri: Uri,
    JsonPath(country): JsonPath<String>,
) -> Result<Json<Value>, StoreError> {
    cached(&state, &uri, move |store| store.contact_for_country(&country)).await
}
