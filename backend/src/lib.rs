pub mod admin;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod public;
pub mod store;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use cache::ResponseCache;
use config::Config;
use error::StoreResult;
use store::ContentStore;

pub struct AppState {
    pub store: Arc<ContentStore>,
    pub cache: ResponseCache,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: Arc::new(ContentStore::new(
                config.content_dir.clone(),
                config.default_group.clone(),
            )),
            cache: ResponseCache::new(config.cache_ttl, config.cache_capacity),
            config,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(public::public_routes())
        .merge(admin::admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs a store operation on the blocking pool; the store is synchronous `std::fs`.
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> StoreResult<T>
where
    F: FnOnce(&ContentStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || f(&store)).await?
}

/// Like [`blocking`], dropping cached public responses when the mutation succeeds.
pub(crate) async fn mutate<T, F>(state: &AppState, f: F) -> StoreResult<T>
where
    F: FnOnce(&ContentStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let result = blocking(state, f).await;
    if result.is_ok() {
        state.cache.invalidate();
    }
    result
}
