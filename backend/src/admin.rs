//! Token-gated CRUD endpoints used by the admin UI.

use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hub_common::{Article, ReleaseNote, SupportHubs};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::require_token;
use crate::error::{StoreError, StoreResult};
use crate::extract::{JsonBody, JsonPath};
use crate::store::GroupDocument;
use crate::{blocking, mutate, AppState};

type Shared = State<Arc<AppState>>;

pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/groups", get(list_groups).post(create_group))
        .route("/api/groups/{group}", get(get_group).put(update_group))
        .route("/api/groups/{group}/verify", get(verify_group))
        .route("/api/groups/{group}/repair", post(repair_group))
        .route(
            "/api/groups/{group}/{document}",
            get(get_group_document).put(put_group_document),
        )
        .route(
            "/api/groups/{group}/products",
            get(list_products).post(create_product),
        )
        .route(
            "/api/groups/{group}/products/{product}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route(
            "/api/groups/{group}/products/{product}/topics",
            get(list_topics).put(reconcile_topics),
        )
        .route(
            "/api/groups/{group}/products/{product}/topics/{topic}",
            get(get_topic),
        )
        .route(
            "/api/groups/{group}/products/{product}/topics/{topic}/articles",
            get(get_articles).put(put_articles),
        )
        .route(
            "/api/groups/{group}/products/{product}/articles",
            get(product_articles),
        )
        .route(
            "/api/groups/{group}/products/{product}/release-notes",
            get(get_release_notes).put(put_release_notes),
        )
        .route_layer(from_fn_with_state(state, require_token))
}

async fn list_groups(State(state): Shared) -> Result<Response, StoreError> {
    let groups = blocking(&state, |store| store.list_groups()).await?;
    Ok(Json(groups).into_response())
}

async fn create_group(
    State(state): Shared,
    JsonBody(draft): JsonBody<Value>,
) -> Result<Response, StoreError> {
    let group = mutate(&state, move |store| store.create_group(draft)).await?;
    Ok((StatusCode::CREATED, Json(group)).into_response())
}

async fn get_group(
    State(state): Shared,
    JsonPath(group): JsonPath<String>,
) -> Result<Response, StoreError> {
    let doc = blocking(&state, move |store| store.get_group(&group)).await?;
    Ok(Json(doc).into_response())
}

async fn update_group(
    State(state): Shared,
    JsonPath(group): JsonPath<String>,
    JsonBody(patch): JsonBody<Value>,
) -> Result<Response, StoreError> {
    let doc = mutate(&state, move |store| store.update_group(&group, patch)).await?;
    Ok(Json(doc).into_response())
}

async fn verify_group(
    State(state): Shared,
    JsonPath(group): JsonPath<String>,
) -> Result<Response, StoreError> {
    let report = blocking(&state, move |store| store.verify_group(&group)).await?;
    Ok(Json(report).into_response())
}

async fn repair_group(
    State(state): Shared,
    JsonPath(group): JsonPath<String>,
) -> Result<Response, StoreError> {
    let report = mutate(&state, move |store| store.repair_group(&group)).await?;
    Ok(Json(report).into_response())
}

fn group_document(name: &str) -> StoreResult<GroupDocument> {
    GroupDocument::parse(name).ok_or_else(|| StoreError::NotFound(format!("document {name}")))
}

async fn get_group_document(
    State(state): Shared,
    JsonPath((group, document)): JsonPath<(String, String)>,
) -> Result<Response, StoreError> {
    let doc = group_document(&document)?;
    let value = blocking(&state, move |store| store.read_group_document(&group, doc)).await?;
    Ok(Json(value).into_response())
}

async fn put_group_document(
    State(state): Shared,
    JsonPath((group, document)): JsonPath<(String, String)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Response, StoreError> {
    let doc = group_document(&document)?;
    let value = mutate(&state, move |store| store.write_group_document(&group, doc, body)).await?;
    Ok(Json(value).into_response())
}

async fn list_products(
    State(state): Shared,
    JsonPath(group): JsonPath<String>,
) -> Result<Response, StoreError> {
    let products = blocking(&state, move |store| store.list_products(&group)).await?;
    Ok(Json(products).into_response())
}

async fn create_product(
    State(state): Shared,
    JsonPath(group): JsonPath<String>,
    JsonBody(draft): JsonBody<Value>,
) -> Result<Response, StoreError> {
    let product = mutate(&state, move |store| store.create_product(&group, draft)).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

async fn get_product(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
) -> Result<Response, StoreError> {
    let doc = blocking(&state, move |store| store.get_product(&group, &product)).await?;
    Ok(Json(doc).into_response())
}

async fn update_product(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
    JsonBody(patch): JsonBody<Value>,
) -> Result<Response, StoreError> {
    let doc = mutate(&state, move |store| store.update_product(&group, &product, patch)).await?;
    Ok(Json(doc).into_response())
}

async fn delete_product(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
) -> Result<Response, StoreError> {
    let deleted = product.clone();
    mutate(&state, move |store| store.delete_product(&group, &product)).await?;
    Ok(Json(json!({ "success": true, "deleted": deleted })).into_response())
}

async fn list_topics(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
) -> Result<Response, StoreError> {
    let support_hubs = blocking(&state, move |store| store.list_topics(&group, &product)).await?;
    Ok(Json(SupportHubs { support_hubs }).into_response())
}

async fn reconcile_topics(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
    JsonBody(body): JsonBody<SupportHubs>,
) -> Result<Response, StoreError> {
    let support_hubs = mutate(&state, move |store| {
        store.reconcile_topics(&group, &product, body.support_hubs)
    })
    .await?;
    Ok(Json(SupportHubs { support_hubs }).into_response())
}

async fn get_topic(
    State(state): Shared,
    JsonPath((group, product, topic)): JsonPath<(String, String, String)>,
) -> Result<Response, StoreError> {
    let doc = blocking(&state, move |store| store.get_topic(&group, &product, &topic)).await?;
    Ok(Json(doc).into_response())
}

async fn get_articles(
    State(state): Shared,
    JsonPath((group, product, topic)): JsonPath<(String, String, String)>,
) -> Result<Response, StoreError> {
    let articles = blocking(&state, move |store| {
        store.get_articles(&group, &product, &topic)
    })
    .await?;
    Ok(Json(articles).into_response())
}

async fn put_articles(
    State(state): Shared,
    JsonPath((group, product, topic)): JsonPath<(String, String, String)>,
    JsonBody(articles): JsonBody<Vec<Article>>,
) -> Result<Response, StoreError> {
    let articles = mutate(&state, move |store| {
        store.put_articles(&group, &product, &topic, articles)
    })
    .await?;
    Ok(Json(articles).into_response())
}

async fn product_articles(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
) -> Result<Response, StoreError> {
    let index = blocking(&state, move |store| store.product_articles(&group, &product)).await?;
    Ok(Json(index).into_response())
}

async fn get_release_notes(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
) -> Result<Response, StoreError> {
    let notes = blocking(&state, move |store| store.get_release_notes(&group, &product)).await?;
    Ok(Json(notes).into_response())
}

async fn put_release_notes(
    State(state): Shared,
    JsonPath((group, product)): JsonPath<(String, String)>,
    JsonBody(notes): JsonBody<Vec<ReleaseNote>>,
) -> Result<Response, StoreError> {
    let notes = mutate(&state, move |store| {
        store.put_release_notes(&group, &product, notes)
    })
    .await?;
    Ok(Json(notes).into_response())
}
