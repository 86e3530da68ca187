use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{identity_middleware, make_span_with_request_id, request_id_middleware},
    services::{CatalogProxies, IdentityResolver, ListService},
};

pub mod catalog;
pub mod lists;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub lists: ListService,
    pub identity: Arc<dyn IdentityResolver>,
    pub catalog: CatalogProxies,
}

impl FromRef<AppState> for ListService {
    fn from_ref(state: &AppState) -> Self {
        state.lists.clone()
    }
}

impl FromRef<AppState> for CatalogProxies {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(from_fn_with_state(
                    state.identity.clone(),
                    identity_middleware,
                )),
        )
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/lists", get(lists::index).post(lists::create))
        .route(
            "/lists/:id",
            get(lists::show).put(lists::update).delete(lists::destroy),
        )
        .route(
            "/lists/:id/items",
            post(lists::place_item).delete(lists::remove_item),
        )
        .route("/lists/:id/items/move", post(lists::move_item))
        .route("/movies", get(catalog::movies))
        .route("/movies/:id", get(catalog::movie))
        .route("/tv-shows", get(catalog::tv_shows))
        .route("/tv-shows/statuses", get(catalog::tv_show_statuses))
        .route("/tv-shows/:id", get(catalog::tv_show))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
