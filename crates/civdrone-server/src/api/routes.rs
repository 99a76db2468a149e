//! REST API routes.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use civdrone_core::{Alert, AdvisorStats};
use std::sync::Arc;

use crate::api::{advice, planning, request_id, tracking};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let advice_routes = Router::new()
        .route("/v1/advice/filming", post(advice::filming_advice))
        .route("/v1/advice/mustering", post(advice::mustering_advice))
        .route("/v1/advice/hunting", post(advice::hunting_advice))
        .route("/v1/advice/general", post(advice::general_advice))
        .route("/v1/advice/chat", post(advice::chat));

    let route_routes = Router::new()
        .route("/v1/routes/filming", post(planning::plan_filming))
        .route("/v1/routes/mustering", post(planning::plan_mustering))
        .route("/v1/routes/hunting", post(planning::plan_hunting))
        .route("/v1/routes/general", post(planning::plan_general))
        // No dedicated fishing algorithm; fishing trips fly a general route.
        .route("/v1/routes/fishing", post(planning::plan_general))
        .route("/v1/routes/history", get(planning::route_history))
        .route("/v1/routes/:route_id", get(planning::get_route));

    let tracking_routes = Router::new()
        .route("/v1/tracking/update", post(tracking::update))
        .route("/v1/tracking/status", get(tracking::status))
        .route("/v1/tracking/advice", get(tracking::recent_advice))
        .route("/v1/tracking/clear", post(tracking::clear));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/advisor/stats", get(advisor_stats))
        .route("/v1/alerts", get(list_alerts))
        .merge(advice_routes)
        .merge(route_routes)
        .merge(tracking_routes)
        .layer(middleware::from_fn(request_id::ensure_request_id))
}

async fn advisor_stats(State(state): State<Arc<AppState>>) -> Json<AdvisorStats> {
    Json(state.advisor_stats())
}

async fn list_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<Alert>> {
    Json(state.active_alerts())
}
