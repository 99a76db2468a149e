//! Subject tracking endpoints, one tracker per camera session.

use axum::{
    extract::{Query, State},
    Json,
};
use civdrone_core::{
    AdvisoryMessage, Detection, Position, TrackedSubject, TrackingSummary,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Deserialize)]
pub struct TrackingUpdateRequest {
    #[serde(default = "default_session")]
    pub session_id: String,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub frame_number: u64,
    pub camera_position: Option<Position>,
}

#[derive(Debug, Serialize)]
pub struct TrackingUpdateResponse {
    pub session_id: String,
    pub subjects: Vec<TrackedSubject>,
    pub status: TrackingSummary,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default = "default_session")]
    pub session_id: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

fn default_count() -> usize {
    10
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrackingUpdateRequest>,
) -> Json<TrackingUpdateResponse> {
    let tracker = state.tracker(&request.session_id);
    let mut tracker = tracker.lock().await;
    let subjects = tracker
        .update_tracking(&request.detections, request.frame_number, request.camera_position)
        .await;
    let status = tracker.tracking_status();
    drop(tracker);
    state.observe_advisor();

    Json(TrackingUpdateResponse {
        session_id: request.session_id,
        subjects,
        status,
    })
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Json<TrackingSummary> {
    let summary = match state.existing_tracker(&query.session_id) {
        Some(tracker) => tracker.lock().await.tracking_status(),
        None => TrackingSummary {
            active_tracks: 0,
            total_tracked: 0,
            advice_count: 0,
            ai_enabled: state.advisor().is_ai_enabled(),
            subjects: Vec::new(),
        },
    };
    Json(summary)
}

pub async fn recent_advice(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Json<Vec<AdvisoryMessage>> {
    let advice = match state.existing_tracker(&query.session_id) {
        Some(tracker) => tracker.lock().await.recent_advice(query.count),
        None => Vec::new(),
    };
    Json(advice)
}

/// Clear and close a session; the next update starts from scratch.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Json<ClearResponse> {
    let cleared = match state.close_session(&query.session_id) {
        Some(tracker) => {
            tracker.lock().await.clear_history();
            true
        }
        None => false,
    };
    Json(ClearResponse { cleared })
}
