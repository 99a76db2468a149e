//! Advice endpoints.

use axum::{extract::State, Json};
use civdrone_core::{
    Advised, FilmingAdvice, GeoPoint, OperationType, RouteAdvice, SubjectInfo, TerrainInfo,
    Weather,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::location_or_default;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilmingAdviceRequest {
    pub operation_type: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(default, alias = "subject")]
    pub subject_info: Option<SubjectInfo>,
    #[serde(default, alias = "conditions")]
    pub weather: Option<Weather>,
}

#[derive(Debug, Deserialize)]
pub struct MusteringAdviceRequest {
    #[serde(alias = "location")]
    pub herd_location: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub herd_size: Option<u32>,
    pub terrain: Option<TerrainInfo>,
}

#[derive(Debug, Deserialize)]
pub struct HuntingAdviceRequest {
    #[serde(alias = "location")]
    pub target_location: Option<GeoPoint>,
    #[serde(alias = "target_species")]
    pub animal_type: Option<String>,
    pub terrain: Option<TerrainInfo>,
    pub weather: Option<Weather>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralAdviceRequest {
    pub question: Option<String>,
    pub operation_type: Option<String>,
    pub context: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub conversation_history: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub generated: bool,
}

fn default_mode() -> String {
    "general".to_string()
}

pub async fn filming_advice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilmingAdviceRequest>,
) -> Json<Advised<FilmingAdvice>> {
    let operation = OperationType::parse_or(
        request.operation_type.as_deref(),
        OperationType::FilmingWedding,
    );
    let location = location_or_default("location", request.location);
    let advised = state
        .advisor()
        .request_filming_advice(
            operation,
            &location,
            request.subject_info.as_ref(),
            request.weather.as_ref(),
        )
        .await;
    state.observe_advisor();
    Json(advised)
}

pub async fn mustering_advice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MusteringAdviceRequest>,
) -> Json<Advised<RouteAdvice>> {
    let herd = location_or_default("herd_location", request.herd_location);
    let destination = location_or_default("destination", request.destination);
    let advised = state
        .advisor()
        .request_mustering_advice(&herd, &destination, request.herd_size, request.terrain.as_ref())
        .await;
    state.observe_advisor();
    Json(advised)
}

pub async fn hunting_advice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HuntingAdviceRequest>,
) -> Json<Advised<RouteAdvice>> {
    let target = location_or_default("target_location", request.target_location);
    let animal_type = request.animal_type.unwrap_or_else(|| "deer".to_string());
    let advised = state
        .advisor()
        .request_hunting_advice(
            &target,
            &animal_type,
            request.terrain.as_ref(),
            request.weather.as_ref(),
        )
        .await;
    state.observe_advisor();
    Json(advised)
}

pub async fn general_advice(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeneralAdviceRequest>,
) -> Json<Advised<String>> {
    let question = match request.question.filter(|q| !q.trim().is_empty()) {
        Some(question) => question,
        None => {
            let operation =
                OperationType::parse_or(request.operation_type.as_deref(), OperationType::Surveying);
            format!("Provide general operational advice for a {operation} drone operation.")
        }
    };
    let advised = state
        .advisor()
        .request_general_advice(&question, request.context.as_ref(), None)
        .await;
    state.observe_advisor();
    Json(advised)
}

/// Conversational assistance in a given operation mode.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let context = json!({
        "mode": request.mode,
        "conversation_history": request.conversation_history,
    });
    let system_prompt = format!(
        "You are an expert assistant for civilian drone operations in {} mode. \
         Provide helpful, concise advice.",
        request.mode
    );
    let advised = state
        .advisor()
        .request_general_advice(&request.message, Some(&context), Some(&system_prompt))
        .await;
    state.observe_advisor();

    let response = match advised {
        Advised::Generated { advice } => ChatResponse {
            response: advice,
            generated: true,
        },
        Advised::Fallback { .. } => ChatResponse {
            response: format!(
                "I understand you want help with: \"{}\" in {} mode. I can assist with route \
                 planning, operation advice, and mission coordination.",
                request.message, request.mode
            ),
            generated: false,
        },
    };
    Json(response)
}
