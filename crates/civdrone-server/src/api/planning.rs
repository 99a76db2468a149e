//! Route planning endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use civdrone_core::{
    Advised, FallbackReason, FilmingKind, GeoPoint, Route, RouteSummary, SubjectInfo,
    TerrainInfo, Weather,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::location_or_default;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilmingRouteRequest {
    #[serde(alias = "location")]
    pub start: Option<GeoPoint>,
    #[serde(default)]
    pub subjects: Vec<GeoPoint>,
    pub destination: Option<GeoPoint>,
    #[serde(alias = "operation")]
    pub filming_kind: Option<String>,
    #[serde(alias = "subject")]
    pub subject_info: Option<SubjectInfo>,
    pub weather: Option<Weather>,
    #[serde(default = "default_true")]
    pub use_advice: bool,
}

#[derive(Debug, Deserialize)]
pub struct MusteringRouteRequest {
    #[serde(alias = "location")]
    pub herd_location: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub herd_size: Option<u32>,
    pub terrain: Option<TerrainInfo>,
    #[serde(default = "default_true")]
    pub use_advice: bool,
}

#[derive(Debug, Deserialize)]
pub struct HuntingRouteRequest {
    #[serde(alias = "location")]
    pub start: Option<GeoPoint>,
    #[serde(alias = "destination")]
    pub target_location: Option<GeoPoint>,
    #[serde(alias = "target_species")]
    pub animal_type: Option<String>,
    pub terrain: Option<TerrainInfo>,
    pub weather: Option<Weather>,
    /// Overrides `weather.wind_direction_deg`
    pub wind_direction: Option<f64>,
    #[serde(default = "default_true")]
    pub use_advice: bool,
}

#[derive(Debug, Deserialize)]
pub struct GeneralRouteRequest {
    #[serde(alias = "location")]
    pub start: Option<GeoPoint>,
    #[serde(alias = "destination")]
    pub end: Option<GeoPoint>,
    #[serde(default = "default_waypoint_count")]
    pub waypoint_count: usize,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: Route,
    /// True when generated advice shaped the route
    pub advised: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl RouteResponse {
    fn plain(route: Route) -> Self {
        Self {
            route,
            advised: false,
            fallback_reason: None,
        }
    }

    fn from_advised(route: Advised<Route>) -> Self {
        let advised = !route.is_fallback();
        let fallback_reason = route.fallback_reason().cloned();
        Self {
            route: route.into_inner(),
            advised,
            fallback_reason,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_waypoint_count() -> usize {
    5
}

pub async fn plan_filming(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilmingRouteRequest>,
) -> Json<RouteResponse> {
    let start = location_or_default("start", request.start);
    let subjects = if request.subjects.is_empty() {
        vec![request.destination.unwrap_or(start)]
    } else {
        request.subjects
    };
    let kind = match request.filming_kind.as_deref() {
        None => FilmingKind::default(),
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(requested = raw, "unknown filming kind, filming a wedding");
            FilmingKind::default()
        }),
    };

    if !request.use_advice {
        let route = state.with_planner(|planner| {
            planner.plan_filming_route(&start, &subjects, kind, None)
        });
        return Json(RouteResponse::plain(route));
    }

    let advice = state
        .advisor()
        .request_filming_advice(
            kind.operation_type(),
            &start,
            request.subject_info.as_ref(),
            request.weather.as_ref(),
        )
        .await;
    state.observe_advisor();
    let route = advice.map(|advice| {
        state.with_planner(|planner| {
            planner.plan_filming_route(&start, &subjects, kind, Some(&advice))
        })
    });
    Json(RouteResponse::from_advised(route))
}

pub async fn plan_mustering(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MusteringRouteRequest>,
) -> Json<RouteResponse> {
    let herd = location_or_default("herd_location", request.herd_location);
    let destination = location_or_default("destination", request.destination);
    let terrain = request.terrain.as_ref();

    if !request.use_advice {
        let route = state.with_planner(|planner| {
            planner.plan_mustering_route(&herd, &destination, request.herd_size, terrain)
        });
        return Json(RouteResponse::plain(route));
    }

    let advice = state
        .advisor()
        .request_mustering_advice(&herd, &destination, request.herd_size, terrain)
        .await;
    state.observe_advisor();
    let route = advice.map(|advice| {
        state.with_planner(|planner| {
            planner.plan_mustering_route_with_advice(
                &herd,
                &destination,
                request.herd_size,
                terrain,
                &advice,
            )
        })
    });
    Json(RouteResponse::from_advised(route))
}

pub async fn plan_hunting(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HuntingRouteRequest>,
) -> Json<RouteResponse> {
    let start = location_or_default("start", request.start);
    let target = location_or_default("target_location", request.target_location);
    let animal_type = request.animal_type.unwrap_or_else(|| "deer".to_string());
    let terrain = request.terrain.as_ref();
    let wind = request
        .wind_direction
        .or_else(|| request.weather.as_ref().and_then(|w| w.wind_direction_deg));

    if !request.use_advice {
        let route = state.with_planner(|planner| {
            planner.plan_hunting_route(&start, &target, &animal_type, terrain, wind)
        });
        return Json(RouteResponse::plain(route));
    }

    let advice = state
        .advisor()
        .request_hunting_advice(&target, &animal_type, terrain, request.weather.as_ref())
        .await;
    state.observe_advisor();
    let route = advice.map(|advice| {
        state.with_planner(|planner| {
            planner.plan_hunting_route_with_advice(
                &start,
                &target,
                &animal_type,
                terrain,
                wind,
                &advice,
            )
        })
    });
    Json(RouteResponse::from_advised(route))
}

pub async fn plan_general(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeneralRouteRequest>,
) -> Json<RouteResponse> {
    let start = location_or_default("start", request.start);
    let end = location_or_default("end", request.end);
    let route = state.with_planner(|planner| {
        planner.plan_general_route(&start, &end, request.waypoint_count)
    });
    Json(RouteResponse::plain(route))
}

pub async fn route_history(State(state): State<Arc<AppState>>) -> Json<Vec<RouteSummary>> {
    Json(state.with_planner(|planner| planner.route_history()))
}

pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<Route>, StatusCode> {
    state
        .with_planner(|planner| planner.get_route(&route_id).cloned())
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
