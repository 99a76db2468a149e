use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, state::AppState};

fn setup_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let state = Arc::new(AppState::new(&config).expect("state"));
    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _state) = setup_app();
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn filming_advice_without_service_serves_defaults() {
    let (app, state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/advice/filming",
            json!({
                "operation_type": "filming_wedding",
                "location": {"lat": 40.7128, "lon": -74.0060}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["reason"]["reason"], "service_not_configured");
    assert_eq!(body["advice"]["recommended_altitude_m"], 25.0);
    assert_eq!(body["advice"]["recommended_speed_mps"], 2.0);

    let stats = state.advisor_stats();
    assert_eq!(stats.fallbacks, 1);
    assert_eq!(stats.generated, 0);
}

#[tokio::test]
async fn unknown_operation_type_still_answers() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/advice/filming",
            json!({"operation_type": "skydiving"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["source"], "fallback");
}

#[tokio::test]
async fn hunting_advice_accepts_species_alias() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/advice/hunting",
            json!({
                "location": {"lat": 45.0, "lon": -110.0},
                "target_species": "elk",
                "weather": {"wind_direction_deg": 90.0}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["advice"]["waypoints"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn mustering_route_is_recorded_in_history() {
    let (app, _state) = setup_app();
    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/routes/mustering",
            json!({
                "herd_location": {"lat": -33.8688, "lon": 151.2093},
                "destination": {"lat": -33.8700, "lon": 151.2100},
                "herd_size": 50
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    assert_eq!(body["advised"], false);
    assert_eq!(body["fallback_reason"]["reason"], "service_not_configured");
    assert_eq!(body["route"]["kind"], "mustering");
    assert_eq!(body["route"]["waypoints"].as_array().unwrap().len(), 6);
    let route_id = body["route"]["route_id"].as_str().unwrap().to_string();

    let history = read_json(app.clone().oneshot(get("/v1/routes/history")).await.unwrap()).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["route_id"], route_id.as_str());
    assert_eq!(history[0]["waypoint_count"], 6);

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/routes/{route_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let route = read_json(res).await;
    assert_eq!(route["route_id"], route_id.as_str());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (app, _state) = setup_app();
    let res = app.oneshot(get("/v1/routes/general_0_0")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn general_route_uses_default_count() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/routes/general",
            json!({
                "start": {"lat": 0.0, "lon": 0.0},
                "end": {"lat": 0.01, "lon": 0.0}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    assert_eq!(body["advised"], false);
    assert!(body.get("fallback_reason").is_none());
    assert_eq!(body["route"]["kind"], "general");
    let waypoints = body["route"]["waypoints"].as_array().unwrap();
    assert_eq!(waypoints.len(), 6);
    assert_eq!(waypoints[0]["description"], "Starting position");
    assert_eq!(waypoints[5]["description"], "Destination");
}

#[tokio::test]
async fn oversized_waypoint_count_is_clamped() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/routes/general",
            json!({
                "start": {"lat": 0.0, "lon": 0.0},
                "end": {"lat": 0.01, "lon": 0.0},
                "waypoint_count": 1_000_000_000u64
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["route"]["waypoints"].as_array().unwrap().len(), 501);
}

#[tokio::test]
async fn fishing_route_flies_a_general_route() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/routes/fishing",
            json!({
                "location": {"lat": 10.0, "lon": 10.0},
                "destination": {"lat": 10.01, "lon": 10.0},
                "waypoint_count": 2
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["route"]["waypoints"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn filming_route_without_advice_skips_the_advisor() {
    let (app, state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/routes/filming",
            json!({
                "start": {"lat": 40.0, "lon": -74.0},
                "subjects": [{"lat": 40.001, "lon": -74.0}],
                "filming_kind": "event",
                "use_advice": false
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["route"]["kind"], "filming");
    assert_eq!(state.advisor_stats().fallbacks, 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (app, _state) = setup_app();
    let req = Request::builder()
        .method("POST")
        .uri("/v1/routes/general")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tracking_session_flow() {
    let (app, state) = setup_app();
    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/tracking/update",
            json!({
                "session_id": "cam1",
                "frame_number": 1,
                "detections": [
                    {"label": "person", "confidence": 0.9, "bbox": [0.0, 0.0, 50.0, 50.0]}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = read_json(res).await;
    assert_eq!(body["session_id"], "cam1");
    assert_eq!(body["subjects"][0]["subject_id"], "person_0");
    assert_eq!(body["subjects"][0]["tracking_status"], "tracking");
    assert_eq!(body["status"]["active_tracks"], 1);
    assert_eq!(body["status"]["ai_enabled"], false);

    let advice = read_json(
        app.clone()
            .oneshot(get("/v1/tracking/advice?session_id=cam1&count=5"))
            .await
            .unwrap(),
    )
    .await;
    let advice = advice.as_array().unwrap();
    assert_eq!(advice.len(), 1);
    assert_eq!(advice[0]["advice_type"], "framing");
    assert_eq!(advice[0]["priority"], "medium");

    let cleared = read_json(
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/tracking/clear?session_id=cam1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cleared["cleared"], true);
    assert_eq!(state.session_count(), 0);

    let status = read_json(
        app.clone()
            .oneshot(get("/v1/tracking/status?session_id=cam1"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["active_tracks"], 0);
    assert_eq!(status["advice_count"], 0);
}

#[tokio::test]
async fn least_recently_used_session_is_evicted() {
    let config = Config {
        max_sessions: 2,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(&config).expect("state"));
    let app = api::routes().with_state(state.clone());

    for session in ["cam1", "cam2", "cam1", "cam3"] {
        let res = app
            .clone()
            .oneshot(post_json(
                "/v1/tracking/update",
                json!({"session_id": session, "frame_number": 1, "detections": []}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(state.session_count(), 2);
    assert!(state.existing_tracker("cam1").is_some());
    assert!(state.existing_tracker("cam2").is_none());
    assert!(state.existing_tracker("cam3").is_some());
}

#[tokio::test]
async fn clearing_unknown_session_reports_nothing_cleared() {
    let (app, state) = setup_app();
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/tracking/clear?session_id=ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(read_json(res).await["cleared"], false);
    assert_eq!(state.session_count(), 0);
}

#[tokio::test]
async fn unknown_tracking_session_is_empty() {
    let (app, state) = setup_app();
    let status = read_json(
        app.clone()
            .oneshot(get("/v1/tracking/status?session_id=nobody"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["active_tracks"], 0);
    assert!(state.existing_tracker("nobody").is_none());
}

#[tokio::test]
async fn request_id_is_echoed_or_minted() {
    let (app, _state) = setup_app();
    let req = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");

    let res = app.oneshot(get("/health")).await.unwrap();
    let minted = res.headers()["x-request-id"].to_str().unwrap();
    assert!(!minted.is_empty());
}

#[tokio::test]
async fn offline_advisor_raises_no_alerts() {
    let (app, _state) = setup_app();
    for _ in 0..3 {
        app.clone()
            .oneshot(post_json("/v1/advice/general", json!({"question": "Best altitude?"})))
            .await
            .unwrap();
    }

    let stats = read_json(app.clone().oneshot(get("/v1/advisor/stats")).await.unwrap()).await;
    assert_eq!(stats["ai_enabled"], false);
    assert_eq!(stats["fallbacks"], 3);

    let alerts = read_json(app.oneshot(get("/v1/alerts")).await.unwrap()).await;
    assert_eq!(alerts.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn general_advice_fallback_text() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json("/v1/advice/general", json!({"question": "Best altitude?"})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["advice"], civdrone_core::advisor::GENERAL_ADVICE_UNAVAILABLE);
}

#[tokio::test]
async fn chat_falls_back_to_canned_reply() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(post_json(
            "/v1/advice/chat",
            json!({"message": "plan my shoot", "mode": "filming"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["generated"], false);
    assert_eq!(
        body["response"],
        "I understand you want help with: \"plan my shoot\" in filming mode. I can assist with \
         route planning, operation advice, and mission coordination."
    );
}
