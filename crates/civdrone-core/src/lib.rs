//! Core logic for civilian drone assistance: geodesy, route planning,
//! advisory generation and subject tracking.

pub mod advice;
pub mod advisor;
pub mod alerting;
pub mod error;
pub mod geodesy;
pub mod history;
pub mod models;
pub mod route_planner;
pub mod tracker;

pub use advice::{FilmingAdvice, RouteAdvice, ShotSpec, WaypointHint};
pub use advisor::{
    Advised, AdvisorConfig, AdvisorStats, AdvisoryGenerator, ReasoningService, Unconfigured,
};
pub use alerting::{Alert, AlertManager, AlertSeverity, AlertThresholds};
pub use error::{FallbackReason, ReasoningError, UnknownVariant};
pub use geodesy::{bearing, distance, route_length};
pub use history::RingBuffer;
pub use models::{
    CameraAngle, Detection, FilmingKind, GeoPoint, OperationType, Position, Route, RouteKind,
    RouteSummary, SubjectInfo, TerrainInfo, TrackedSubject, TrackingStatus, Waypoint, Weather,
};
pub use route_planner::{PlannerConfig, RoutePlanner};
pub use tracker::{
    AdviceTopic, AdvisoryMessage, MessagePriority, SubjectTracker, TrackerConfig, TrackingSummary,
};
