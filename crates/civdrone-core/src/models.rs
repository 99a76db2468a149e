//! Core data models for civilian drone operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownVariant;

/// Horizontal position in decimal degrees.
///
/// Missing coordinates deserialize as 0.0 so partially filled requests still
/// produce a usable point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Position with altitude, as reported by the drone or camera rig.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default, alias = "altitude_m")]
    pub alt: f64,
}

/// A single targeted flight point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    /// Degrees in `[0, 360)`, 0 = north
    pub heading_deg: f64,
    pub speed_mps: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_angle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
}

impl Waypoint {
    pub fn new(
        lat: f64,
        lon: f64,
        altitude_m: f64,
        heading_deg: f64,
        speed_mps: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            lat,
            lon,
            altitude_m,
            heading_deg,
            speed_mps,
            description: description.into(),
            shot_type: None,
            camera_angle: None,
            duration_s: None,
        }
    }

    pub fn at(point: GeoPoint, altitude_m: f64, speed_mps: f64, description: impl Into<String>) -> Self {
        Self::new(point.lat, point.lon, altitude_m, 0.0, speed_mps, description)
    }

    /// Attach filming metadata.
    pub fn with_shot(
        mut self,
        shot_type: Option<String>,
        camera_angle: Option<String>,
        duration_s: f64,
    ) -> Self {
        self.shot_type = shot_type;
        self.camera_angle = camera_angle;
        self.duration_s = Some(duration_s);
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Kind of planned route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Filming,
    Mustering,
    Hunting,
    Surveying,
    Inspection,
    General,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Filming => "filming",
            RouteKind::Mustering => "mustering",
            RouteKind::Hunting => "hunting",
            RouteKind::Surveying => "surveying",
            RouteKind::Inspection => "inspection",
            RouteKind::General => "general",
        }
    }

    /// Fixed operational-risk score for routes of this kind.
    pub fn safety_score(&self) -> f64 {
        match self {
            RouteKind::Filming => 0.9,
            RouteKind::Mustering => 0.85,
            RouteKind::Hunting => 0.8,
            RouteKind::Surveying | RouteKind::Inspection | RouteKind::General => 0.9,
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assembled route with aggregate metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub kind: RouteKind,
    pub waypoints: Vec<Waypoint>,
    pub total_distance_m: f64,
    pub estimated_duration_s: f64,
    pub safety_score: f64,
    pub optimization_tips: Vec<String>,
    pub weather_considerations: String,
    pub terrain_notes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            route_id: self.route_id.clone(),
            kind: self.kind,
            waypoint_count: self.waypoints.len(),
            total_distance_m: self.total_distance_m,
            estimated_duration_s: self.estimated_duration_s,
            safety_score: self.safety_score,
            created_at: self.created_at,
        }
    }
}

/// Lightweight view of a route kept in history listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub route_id: String,
    pub kind: RouteKind,
    pub waypoint_count: usize,
    pub total_distance_m: f64,
    pub estimated_duration_s: f64,
    pub safety_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Type of civilian operation an advice request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    FilmingWedding,
    FilmingAdvertisement,
    FilmingEvent,
    Mustering,
    Hunting,
    Surveying,
    Inspection,
    SearchRescue,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::FilmingWedding => "filming_wedding",
            OperationType::FilmingAdvertisement => "filming_advertisement",
            OperationType::FilmingEvent => "filming_event",
            OperationType::Mustering => "mustering",
            OperationType::Hunting => "hunting",
            OperationType::Surveying => "surveying",
            OperationType::Inspection => "inspection",
            OperationType::SearchRescue => "search_rescue",
        }
    }

    /// Parse a transport-level string, substituting `default` when it is
    /// missing or unknown. The substitution is logged.
    pub fn parse_or(raw: Option<&str>, default: OperationType) -> OperationType {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            None => {
                tracing::debug!(operation_type = %default, "operation type missing, using default");
                default
            }
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    requested = value,
                    substituted = %default,
                    "unknown operation type, using default"
                );
                default
            }),
        }
    }

    pub fn filming_kind(&self) -> Option<FilmingKind> {
        match self {
            OperationType::FilmingWedding => Some(FilmingKind::Wedding),
            OperationType::FilmingAdvertisement => Some(FilmingKind::Advertisement),
            OperationType::FilmingEvent => Some(FilmingKind::Event),
            _ => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match s.trim().to_ascii_lowercase().as_str() {
            "filming_wedding" | "wedding" => OperationType::FilmingWedding,
            "filming_advertisement" | "advertisement" => OperationType::FilmingAdvertisement,
            "filming_event" | "event" => OperationType::FilmingEvent,
            "mustering" => OperationType::Mustering,
            "hunting" => OperationType::Hunting,
            "surveying" => OperationType::Surveying,
            "inspection" => OperationType::Inspection,
            "search_rescue" => OperationType::SearchRescue,
            _ => return Err(UnknownVariant(s.to_string())),
        };
        Ok(value)
    }
}

/// Filming sub-type; decides orbit behaviour in filming routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilmingKind {
    #[default]
    Wedding,
    Advertisement,
    Event,
}

impl FilmingKind {
    pub fn operation_type(&self) -> OperationType {
        match self {
            FilmingKind::Wedding => OperationType::FilmingWedding,
            FilmingKind::Advertisement => OperationType::FilmingAdvertisement,
            FilmingKind::Event => OperationType::FilmingEvent,
        }
    }
}

impl FromStr for FilmingKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<OperationType>()
            .ok()
            .and_then(|op| op.filming_kind())
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Weather conditions supplied with an advice request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    #[serde(default)]
    pub wind_speed_mps: Option<f64>,
    /// Direction the wind blows from, degrees
    #[serde(default)]
    pub wind_direction_deg: Option<f64>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainInfo {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub hazards: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectInfo {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub moving: Option<bool>,
}

/// Object detection result for one subject in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub confidence: f64,
    /// `[x1, y1, x2, y2]` in pixels
    #[serde(default)]
    pub bbox: [f64; 4],
    #[serde(default)]
    pub class_id: Option<u32>,
    /// Stable id from an upstream tracker, if any
    #[serde(default)]
    pub subject_id: Option<String>,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
            class_id: None,
            subject_id: None,
        }
    }

    pub fn with_subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraAngle {
    Overhead,
    Side,
    LowAngle,
}

impl fmt::Display for CameraAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CameraAngle::Overhead => "overhead",
            CameraAngle::Side => "side",
            CameraAngle::LowAngle => "low_angle",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    #[default]
    Tracking,
    Lost,
    Reacquired,
}

/// Per-subject tracking state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSubject {
    pub subject_id: String,
    pub label: String,
    pub position: Position,
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub frame_number: u64,
    pub timestamp: DateTime<Utc>,
    pub camera_angle: CameraAngle,
    pub framing_quality: f64,
    pub tracking_status: TrackingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_type_round_trips_through_serde_names() {
        let json = serde_json::to_string(&OperationType::FilmingAdvertisement).unwrap();
        assert_eq!(json, "\"filming_advertisement\"");
        assert_eq!(
            "filming_advertisement".parse::<OperationType>().unwrap(),
            OperationType::FilmingAdvertisement
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "skydiving".parse::<OperationType>().unwrap_err();
        assert_eq!(err, UnknownVariant("skydiving".to_string()));
        assert_eq!(err.to_string(), "unknown variant: skydiving");
        assert!("mustering".parse::<FilmingKind>().is_err());
        assert_eq!("Event".parse::<FilmingKind>().unwrap(), FilmingKind::Event);
    }

    #[test]
    fn parse_or_substitutes_unknown_values() {
        assert_eq!(
            OperationType::parse_or(Some("skydiving"), OperationType::Surveying),
            OperationType::Surveying
        );
        assert_eq!(
            OperationType::parse_or(None, OperationType::FilmingWedding),
            OperationType::FilmingWedding
        );
        assert_eq!(
            OperationType::parse_or(Some(" Hunting "), OperationType::Surveying),
            OperationType::Hunting
        );
    }

    #[test]
    fn filming_kind_accepts_short_and_long_names() {
        assert_eq!("advertisement".parse::<FilmingKind>().unwrap(), FilmingKind::Advertisement);
        assert_eq!("filming_event".parse::<FilmingKind>().unwrap(), FilmingKind::Event);
        assert!("mustering".parse::<FilmingKind>().is_err());
    }

    #[test]
    fn geo_point_defaults_missing_coordinates() {
        let point: GeoPoint = serde_json::from_str(r#"{"lat": 12.5}"#).unwrap();
        assert_eq!(point, GeoPoint::new(12.5, 0.0));
    }

    #[test]
    fn camera_angle_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&CameraAngle::LowAngle).unwrap(), "\"low_angle\"");
    }
}
