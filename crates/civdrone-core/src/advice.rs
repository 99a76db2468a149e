//! Advice documents, their deterministic defaults, and repair of
//! partially valid documents returned by a reasoning service.

use crate::geodesy::{midpoint, offset, offset_polar};
use crate::models::{GeoPoint, OperationType};
use serde::{Deserialize, Serialize};

/// Angular radius of the hunting approach offset, degrees (~22 m).
pub const HUNTING_APPROACH_RADIUS_DEG: f64 = 0.0002;
pub const HUNTING_SCOUT_ALTITUDE_M: f64 = 50.0;
pub const HUNTING_APPROACH_ALTITUDE_M: f64 = 40.0;
pub const HUNTING_OBSERVE_ALTITUDE_M: f64 = 35.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSpec {
    #[serde(default)]
    pub shot_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "duration")]
    pub duration_s: f64,
}

impl ShotSpec {
    fn new(shot_type: &str, description: &str, duration_s: f64) -> Self {
        Self {
            shot_type: shot_type.to_string(),
            description: description.to_string(),
            duration_s,
        }
    }
}

/// Advice for a filming operation. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmingAdvice {
    pub recommended_altitude_m: f64,
    pub recommended_speed_mps: f64,
    pub camera_angles: Vec<String>,
    pub shot_sequence: Vec<ShotSpec>,
    pub lighting_advice: String,
    pub weather_considerations: String,
    pub framing_tips: Vec<String>,
    pub tracking_strategy: String,
}

impl FilmingAdvice {
    /// Deterministic advice used when no generated advice is available.
    pub fn default_for(operation: OperationType) -> Self {
        match operation {
            OperationType::FilmingWedding => Self {
                recommended_altitude_m: 25.0,
                recommended_speed_mps: 2.0,
                camera_angles: strings(&["overhead", "side", "follow", "reveal"]),
                shot_sequence: vec![
                    ShotSpec::new("establishing", "Wide shot of venue", 5.0),
                    ShotSpec::new("following", "Follow couple walking", 10.0),
                    ShotSpec::new("overhead", "Aerial view of ceremony", 15.0),
                    ShotSpec::new("reveal", "Reveal shot of venue", 8.0),
                ],
                lighting_advice:
                    "Golden hour (sunrise/sunset) provides best lighting. Avoid harsh midday sun."
                        .to_string(),
                weather_considerations:
                    "Clear skies preferred. Wind speeds should be below 10 m/s for stable footage."
                        .to_string(),
                framing_tips: strings(&[
                    "Keep couple centered in frame",
                    "Use rule of thirds for composition",
                    "Maintain smooth, gradual movements",
                    "Capture both wide and close-up shots",
                ]),
                tracking_strategy: "Use smooth follow mode with gradual altitude changes. \
                     Maintain consistent distance from subjects."
                    .to_string(),
            },
            OperationType::FilmingAdvertisement => Self {
                recommended_altitude_m: 40.0,
                recommended_speed_mps: 4.0,
                camera_angles: strings(&["overhead", "orbit", "dolly", "crane"]),
                shot_sequence: vec![
                    ShotSpec::new("establishing", "Wide establishing shot", 3.0),
                    ShotSpec::new("orbit", "Orbit around subject", 8.0),
                    ShotSpec::new("dolly", "Forward tracking shot", 5.0),
                    ShotSpec::new("reveal", "Dramatic reveal", 4.0),
                ],
                lighting_advice: "Professional lighting setup recommended. \
                     Consider time of day for natural lighting."
                    .to_string(),
                weather_considerations:
                    "Controlled environment preferred. Check for wind and precipitation."
                        .to_string(),
                framing_tips: strings(&[
                    "Dynamic camera movements",
                    "Multiple angles for variety",
                    "Smooth transitions between shots",
                    "Focus on product/subject",
                ]),
                tracking_strategy: "Precise tracking with multiple waypoints. \
                     Use orbit and dolly movements for dynamic shots."
                    .to_string(),
            },
            _ => Self {
                recommended_altitude_m: 30.0,
                recommended_speed_mps: 3.0,
                camera_angles: strings(&["overhead", "side", "follow"]),
                shot_sequence: Vec::new(),
                lighting_advice: "Use natural lighting when possible".to_string(),
                weather_considerations: "Check weather conditions before flight".to_string(),
                framing_tips: strings(&["Keep subject centered", "Use rule of thirds"]),
                tracking_strategy: "Smooth tracking with gradual movements".to_string(),
            },
        }
    }

    /// Fill every missing or unusable field of `partial` from `fallback`.
    pub fn repair(partial: PartialFilmingAdvice, fallback: FilmingAdvice) -> Self {
        let shot_sequence = partial
            .shot_sequence
            .map(|shots| {
                shots
                    .into_iter()
                    .filter(|shot| !shot.shot_type.trim().is_empty())
                    .map(|shot| ShotSpec {
                        duration_s: positive(Some(shot.duration_s)).unwrap_or(10.0),
                        ..shot
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|shots| !shots.is_empty());

        Self {
            recommended_altitude_m: positive(partial.recommended_altitude_m)
                .unwrap_or(fallback.recommended_altitude_m),
            recommended_speed_mps: positive(partial.recommended_speed_mps)
                .unwrap_or(fallback.recommended_speed_mps),
            camera_angles: non_empty_list(partial.camera_angles).unwrap_or(fallback.camera_angles),
            shot_sequence: shot_sequence.unwrap_or(fallback.shot_sequence),
            lighting_advice: non_blank(partial.lighting_advice).unwrap_or(fallback.lighting_advice),
            weather_considerations: non_blank(partial.weather_considerations)
                .unwrap_or(fallback.weather_considerations),
            framing_tips: non_empty_list(partial.framing_tips).unwrap_or(fallback.framing_tips),
            tracking_strategy: non_blank(partial.tracking_strategy)
                .unwrap_or(fallback.tracking_strategy),
        }
    }
}

/// Filming advice as returned by a reasoning service; any field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialFilmingAdvice {
    #[serde(alias = "recommended_altitude")]
    pub recommended_altitude_m: Option<f64>,
    #[serde(alias = "recommended_speed")]
    pub recommended_speed_mps: Option<f64>,
    pub camera_angles: Option<Vec<String>>,
    pub shot_sequence: Option<Vec<ShotSpec>>,
    pub lighting_advice: Option<String>,
    pub weather_considerations: Option<String>,
    pub framing_tips: Option<Vec<String>>,
    pub tracking_strategy: Option<String>,
}

/// Simplified position hint inside route advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointHint {
    /// `[lat, lon, altitude_m]`
    pub position: [f64; 3],
    #[serde(default)]
    pub altitude_m: f64,
    #[serde(default)]
    pub description: String,
}

impl WaypointHint {
    pub fn new(point: GeoPoint, altitude_m: f64, description: &str) -> Self {
        Self {
            position: [point.lat, point.lon, altitude_m],
            altitude_m,
            description: description.to_string(),
        }
    }
}

/// Advice for mustering and hunting operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAdvice {
    pub waypoints: Vec<WaypointHint>,
    pub recommended_path: String,
    pub timing_advice: String,
    pub safety_considerations: Vec<String>,
    pub optimization_tips: Vec<String>,
}

impl RouteAdvice {
    pub fn mustering_default(herd: &GeoPoint, destination: &GeoPoint) -> Self {
        Self {
            waypoints: mustering_hints(herd, destination),
            recommended_path: "Gradual approach with wide arcs to avoid stressing animals"
                .to_string(),
            timing_advice: "Early morning (6-8 AM) or late afternoon (4-6 PM) when animals are \
                 most active and temperatures are moderate"
                .to_string(),
            safety_considerations: strings(&[
                "Maintain minimum 20m altitude to avoid spooking animals",
                "Use gradual movements - avoid sudden direction changes",
                "Watch for terrain obstacles (fences, water, steep slopes)",
                "If the herd scatters, stop pushing and climb until animals settle",
                "Ensure clear communication with ground crew if present",
            ]),
            optimization_tips: strings(&[
                "Start with wide arcs around the herd to gather them",
                "Use side-to-side movements to guide direction",
                "Maintain consistent altitude (20-30m recommended)",
                "Work with natural terrain features (valleys, ridges)",
                "Plan route to avoid obstacles and hazards",
                "Consider wind direction - animals may move with or against wind",
            ]),
        }
    }

    pub fn hunting_default(target: &GeoPoint, wind_direction_deg: Option<f64>) -> Self {
        Self {
            waypoints: hunting_hints(target, wind_direction_deg),
            recommended_path:
                "Stealth approach using terrain cover, approach from downwind direction"
                    .to_string(),
            timing_advice: "Early morning (dawn) or late afternoon (dusk) when animals are most \
                 active. Avoid midday when animals rest."
                .to_string(),
            safety_considerations: strings(&[
                "Maintain legal altitude (typically 120m/400ft maximum)",
                "Respect wildlife - do not harass or stress animals",
                "Follow all local hunting regulations and seasons",
                "Ensure safe shooting angles - never shoot toward populated areas",
                "Maintain visual line of sight at all times",
                "Check for other hunters in the area",
            ]),
            optimization_tips: strings(&[
                "Approach from downwind to avoid detection by scent",
                "Use terrain features (ridges, valleys) for cover",
                "Plan approach route to minimize noise",
                "Consider animal behavior patterns for the species",
                "Use low altitude (30-50m) for stealth when legal",
                "Plan multiple approach angles as backup",
                "Monitor wind direction and adjust approach accordingly",
            ]),
        }
    }

    /// Fill every missing or unusable field of `partial` from `fallback`.
    pub fn repair(partial: PartialRouteAdvice, fallback: RouteAdvice) -> Self {
        let waypoints = partial
            .waypoints
            .map(|hints| {
                hints
                    .into_iter()
                    .filter(|hint| hint.position.iter().all(|v| v.is_finite()))
                    .map(|hint| WaypointHint {
                        altitude_m: positive(Some(hint.altitude_m)).unwrap_or(hint.position[2]),
                        ..hint
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|hints| !hints.is_empty());

        Self {
            waypoints: waypoints.unwrap_or(fallback.waypoints),
            recommended_path: non_blank(partial.recommended_path)
                .unwrap_or(fallback.recommended_path),
            timing_advice: non_blank(partial.timing_advice).unwrap_or(fallback.timing_advice),
            safety_considerations: non_empty_list(partial.safety_considerations)
                .unwrap_or(fallback.safety_considerations),
            optimization_tips: non_empty_list(partial.optimization_tips)
                .unwrap_or(fallback.optimization_tips),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialRouteAdvice {
    pub waypoints: Option<Vec<WaypointHint>>,
    pub recommended_path: Option<String>,
    pub timing_advice: Option<String>,
    pub safety_considerations: Option<Vec<String>>,
    pub optimization_tips: Option<Vec<String>>,
}

/// Downwind approach point for a target: `radius_deg` away on the bearing
/// opposite the wind, or due south of the target when the wind is unknown.
pub fn downwind_approach(target: &GeoPoint, wind_direction_deg: Option<f64>, radius_deg: f64) -> GeoPoint {
    match wind_direction_deg.filter(|deg| deg.is_finite()) {
        Some(wind) => offset_polar(target, radius_deg, wind + 180.0),
        None => offset(target, -radius_deg, 0.0),
    }
}

fn mustering_hints(herd: &GeoPoint, destination: &GeoPoint) -> Vec<WaypointHint> {
    vec![
        WaypointHint::new(*herd, 25.0, "Start position - approach herd from side"),
        WaypointHint::new(midpoint(herd, destination), 30.0, "Midpoint - guide herd direction"),
        WaypointHint::new(*destination, 25.0, "Destination - final approach"),
    ]
}

fn hunting_hints(target: &GeoPoint, wind_direction_deg: Option<f64>) -> Vec<WaypointHint> {
    let approach = downwind_approach(target, wind_direction_deg, HUNTING_APPROACH_RADIUS_DEG);
    let scout = downwind_approach(target, wind_direction_deg, HUNTING_APPROACH_RADIUS_DEG * 2.0);
    vec![
        WaypointHint::new(scout, HUNTING_SCOUT_ALTITUDE_M, "Scouting pass - high and wide"),
        WaypointHint::new(approach, HUNTING_APPROACH_ALTITUDE_M, "Approach point - downwind side"),
        WaypointHint::new(*target, HUNTING_OBSERVE_ALTITUDE_M, "Target location - maintain safe distance"),
    ]
}

/// Cut a reasoning-service reply down to the JSON object it contains.
///
/// Replies often wrap the document in Markdown fences or a sentence of prose;
/// the outermost `{ ... }` span is taken.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn non_empty_list(value: Option<Vec<String>>) -> Option<Vec<String>> {
    value
        .map(|items| items.into_iter().filter(|s| !s.trim().is_empty()).collect::<Vec<_>>())
        .filter(|items| !items.is_empty())
}
