//! Route assembly for civilian operations.
//!
//! Each operation has a fixed waypoint skeleton. Filming routes take their
//! altitude, speed and shot plan from [`FilmingAdvice`]; mustering and hunting
//! routes merge [`RouteAdvice`] tips into the finished route.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::advice::{
    downwind_approach, FilmingAdvice, RouteAdvice, HUNTING_APPROACH_ALTITUDE_M,
    HUNTING_APPROACH_RADIUS_DEG, HUNTING_OBSERVE_ALTITUDE_M, HUNTING_SCOUT_ALTITUDE_M,
};
use crate::advisor::{Advised, AdvisoryGenerator, ReasoningService};
use crate::geodesy::{bearing, interpolate, midpoint, offset, offset_polar, route_length};
use crate::history::RingBuffer;
use crate::models::{
    FilmingKind, GeoPoint, Route, RouteKind, RouteSummary, SubjectInfo, TerrainInfo, Waypoint,
    Weather,
};

const FILMING_DEFAULT_ALTITUDE_M: f64 = 30.0;
const FILMING_START_DURATION_S: f64 = 5.0;
const FILMING_APPROACH_DURATION_S: f64 = 3.0;
const FILMING_ORBIT_DURATION_S: f64 = 8.0;
/// Hold time assumed for a waypoint without an explicit duration.
const DEFAULT_HOLD_S: f64 = 10.0;
/// ~11 m at the equator
const APPROACH_OFFSET_DEG: f64 = 0.0001;
/// ~22 m at the equator
const MUSTERING_ARC_OFFSET_DEG: f64 = 0.0002;
const MUSTERING_WORK_ALTITUDE_M: f64 = 25.0;
const MUSTERING_GUIDE_ALTITUDE_M: f64 = 30.0;
/// Average ground speed used to estimate mustering and hunting durations.
const FIELD_AVERAGE_SPEED_MPS: f64 = 3.0;
const LARGE_HERD: u32 = 100;

/// Planner limits and speeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Legal ceiling for any planned waypoint
    pub max_altitude_m: f64,
    pub min_altitude_m: f64,
    pub cruise_speed_mps: f64,
    /// Slower speed for smooth footage
    pub filming_speed_mps: f64,
    /// Arrival speed for general routes; half the cruise speed when unset
    pub approach_speed_mps: Option<f64>,
    pub general_altitude_m: f64,
    /// Upper bound on `waypoint_count` for general routes
    pub max_waypoints: usize,
    pub history_capacity: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_altitude_m: 120.0,
            min_altitude_m: 5.0,
            cruise_speed_mps: 5.0,
            filming_speed_mps: 2.0,
            approach_speed_mps: None,
            general_altitude_m: 50.0,
            max_waypoints: 500,
            history_capacity: 256,
        }
    }
}

impl PlannerConfig {
    pub fn approach_speed(&self) -> f64 {
        self.approach_speed_mps
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .unwrap_or(self.cruise_speed_mps / 2.0)
    }

    fn clamp_altitude(&self, altitude_m: f64) -> f64 {
        if !altitude_m.is_finite() {
            return self.min_altitude_m;
        }
        altitude_m.clamp(self.min_altitude_m, self.max_altitude_m.max(self.min_altitude_m))
    }
}

/// Plans routes and keeps a bounded history of everything it produced.
pub struct RoutePlanner {
    config: PlannerConfig,
    history: RingBuffer<Route>,
    sequence: u64,
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        tracing::info!(
            max_altitude_m = config.max_altitude_m,
            cruise_speed_mps = config.cruise_speed_mps,
            history_capacity = config.history_capacity,
            "route planner initialized"
        );
        let history = RingBuffer::new(config.history_capacity);
        Self {
            config,
            history,
            sequence: 0,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan a filming route visiting each subject in order.
    pub fn plan_filming_route(
        &mut self,
        start: &GeoPoint,
        subjects: &[GeoPoint],
        kind: FilmingKind,
        advice: Option<&FilmingAdvice>,
    ) -> Route {
        let altitude = advice
            .map(|a| self.config.clamp_altitude(a.recommended_altitude_m))
            .unwrap_or(FILMING_DEFAULT_ALTITUDE_M);
        let speed = advice
            .map(|a| a.recommended_speed_mps)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.config.filming_speed_mps);
        let advised = |label: &str| advice.map(|_| label.to_string());

        let mut waypoints = vec![Waypoint::at(
            *start,
            altitude,
            speed,
            "Starting position - prepare for filming",
        )
        .with_shot(
            advised("establishing"),
            advised("overhead"),
            FILMING_START_DURATION_S,
        )];

        let with_orbit = subjects.len() > 1 || kind == FilmingKind::Advertisement;
        for (i, subject) in subjects.iter().enumerate() {
            let n = i + 1;
            waypoints.push(
                Waypoint::at(
                    offset(subject, -APPROACH_OFFSET_DEG, 0.0),
                    altitude,
                    speed,
                    format!("Approach subject {n}"),
                )
                .with_shot(advised("approach"), advised("side"), FILMING_APPROACH_DURATION_S),
            );

            let shot = advice.and_then(|a| cycled(&a.shot_sequence, i));
            let shot_type = shot
                .map(|s| s.shot_type.clone())
                .unwrap_or_else(|| "following".to_string());
            let duration = shot
                .map(|s| s.duration_s)
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(DEFAULT_HOLD_S);
            let angle = advice
                .and_then(|a| cycled(&a.camera_angles, i).cloned())
                .unwrap_or_else(|| "overhead".to_string());
            waypoints.push(
                Waypoint::at(*subject, altitude, speed, format!("Film subject {n}"))
                    .with_shot(Some(shot_type), Some(angle), duration),
            );

            if with_orbit {
                waypoints.push(
                    Waypoint::at(
                        offset(subject, APPROACH_OFFSET_DEG, APPROACH_OFFSET_DEG),
                        altitude,
                        speed,
                        format!("Orbit around subject {n}"),
                    )
                    .with_shot(advised("orbit"), advised("orbit"), FILMING_ORBIT_DURATION_S),
                );
            }
        }
        assign_arrival_headings(&mut waypoints);

        let estimated_duration_s = waypoints
            .iter()
            .map(|wp| wp.duration_s.unwrap_or(DEFAULT_HOLD_S))
            .sum();
        let (optimization_tips, weather_considerations) = match advice {
            Some(a) => (a.framing_tips.clone(), a.weather_considerations.clone()),
            None => (
                strings(&[
                    "Maintain smooth camera movements",
                    "Keep subjects in frame",
                    "Use rule of thirds for composition",
                ]),
                "Check weather conditions".to_string(),
            ),
        };

        self.record(
            RouteKind::Filming,
            waypoints,
            estimated_duration_s,
            optimization_tips,
            weather_considerations,
            strings(&["Ensure clear line of sight", "Avoid obstacles"]),
        )
    }

    /// Plan a mustering sweep that gathers the herd and walks it to `destination`.
    pub fn plan_mustering_route(
        &mut self,
        herd: &GeoPoint,
        destination: &GeoPoint,
        herd_size: Option<u32>,
        terrain: Option<&TerrainInfo>,
    ) -> Route {
        let (waypoints, tips, weather, notes) =
            mustering_skeleton(herd, destination, herd_size, terrain);
        let duration = route_length(&waypoints) / FIELD_AVERAGE_SPEED_MPS;
        self.record(RouteKind::Mustering, waypoints, duration, tips, weather, notes)
    }

    /// Mustering route with advice tips and timing merged in.
    pub fn plan_mustering_route_with_advice(
        &mut self,
        herd: &GeoPoint,
        destination: &GeoPoint,
        herd_size: Option<u32>,
        terrain: Option<&TerrainInfo>,
        advice: &RouteAdvice,
    ) -> Route {
        let (waypoints, mut tips, _, notes) =
            mustering_skeleton(herd, destination, herd_size, terrain);
        merge_tips(&mut tips, &advice.optimization_tips);
        let duration = route_length(&waypoints) / FIELD_AVERAGE_SPEED_MPS;
        self.record(
            RouteKind::Mustering,
            waypoints,
            duration,
            tips,
            advice.timing_advice.clone(),
            notes,
        )
    }

    /// Plan a scouting, downwind approach and observation route.
    pub fn plan_hunting_route(
        &mut self,
        start: &GeoPoint,
        target: &GeoPoint,
        animal_type: &str,
        terrain: Option<&TerrainInfo>,
        wind_direction_deg: Option<f64>,
    ) -> Route {
        let (waypoints, tips, weather, notes) =
            hunting_skeleton(start, target, animal_type, terrain, wind_direction_deg);
        let duration = route_length(&waypoints) / FIELD_AVERAGE_SPEED_MPS;
        self.record(RouteKind::Hunting, waypoints, duration, tips, weather, notes)
    }

    /// Hunting route with advice tips and timing merged in.
    pub fn plan_hunting_route_with_advice(
        &mut self,
        start: &GeoPoint,
        target: &GeoPoint,
        animal_type: &str,
        terrain: Option<&TerrainInfo>,
        wind_direction_deg: Option<f64>,
        advice: &RouteAdvice,
    ) -> Route {
        let (waypoints, mut tips, _, notes) =
            hunting_skeleton(start, target, animal_type, terrain, wind_direction_deg);
        merge_tips(&mut tips, &advice.optimization_tips);
        let duration = route_length(&waypoints) / FIELD_AVERAGE_SPEED_MPS;
        self.record(
            RouteKind::Hunting,
            waypoints,
            duration,
            tips,
            advice.timing_advice.clone(),
            notes,
        )
    }

    /// Straight-line route with `waypoint_count - 1` evenly spaced intermediate points.
    pub fn plan_general_route(
        &mut self,
        start: &GeoPoint,
        end: &GeoPoint,
        waypoint_count: usize,
    ) -> Route {
        let max_waypoints = self.config.max_waypoints.max(1);
        let waypoint_count = if waypoint_count > max_waypoints {
            tracing::debug!(
                requested = waypoint_count,
                substituted = max_waypoints,
                "waypoint count above limit, clamping"
            );
            max_waypoints
        } else {
            waypoint_count
        };
        let altitude = self.config.clamp_altitude(self.config.general_altitude_m);
        let cruise = self.config.cruise_speed_mps;

        let mut waypoints = vec![Waypoint::at(*start, altitude, cruise, "Starting position")];
        for i in 1..waypoint_count {
            let t = i as f64 / waypoint_count as f64;
            waypoints.push(Waypoint::at(
                interpolate(start, end, t),
                altitude,
                cruise,
                format!("Waypoint {i}"),
            ));
        }
        waypoints.push(Waypoint::at(
            *end,
            altitude,
            self.config.approach_speed(),
            "Destination",
        ));
        assign_arrival_headings(&mut waypoints);

        let distance = route_length(&waypoints);
        let duration = if cruise > 0.0 { distance / cruise } else { 0.0 };
        self.record(
            RouteKind::General,
            waypoints,
            duration,
            strings(&[
                "Maintain safe altitude",
                "Follow local regulations",
                "Monitor weather conditions",
            ]),
            "Check weather before flight".to_string(),
            strings(&["Ensure clear line of sight"]),
        )
    }

    /// Request filming advice, then plan with it.
    pub async fn plan_advised_filming_route<S: ReasoningService>(
        &mut self,
        advisor: &AdvisoryGenerator<S>,
        start: &GeoPoint,
        subjects: &[GeoPoint],
        kind: FilmingKind,
        subject_info: Option<&SubjectInfo>,
        weather: Option<&Weather>,
    ) -> Advised<Route> {
        let advice = advisor
            .request_filming_advice(kind.operation_type(), start, subject_info, weather)
            .await;
        advice.map(|a| self.plan_filming_route(start, subjects, kind, Some(&a)))
    }

    pub async fn plan_advised_mustering_route<S: ReasoningService>(
        &mut self,
        advisor: &AdvisoryGenerator<S>,
        herd: &GeoPoint,
        destination: &GeoPoint,
        herd_size: Option<u32>,
        terrain: Option<&TerrainInfo>,
    ) -> Advised<Route> {
        let advice = advisor
            .request_mustering_advice(herd, destination, herd_size, terrain)
            .await;
        advice.map(|a| {
            self.plan_mustering_route_with_advice(herd, destination, herd_size, terrain, &a)
        })
    }

    pub async fn plan_advised_hunting_route<S: ReasoningService>(
        &mut self,
        advisor: &AdvisoryGenerator<S>,
        start: &GeoPoint,
        target: &GeoPoint,
        animal_type: &str,
        terrain: Option<&TerrainInfo>,
        weather: Option<&Weather>,
    ) -> Advised<Route> {
        let wind = weather.and_then(|w| w.wind_direction_deg);
        let advice = advisor
            .request_hunting_advice(target, animal_type, terrain, weather)
            .await;
        advice.map(|a| {
            self.plan_hunting_route_with_advice(start, target, animal_type, terrain, wind, &a)
        })
    }

    /// Summaries of retained routes, oldest first.
    pub fn route_history(&self) -> Vec<RouteSummary> {
        self.history.iter().map(Route::summary).collect()
    }

    pub fn recent_routes(&self, count: usize) -> Vec<Route> {
        self.history.recent(count)
    }

    pub fn get_route(&self, route_id: &str) -> Option<&Route> {
        self.history.iter().rev().find(|route| route.route_id == route_id)
    }

    fn record(
        &mut self,
        kind: RouteKind,
        waypoints: Vec<Waypoint>,
        estimated_duration_s: f64,
        optimization_tips: Vec<String>,
        weather_considerations: String,
        terrain_notes: Vec<String>,
    ) -> Route {
        self.sequence += 1;
        let created_at = Utc::now();
        let total_distance_m = route_length(&waypoints);
        let route = Route {
            route_id: format!("{}_{}_{}", kind, created_at.timestamp_millis(), self.sequence),
            kind,
            waypoints,
            total_distance_m,
            estimated_duration_s: if estimated_duration_s.is_finite() {
                estimated_duration_s.max(0.0)
            } else {
                0.0
            },
            safety_score: kind.safety_score(),
            optimization_tips,
            weather_considerations,
            terrain_notes,
            created_at,
        };

        tracing::info!(
            route_id = %route.route_id,
            waypoints = route.waypoints.len(),
            total_distance_m = route.total_distance_m,
            "{} route planned",
            kind
        );
        self.history.push(route.clone());
        route
    }
}

type Skeleton = (Vec<Waypoint>, Vec<String>, String, Vec<String>);

fn mustering_skeleton(
    herd: &GeoPoint,
    destination: &GeoPoint,
    herd_size: Option<u32>,
    terrain: Option<&TerrainInfo>,
) -> Skeleton {
    let drive = bearing(herd, destination);
    let mid = midpoint(herd, destination);

    let mut waypoints = vec![
        Waypoint::at(
            offset(herd, -MUSTERING_ARC_OFFSET_DEG, -MUSTERING_ARC_OFFSET_DEG),
            MUSTERING_WORK_ALTITUDE_M,
            3.0,
            "Approach herd from side - begin gathering",
        ),
        Waypoint::at(
            offset_polar(herd, MUSTERING_ARC_OFFSET_DEG, drive + 180.0),
            MUSTERING_WORK_ALTITUDE_M,
            2.5,
            "Flank sweep behind the herd",
        ),
        Waypoint::at(
            *herd,
            MUSTERING_WORK_ALTITUDE_M,
            2.0,
            "Herd location - maintain safe distance",
        ),
        Waypoint::at(mid, MUSTERING_GUIDE_ALTITUDE_M, 3.0, "Midpoint - guide herd direction"),
        Waypoint::at(
            offset(destination, -APPROACH_OFFSET_DEG, 0.0),
            MUSTERING_WORK_ALTITUDE_M,
            2.0,
            "Approach destination - final guidance",
        ),
        Waypoint::at(
            *destination,
            MUSTERING_WORK_ALTITUDE_M,
            1.0,
            "Destination - herd arrival point",
        ),
    ];
    for wp in waypoints.iter_mut().take(4) {
        wp.heading_deg = drive;
    }
    waypoints[4].heading_deg = bearing(&mid, destination);
    waypoints[5].heading_deg = bearing(&waypoints[4].position(), destination);

    let mut tips = strings(&[
        "Use wide arcs to avoid stressing animals",
        "Maintain consistent altitude (20-30m)",
        "Work with ground crew if available",
        "Monitor animal behavior and adjust approach",
    ]);
    if herd_size.is_some_and(|size| size >= LARGE_HERD) {
        tips.push("Large herd - split into groups or work the flanks in several passes".to_string());
    }

    let mut notes = strings(&[
        "Avoid obstacles (fences, water, steep slopes)",
        "Use natural terrain features to guide movement",
        "Plan route to minimize animal stress",
    ]);
    if let Some(terrain) = terrain {
        notes.extend(terrain.hazards.iter().map(|hazard| format!("Hazard: {hazard}")));
    }

    (
        waypoints,
        tips,
        "Early morning or late afternoon when animals are most active. Avoid extreme heat."
            .to_string(),
        notes,
    )
}

fn hunting_skeleton(
    start: &GeoPoint,
    target: &GeoPoint,
    animal_type: &str,
    terrain: Option<&TerrainInfo>,
    wind_direction_deg: Option<f64>,
) -> Skeleton {
    let approach = downwind_approach(target, wind_direction_deg, HUNTING_APPROACH_RADIUS_DEG);
    let mut waypoints = vec![
        Waypoint::at(
            *start,
            HUNTING_SCOUT_ALTITUDE_M,
            4.0,
            "Starting position - begin scouting",
        ),
        Waypoint::at(
            approach,
            HUNTING_APPROACH_ALTITUDE_M,
            3.0,
            "Approach point - downwind side for stealth",
        ),
        Waypoint::at(
            *target,
            HUNTING_OBSERVE_ALTITUDE_M,
            1.0,
            format!("Target location - observe {animal_type}"),
        ),
    ];
    waypoints[0].heading_deg = bearing(start, &approach);
    waypoints[1].heading_deg = bearing(start, target);
    waypoints[2].heading_deg = bearing(&approach, target);

    let mut notes = strings(&[
        "Use terrain features (ridges, valleys) for cover",
        "Avoid open areas when possible",
        "Plan approach to minimize noise and visual disturbance",
    ]);
    if let Some(terrain) = terrain {
        notes.extend(terrain.hazards.iter().map(|hazard| format!("Hazard: {hazard}")));
    }

    (
        waypoints,
        strings(&[
            "Approach from downwind to avoid detection",
            "Use terrain for cover when possible",
            "Maintain legal altitude limits",
            "Plan escape routes",
            "Monitor wind direction and adjust approach",
        ]),
        "Early morning or late afternoon when animals are most active. \
         Consider wind direction for approach."
            .to_string(),
        notes,
    )
}

/// Point every waypoint along the leg that reaches it; the first one faces the second.
fn assign_arrival_headings(waypoints: &mut [Waypoint]) {
    for i in (1..waypoints.len()).rev() {
        waypoints[i].heading_deg =
            bearing(&waypoints[i - 1].position(), &waypoints[i].position());
    }
    if waypoints.len() > 1 {
        waypoints[0].heading_deg = waypoints[1].heading_deg;
    }
}

fn cycled<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        items.get(index % items.len())
    }
}

fn merge_tips(tips: &mut Vec<String>, extra: &[String]) {
    for tip in extra {
        if !tips.contains(tip) {
            tips.push(tip.clone());
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
