//! civdrone CLI - command line tools for the civdrone server.
//!
//! Binaries:
//! - plan_route: request a route and print it
//! - ask_advisor: ask a general question

pub mod client;

pub use client::ServerClient;

use anyhow::{bail, Context, Result};
use civdrone_core::GeoPoint;
use clap::ValueEnum;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RouteKindArg {
    Filming,
    Mustering,
    Hunting,
    General,
}

/// Parse `lat,lon` in decimal degrees.
pub fn parse_point(raw: &str) -> Result<GeoPoint> {
    let Some((lat, lon)) = raw.split_once(',') else {
        bail!("expected lat,lon but got {raw:?}");
    };
    let lat: f64 = lat.trim().parse().context("invalid latitude")?;
    let lon: f64 = lon.trim().parse().context("invalid longitude")?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("coordinates out of range: {lat},{lon}");
    }
    Ok(GeoPoint::new(lat, lon))
}

/// Options collected from the command line for a route request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub kind: RouteKindArg,
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub count: usize,
    pub wind_deg: Option<f64>,
    pub use_advice: bool,
}

impl RouteRequest {
    /// Endpoint path and JSON body for this request.
    pub fn to_body(&self) -> (&'static str, Value) {
        match self.kind {
            RouteKindArg::Filming => (
                "/v1/routes/filming",
                json!({
                    "start": self.from,
                    "subjects": [self.to],
                    "use_advice": self.use_advice,
                }),
            ),
            RouteKindArg::Mustering => (
                "/v1/routes/mustering",
                json!({
                    "herd_location": self.from,
                    "destination": self.to,
                    "use_advice": self.use_advice,
                }),
            ),
            RouteKindArg::Hunting => (
                "/v1/routes/hunting",
                json!({
                    "start": self.from,
                    "target_location": self.to,
                    "wind_direction": self.wind_deg,
                    "use_advice": self.use_advice,
                }),
            ),
            RouteKindArg::General => (
                "/v1/routes/general",
                json!({
                    "start": self.from,
                    "end": self.to,
                    "waypoint_count": self.count,
                }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        let point = parse_point("-33.8688, 151.2093").unwrap();
        assert_eq!(point, GeoPoint::new(-33.8688, 151.2093));
    }

    #[test]
    fn rejects_bad_points() {
        assert!(parse_point("40.0").is_err());
        assert!(parse_point("north,east").is_err());
        assert!(parse_point("91.0,0.0").is_err());
    }

    #[test]
    fn hunting_body_carries_wind() {
        let request = RouteRequest {
            kind: RouteKindArg::Hunting,
            from: GeoPoint::new(45.0, -110.0),
            to: GeoPoint::new(45.01, -110.0),
            count: 5,
            wind_deg: Some(270.0),
            use_advice: false,
        };
        let (path, body) = request.to_body();
        assert_eq!(path, "/v1/routes/hunting");
        assert_eq!(body["wind_direction"], 270.0);
        assert_eq!(body["target_location"]["lat"], 45.01);
        assert_eq!(body["use_advice"], false);
    }

    #[test]
    fn general_body_carries_count() {
        let request = RouteRequest {
            kind: RouteKindArg::General,
            from: GeoPoint::new(0.0, 0.0),
            to: GeoPoint::new(0.1, 0.1),
            count: 8,
            wind_deg: None,
            use_advice: true,
        };
        let (path, body) = request.to_body();
        assert_eq!(path, "/v1/routes/general");
        assert_eq!(body["waypoint_count"], 8);
    }
}
