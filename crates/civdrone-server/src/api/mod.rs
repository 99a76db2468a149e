//! API routes for the civdrone server.

pub mod advice;
pub mod planning;
pub mod request_id;
mod routes;
pub mod tracking;

use axum::Router;
use civdrone_core::GeoPoint;
use std::sync::Arc;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}

/// Substitute `{lat: 0, lon: 0}` for a missing location.
pub(crate) fn location_or_default(field: &'static str, location: Option<GeoPoint>) -> GeoPoint {
    location.unwrap_or_else(|| {
        tracing::debug!(field, "location missing, defaulting to 0,0");
        GeoPoint::default()
    })
}

#[cfg(test)]
mod tests;
