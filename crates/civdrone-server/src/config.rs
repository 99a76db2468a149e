//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use civdrone_claude::ClaudeConfig;
use civdrone_core::{PlannerConfig, TrackerConfig};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub claude: ClaudeConfig,
    pub advisor_timeout: Duration,
    pub planner: PlannerConfig,
    pub tracker: TrackerConfig,
    /// Open tracking sessions kept before the least recently used is closed
    pub max_sessions: usize,
    /// Advisory fallback rate (percent) that raises a warning alert
    pub fallback_warn_pct: f64,
    pub fallback_crit_pct: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            claude: ClaudeConfig::default(),
            advisor_timeout: Duration::from_secs(30),
            planner: PlannerConfig::default(),
            tracker: TrackerConfig::default(),
            max_sessions: 64,
            fallback_warn_pct: 25.0,
            fallback_crit_pct: 75.0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let advisor_timeout =
            parse_secs(&get, "CIVDRONE_ADVISOR_TIMEOUT_S", defaults.advisor_timeout)?;
        let claude = ClaudeConfig {
            request_timeout: advisor_timeout,
            ..ClaudeConfig::from_lookup(&get)
        };

        let planner = PlannerConfig {
            cruise_speed_mps: parse_or(
                &get,
                "CIVDRONE_CRUISE_SPEED_MPS",
                defaults.planner.cruise_speed_mps,
            )?,
            approach_speed_mps: parse_opt(&get, "CIVDRONE_APPROACH_SPEED_MPS")?,
            max_waypoints: parse_or(
                &get,
                "CIVDRONE_MAX_WAYPOINTS",
                defaults.planner.max_waypoints,
            )?,
            history_capacity: parse_or(
                &get,
                "CIVDRONE_ROUTE_HISTORY",
                defaults.planner.history_capacity,
            )?,
            ..defaults.planner
        };

        let tracker = TrackerConfig {
            lost_timeout: parse_secs(&get, "CIVDRONE_LOST_TIMEOUT_S", defaults.tracker.lost_timeout)?,
            framing_threshold: parse_or(
                &get,
                "CIVDRONE_FRAMING_THRESHOLD",
                defaults.tracker.framing_threshold,
            )?,
            ..defaults.tracker
        };

        Ok(Self {
            server_port: parse_or(&get, "CIVDRONE_PORT", defaults.server_port)?,
            claude,
            advisor_timeout,
            planner,
            tracker,
            max_sessions: parse_or(&get, "CIVDRONE_MAX_SESSIONS", defaults.max_sessions)?,
            fallback_warn_pct: parse_or(
                &get,
                "CIVDRONE_FALLBACK_WARN_PCT",
                defaults.fallback_warn_pct,
            )?,
            fallback_crit_pct: parse_or(
                &get,
                "CIVDRONE_FALLBACK_CRIT_PCT",
                defaults.fallback_crit_pct,
            )?,
        })
    }
}

fn parse_opt<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

/// Seconds as a float; negative or non-finite values are rejected.
fn parse_secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or(ConfigError::InvalidValue { key, value }),
    }
}
