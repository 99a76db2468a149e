//! In-memory application state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use civdrone_claude::{ClaudeClient, ClientError};
use civdrone_core::{
    Alert, AlertManager, AlertThresholds, AdvisorConfig, AdvisorStats, AdvisoryGenerator,
    RoutePlanner, SubjectTracker, TrackerConfig,
};
use dashmap::DashMap;

use crate::config::Config;

/// Metric name for the share of advice answered from defaults.
pub const FALLBACK_RATE_METRIC: &str = "advisory_fallback_rate_pct";

pub type Advisor = AdvisoryGenerator<ClaudeClient>;
pub type Tracker = SubjectTracker<ClaudeClient>;
pub type SharedTracker = Arc<tokio::sync::Mutex<Tracker>>;

struct Session {
    tracker: SharedTracker,
    last_used: u64,
}

/// Application state shared by all handlers.
pub struct AppState {
    advisor: Arc<Advisor>,
    planner: Mutex<RoutePlanner>,
    sessions: DashMap<String, Session>,
    /// Logical clock for least-recently-used session eviction
    session_clock: AtomicU64,
    max_sessions: usize,
    alerts: Mutex<AlertManager>,
    tracker_config: TrackerConfig,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let service = match config.claude.api_key {
            Some(_) => Some(ClaudeClient::new(config.claude.clone())?),
            None => {
                tracing::warn!("ANTHROPIC_API_KEY not set, serving default advice only");
                None
            }
        };
        let advisor = AdvisoryGenerator::new(
            service,
            AdvisorConfig {
                timeout: config.advisor_timeout,
            },
        );

        let mut alerts = AlertManager::new();
        alerts.set_threshold(
            FALLBACK_RATE_METRIC,
            AlertThresholds::new(config.fallback_warn_pct, config.fallback_crit_pct),
        );

        Ok(Self {
            advisor: Arc::new(advisor),
            planner: Mutex::new(RoutePlanner::new(config.planner.clone())),
            sessions: DashMap::new(),
            session_clock: AtomicU64::new(0),
            max_sessions: config.max_sessions.max(1),
            alerts: Mutex::new(alerts),
            tracker_config: config.tracker.clone(),
        })
    }

    pub fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    pub fn advisor_stats(&self) -> AdvisorStats {
        self.advisor.stats()
    }

    /// Run `f` with the planner locked. Never hold the guard across `.await`.
    pub fn with_planner<R>(&self, f: impl FnOnce(&mut RoutePlanner) -> R) -> R {
        let mut planner = lock(&self.planner);
        f(&mut planner)
    }

    /// Tracker for a camera session, created on first use. Opening a session
    /// beyond `max_sessions` closes the least recently used one.
    pub fn tracker(&self, session_id: &str) -> SharedTracker {
        let now = self.tick();
        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.last_used = now;
            return session.tracker.clone();
        }

        while self.sessions.len() >= self.max_sessions {
            let Some(oldest) = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| entry.key().clone())
            else {
                break;
            };
            self.sessions.remove(&oldest);
            tracing::info!(session_id = %oldest, "idle tracking session evicted");
        }

        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id, "tracking session opened");
                Session {
                    tracker: Arc::new(tokio::sync::Mutex::new(SubjectTracker::new(
                        self.tracker_config.clone(),
                        Some(self.advisor.clone()),
                    ))),
                    last_used: now,
                }
            })
            .tracker
            .clone()
    }

    pub fn existing_tracker(&self, session_id: &str) -> Option<SharedTracker> {
        let now = self.tick();
        self.sessions.get_mut(session_id).map(|mut session| {
            session.last_used = now;
            session.tracker.clone()
        })
    }

    /// Close a session, returning its tracker if it was open.
    pub fn close_session(&self, session_id: &str) -> Option<SharedTracker> {
        let (_, session) = self.sessions.remove(session_id)?;
        tracing::info!(session_id, "tracking session closed");
        Some(session.tracker)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn tick(&self) -> u64 {
        self.session_clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Re-evaluate the fallback-rate alert after an advice request.
    ///
    /// Only meaningful when a reasoning service is configured; without one every
    /// answer is a default by construction.
    pub fn observe_advisor(&self) {
        let stats = self.advisor.stats();
        if !stats.ai_enabled {
            return;
        }
        lock(&self.alerts).evaluate(FALLBACK_RATE_METRIC, stats.fallback_rate_pct());
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        lock(&self.alerts).active_alerts()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
