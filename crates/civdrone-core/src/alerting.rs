//! Threshold alerts on operational metrics.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
            AlertSeverity::Emergency => "emergency",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

/// Thresholds for one metric. A value strictly above a threshold crosses it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub warning: f64,
    pub critical: f64,
    #[serde(default)]
    pub emergency: Option<f64>,
}

impl AlertThresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            emergency: None,
        }
    }

    /// Highest severity crossed by `value` and the threshold it crossed.
    fn crossed(&self, value: f64) -> Option<(AlertSeverity, f64)> {
        if let Some(emergency) = self.emergency {
            if value > emergency {
                return Some((AlertSeverity::Emergency, emergency));
            }
        }
        if value > self.critical {
            Some((AlertSeverity::Critical, self.critical))
        } else if value > self.warning {
            Some((AlertSeverity::Warning, self.warning))
        } else {
            None
        }
    }
}

/// Tracks one alert per metric and escalates or resolves it as values change.
#[derive(Debug, Default)]
pub struct AlertManager {
    thresholds: HashMap<String, AlertThresholds>,
    alerts: HashMap<String, Alert>,
    raised: u64,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_threshold(&mut self, metric: impl Into<String>, thresholds: AlertThresholds) {
        let metric = metric.into();
        tracing::info!(
            metric = %metric,
            warning = thresholds.warning,
            critical = thresholds.critical,
            emergency = ?thresholds.emergency,
            "alert threshold set"
        );
        self.thresholds.insert(metric, thresholds);
    }

    pub fn thresholds(&self, metric: &str) -> Option<&AlertThresholds> {
        self.thresholds.get(metric)
    }

    /// Check `value` against the metric's thresholds.
    ///
    /// Returns the active alert when a threshold is crossed. An unresolved
    /// alert for the same metric is updated in place; a value back under every
    /// threshold resolves it and returns `None`.
    pub fn evaluate(&mut self, metric: &str, value: f64) -> Option<Alert> {
        let Some(thresholds) = self.thresholds.get(metric) else {
            tracing::debug!(metric, "no thresholds configured for metric");
            return None;
        };
        if !value.is_finite() {
            return None;
        }

        let Some((severity, threshold)) = thresholds.crossed(value) else {
            self.resolve(metric);
            return None;
        };

        let now = Utc::now();
        let message = format!("{metric} is {value:.1}, above the {severity} threshold of {threshold:.1}");
        let escalated = match self.alerts.get_mut(metric) {
            Some(alert) if !alert.resolved => {
                let escalated = alert.severity != severity;
                alert.severity = severity;
                alert.message = message;
                alert.value = value;
                alert.threshold = threshold;
                alert.timestamp = now;
                escalated
            }
            _ => {
                self.raised += 1;
                self.alerts.insert(
                    metric.to_string(),
                    Alert {
                        id: format!("{metric}_{}", self.raised),
                        severity,
                        message,
                        metric: metric.to_string(),
                        value,
                        threshold,
                        timestamp: now,
                        resolved: false,
                    },
                );
                true
            }
        };

        let alert = self.alerts.get(metric).cloned()?;
        if escalated {
            match severity {
                AlertSeverity::Info => tracing::info!(alert_id = %alert.id, "{}", alert.message),
                AlertSeverity::Warning => tracing::warn!(alert_id = %alert.id, "{}", alert.message),
                AlertSeverity::Critical | AlertSeverity::Emergency => {
                    tracing::error!(alert_id = %alert.id, severity = %severity, "{}", alert.message)
                }
            }
        }
        Some(alert)
    }

    /// Mark the metric's alert resolved. Returns false when nothing was active.
    pub fn resolve(&mut self, metric: &str) -> bool {
        match self.alerts.get_mut(metric) {
            Some(alert) if !alert.resolved => {
                alert.resolved = true;
                alert.timestamp = Utc::now();
                tracing::info!(alert_id = %alert.id, metric, "alert resolved");
                true
            }
            _ => false,
        }
    }

    /// Unresolved alerts, most severe first.
    pub fn active_alerts(&self) -> Vec<Alert> {
        let mut active: Vec<Alert> = self
            .alerts
            .values()
            .filter(|alert| !alert.resolved)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.metric.cmp(&b.metric)));
        active
    }

    pub fn alerts_by_severity(&self, severity: AlertSeverity) -> Vec<Alert> {
        self.active_alerts()
            .into_iter()
            .filter(|alert| alert.severity == severity)
            .collect()
    }
}
