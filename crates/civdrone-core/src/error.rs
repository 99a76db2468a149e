//! Error types for transport parsing and the advisory path.
//!
//! Advisory errors never escape the public planner, advisor or tracker
//! operations; they are logged and reported through [`crate::advisor::Advised`].

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A transport string that names no known operation or filming kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

/// Failure reported by a reasoning-service implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReasoningError {
    #[error("reasoning service unavailable")]
    ServiceUnavailable,
    #[error("reasoning service timed out after {0:?}")]
    Timeout(Duration),
    #[error("reasoning service transport error: {0}")]
    Transport(String),
    #[error("malformed reasoning response: {0}")]
    MalformedResponse(String),
}

/// Why a deterministic default was served instead of generated advice.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    #[error("no reasoning service configured")]
    ServiceNotConfigured,
    #[error("reasoning service not ready")]
    ServiceUnavailable,
    #[error("reasoning service timed out")]
    Timeout,
    #[error("reasoning service transport error: {0}")]
    Transport(String),
    #[error("unusable reasoning response: {0}")]
    MalformedResponse(String),
}

impl From<ReasoningError> for FallbackReason {
    fn from(err: ReasoningError) -> Self {
        match err {
            ReasoningError::ServiceUnavailable => FallbackReason::ServiceUnavailable,
            ReasoningError::Timeout(_) => FallbackReason::Timeout,
            ReasoningError::Transport(detail) => FallbackReason::Transport(detail),
            ReasoningError::MalformedResponse(detail) => FallbackReason::MalformedResponse(detail),
        }
    }
}
