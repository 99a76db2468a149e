//! civdrone Claude - reasoning service backed by the Anthropic Messages API.

pub mod client;

pub use client::{ClaudeClient, ClaudeConfig, ClientError};
