//! Shared library surface for the civdrone server and its tests.

pub mod api;
pub mod config;
pub mod state;
