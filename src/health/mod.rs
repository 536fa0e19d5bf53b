// src/health/mod.rs

//! Readiness checks against the agent's HTTP health endpoint.

pub mod prober;

pub use prober::{HEALTH_PATH, HealthProber};
