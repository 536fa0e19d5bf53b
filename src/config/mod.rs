// src/config/mod.rs

//! Configuration for the supervisor and the bundled agent.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a host config file from disk (`loader.rs`).
//! - Validate and resolve defaults (`validate.rs`).
//! - Write the agent's own config file into the bundle (`writer.rs`).

pub mod loader;
pub mod model;
pub mod validate;
pub mod writer;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, GatewayConfig, RawConfigFile, RawSupervisorSection, RuntimeConfig,
    SupervisorOptions,
};
pub use validate::parse_duration;
pub use writer::{
    AGENT_CONFIG_FILE_NAME, CONFIG_PATH_ENV_VARS, render_agent_config, write_agent_config,
};
