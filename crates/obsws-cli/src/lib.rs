//! obsws-cli library: configuration loading and the commands the `obsws`
//! binary runs.
//!
//! The binary itself (`main.rs`) only parses arguments, sets up logging,
//! connects, and prints what these functions return.

pub mod commands;
pub mod config;

pub use commands::{event_to_json, execute, tail_events, CommandError, Query};
pub use config::{default_config_path, load_config, ConfigError, FileConfig, Overrides};
