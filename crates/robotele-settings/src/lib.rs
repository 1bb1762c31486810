//! RoboTele Settings Crate
//!
//! Operator configuration and its persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{Config, ConnectionSettings, ControlSettings, PollingSettings, VideoSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use persistence::SettingsStore;
