//! Operator configuration
//!
//! Configuration outlives connections and process restarts. It is organized
//! into sections:
//! - Connection (robot address and ports)
//! - Control (mode and joypad scaling)
//! - Polling (timer periods and the handshake settle delay)
//! - Video (webcam client)
//!
//! Every section defaults field by field, so a partial file loads cleanly.

use crate::error::{ConfigError, ConfigResult, SettingsResult};
use robotele_communication::{ControllerEndpoint, VideoEndpoint};
use robotele_core::drive::{ControlMode, DriveLimits};
use robotele_core::units::AngleUnit;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Robot address and ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Robot IP address or hostname
    pub robot_ip: String,
    /// TCP command port
    pub tcp_port: u16,
    /// UDP control port
    pub udp_control_port: u16,
    /// UDP status port the robot sends on (also used for discovery)
    pub udp_status_port_send: u16,
    /// UDP status port the operator listens on
    pub udp_status_port_listen: u16,
    /// How long discovery waits for a reply, in milliseconds
    pub discovery_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            robot_ip: "127.0.0.1".to_string(),
            tcp_port: 14500,
            udp_control_port: 14560,
            udp_status_port_send: 14550,
            udp_status_port_listen: 14555,
            discovery_timeout_ms: 2000,
        }
    }
}

/// Motor control preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Closed-loop speed control instead of raw PWM
    pub pid_enabled: bool,
    /// Wheel speed at full joypad deflection, in m/s
    pub max_motor_speed: f64,
    /// Maximum absolute joypad axis value
    pub joypad_axis_scale: f64,
    /// Unit for rotational speed display
    pub angle_unit: AngleUnit,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            pid_enabled: false,
            max_motor_speed: 2.0,
            joypad_axis_scale: 100.0,
            angle_unit: AngleUnit::Degrees,
        }
    }
}

/// Timer periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Motor command period
    pub command_period_ms: u64,
    /// Frame and speed-query period
    pub fast_update_period_ms: u64,
    /// Battery query period
    pub status_period_ms: u64,
    /// Pause between handshake steps
    pub settle_delay_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            command_period_ms: 30,
            fast_update_period_ms: 50,
            status_period_ms: 500,
            settle_delay_ms: 250,
        }
    }
}

/// Webcam client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Open the webcam on connect
    pub enabled: bool,
    /// Webcam command port
    pub command_port: u16,
    /// Webcam stream port
    pub stream_port: u16,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command_port: 55554,
            stream_port: 55555,
        }
    }
}

/// Complete operator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Control preferences
    pub control: ControlSettings,
    /// Timer periods
    pub polling: PollingSettings,
    /// Webcam settings
    pub video: VideoSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn for_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config text in the format implied by `path`
    pub fn parse(path: &Path, content: &str) -> SettingsResult<Self> {
        let config: Self = match Format::for_path(path)? {
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => toml::from_str(content)?,
        };
        Ok(config)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(path, &content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::for_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.robot_ip.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }

        if self.connection.discovery_timeout_ms == 0 {
            return Err(ConfigError::out_of_range(
                "connection.discovery_timeout_ms",
                0,
            ));
        }

        let control = &self.control;
        if !(control.max_motor_speed.is_finite() && control.max_motor_speed > 0.0) {
            return Err(ConfigError::out_of_range(
                "control.max_motor_speed",
                control.max_motor_speed,
            ));
        }
        if !(control.joypad_axis_scale.is_finite() && control.joypad_axis_scale > 0.0) {
            return Err(ConfigError::out_of_range(
                "control.joypad_axis_scale",
                control.joypad_axis_scale,
            ));
        }

        // Zero-length intervals would spin the poll loop.
        let polling = &self.polling;
        for (key, value) in [
            ("polling.command_period_ms", polling.command_period_ms),
            ("polling.fast_update_period_ms", polling.fast_update_period_ms),
            ("polling.status_period_ms", polling.status_period_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::out_of_range(key, value));
            }
        }

        Ok(())
    }

    /// Motor control mode selected by `pid_enabled`
    pub fn control_mode(&self) -> ControlMode {
        ControlMode::from_pid_enabled(self.control.pid_enabled)
    }

    /// Joypad scaling
    pub fn drive_limits(&self) -> DriveLimits {
        DriveLimits {
            axis_scale: self.control.joypad_axis_scale,
            max_speed: self.control.max_motor_speed,
        }
    }

    /// Controller endpoint for the configured robot
    pub fn controller_endpoint(&self) -> ControllerEndpoint {
        let c = &self.connection;
        ControllerEndpoint {
            ip: c.robot_ip.clone(),
            tcp_port: c.tcp_port,
            udp_control_port: c.udp_control_port,
            udp_status_port_send: c.udp_status_port_send,
            udp_status_port_listen: c.udp_status_port_listen,
        }
    }

    /// Webcam endpoint on the configured robot
    pub fn video_endpoint(&self) -> VideoEndpoint {
        VideoEndpoint {
            ip: self.connection.robot_ip.clone(),
            command_port: self.video.command_port,
            stream_port: self.video.stream_port,
        }
    }

    /// How long discovery waits
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.connection.discovery_timeout_ms)
    }
}

impl PollingSettings {
    /// Motor command period
    pub fn command_period(&self) -> Duration {
        Duration::from_millis(self.command_period_ms)
    }

    /// Frame and speed-query period
    pub fn fast_update_period(&self) -> Duration {
        Duration::from_millis(self.fast_update_period_ms)
    }

    /// Battery query period
    pub fn status_period(&self) -> Duration {
        Duration::from_millis(self.status_period_ms)
    }

    /// Pause between handshake steps
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.control_mode(), ControlMode::RawPwm);
        assert_eq!(config.polling.command_period(), Duration::from_millis(30));
        assert_eq!(config.polling.settle_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            [connection]
            robot_ip = "10.0.0.7"

            [control]
            pid_enabled = true
        "#;
        let config = Config::parse(&PathBuf::from("settings.toml"), text).unwrap();
        assert_eq!(config.connection.robot_ip, "10.0.0.7");
        assert_eq!(config.connection.tcp_port, 14500);
        assert!(config.control.pid_enabled);
        assert_eq!(config.control.max_motor_speed, 2.0);
        assert_eq!(config.polling, PollingSettings::default());
    }

    #[test]
    fn test_angle_unit_is_lowercase_in_files() {
        let text = r#"{ "control": { "angle_unit": "radians" } }"#;
        let config = Config::parse(&PathBuf::from("settings.json"), text).unwrap();
        assert_eq!(config.control.angle_unit, AngleUnit::Radians);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::parse(&PathBuf::from("settings.yaml"), "").unwrap_err();
        assert!(err.to_string().contains("yaml"));
    }

    #[test]
    fn test_validation_rejects_zero_period() {
        let mut config = Config::new();
        config.polling.fast_update_period_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::out_of_range("polling.fast_update_period_ms", 0))
        );
    }

    #[test]
    fn test_validation_rejects_empty_ip() {
        let mut config = Config::new();
        config.connection.robot_ip = " ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyAddress));
    }

    #[test]
    fn test_endpoints_follow_connection() {
        let mut config = Config::new();
        config.connection.robot_ip = "192.168.1.50".to_string();

        let controller = config.controller_endpoint();
        assert_eq!(controller.ip, "192.168.1.50");
        assert_eq!(controller.udp_status_port_listen, 14555);

        let video = config.video_endpoint();
        assert_eq!(video.ip, "192.168.1.50");
        assert_eq!(video.stream_port, 55555);
    }
}
