//! Event type definitions for the event bus.
//!
//! This module defines all application events organized by category.
//! Events are designed to be cloneable and serializable for logging/replay.

use serde::{Deserialize, Serialize};

use crate::display::{ChargeColor, IndicatorColor, Readout};
use crate::drive::ControlMode;
use crate::robot::BoardStatus;

/// Root event enum for all application events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Robot connection events
    Connection(ConnectionEvent),
    /// Operator panel updates
    Dashboard(DashboardEvent),
    /// Messages the operator must acknowledge
    Notification(Notification),
    /// Settings and configuration
    Settings(SettingsEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Connection(_) => EventCategory::Connection,
            AppEvent::Dashboard(_) => EventCategory::Dashboard,
            AppEvent::Notification(_) => EventCategory::Notification,
            AppEvent::Settings(_) => EventCategory::Settings,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Connection(e) => e.description(),
            AppEvent::Dashboard(e) => e.description(),
            AppEvent::Notification(n) => format!("{:?}: {} - {}", n.level, n.title, n.message),
            AppEvent::Settings(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Robot connection events.
    Connection,
    /// Operator panel updates.
    Dashboard,
    /// Operator notifications.
    Notification,
    /// Settings and configuration events.
    Settings,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Connection => write!(f, "Connection"),
            EventCategory::Dashboard => write!(f, "Dashboard"),
            EventCategory::Notification => write!(f, "Notification"),
            EventCategory::Settings => write!(f, "Settings"),
        }
    }
}

/// Reason for disconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Operator pressed disconnect
    UserRequested,
    /// Replaced by a new connection attempt
    Reconnecting,
    /// Poll loop shut down
    Shutdown,
}

/// Connection-related events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionEvent {
    /// Starting connection attempt.
    Connecting {
        /// Robot IP being connected to.
        ip: String,
    },
    /// Handshake completed, polling started.
    Connected {
        /// Robot IP that was connected.
        ip: String,
    },
    /// Session torn down.
    Disconnected {
        /// Robot IP that was disconnected.
        ip: String,
        /// Reason for the disconnection.
        reason: DisconnectReason,
    },
    /// Connection attempt failed.
    ConnectionFailed {
        /// Robot IP that failed to connect.
        ip: String,
        /// Error message describing the failure.
        error: String,
    },
    /// Discovery found a robot server.
    ServerFound {
        /// Address of the responding server.
        ip: String,
    },
    /// Discovery finished without an answer.
    ServerNotFound,
}

impl ConnectionEvent {
    fn description(&self) -> String {
        match self {
            ConnectionEvent::Connecting { ip } => format!("Connecting to {}", ip),
            ConnectionEvent::Connected { ip } => format!("Connected to {}", ip),
            ConnectionEvent::Disconnected { ip, reason } => {
                format!("Disconnected from {}: {:?}", ip, reason)
            }
            ConnectionEvent::ConnectionFailed { ip, error } => {
                format!("Connection failed to {}: {}", ip, error)
            }
            ConnectionEvent::ServerFound { ip } => format!("Robot server found at {}", ip),
            ConnectionEvent::ServerNotFound => "No robot server found".to_string(),
        }
    }
}

/// Operator panel updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DashboardEvent {
    /// Forward/rotational speed displays changed.
    Speeds {
        /// Forward speed in m/s.
        forward: Readout,
        /// Rotational speed in the configured angle unit.
        rotation: Readout,
    },
    /// Battery label and bar changed.
    Battery {
        /// Label text, e.g. `Battery: 12.10V/12.60V`.
        label: String,
        /// Bar value in mV.
        value_mv: i32,
        /// Bar range in mV.
        range_mv: (i32, i32),
        /// Charge in percent.
        percent: f64,
        /// Bar color.
        color: ChargeColor,
    },
    /// Board status indicators changed.
    BoardStatus {
        /// Status reported by the controller.
        status: BoardStatus,
        /// Indicator colors: PID, ramp, save to EEPROM, watchdog.
        indicators: [IndicatorColor; 4],
    },
    /// Status bar text changed.
    StatusText {
        /// New status text.
        text: String,
    },
    /// Robot address field changed.
    AddressText {
        /// New field content.
        text: String,
    },
    /// Toolbar and menu enablement changed.
    Controls {
        /// Connect and find-server buttons enabled.
        connect_enabled: bool,
        /// Robot configuration action enabled.
        robot_actions_enabled: bool,
    },
    /// Control mode toggled.
    ControlMode {
        /// The new mode.
        mode: ControlMode,
    },
    /// A video frame was handed to the renderer.
    FrameShown {
        /// Frame sequence number.
        sequence: u64,
    },
}

impl DashboardEvent {
    fn description(&self) -> String {
        match self {
            DashboardEvent::Speeds { forward, rotation } => {
                format!("Speeds: fw {} rot {}", forward, rotation)
            }
            DashboardEvent::Battery { label, .. } => label.clone(),
            DashboardEvent::BoardStatus { status, .. } => format!("Board status: {:?}", status),
            DashboardEvent::StatusText { text } => format!("Status: {}", text),
            DashboardEvent::AddressText { text } => format!("Address: {}", text),
            DashboardEvent::Controls {
                connect_enabled,
                robot_actions_enabled,
            } => format!(
                "Controls: connect={}, robot actions={}",
                connect_enabled, robot_actions_enabled
            ),
            DashboardEvent::ControlMode { mode } => format!("Control mode: {}", mode),
            DashboardEvent::FrameShown { sequence } => format!("Frame {}", sequence),
        }
    }
}

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Informational question or message.
    Info,
    /// Something went wrong, the operator may retry.
    Warning,
    /// Operation failed.
    Error,
}

/// A message shown to the operator in a modal box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Box title.
    pub title: String,
    /// Box text.
    pub message: String,
}

impl Notification {
    /// Create a warning notification
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Create an error notification
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Setting value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    /// Boolean setting value.
    Bool(bool),
    /// String setting value.
    String(String),
}

/// Settings-related events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SettingsEvent {
    /// Setting changed.
    Changed {
        /// Setting key that was changed.
        key: String,
        /// New value of the setting.
        value: SettingValue,
    },
}

impl SettingsEvent {
    fn description(&self) -> String {
        match self {
            SettingsEvent::Changed { key, value } => {
                format!("Setting: {} = {:?}", key, value)
            }
        }
    }
}
