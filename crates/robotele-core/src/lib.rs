//! # RoboTele Core
//!
//! Core types, traits, and utilities for RoboTele.
//! Provides the robot data model, the joystick-to-motor drive math,
//! error types and the application event bus.

pub mod display;
pub mod drive;
pub mod error;
pub mod event_bus;
pub mod robot;
pub mod units;

pub use display::{ChargeColor, IndicatorColor, Readout};

pub use drive::{
    combine_speeds, ControlMode, DriveLimits, JoystickSample, MotorCommand, SpeedSummary, Wheel,
    WheelSpeeds, PWM_MAX,
};

pub use error::{ConnectionError, ControllerError};

// Re-export event bus for convenience
pub use event_bus::{
    AppEvent, ConnectionEvent, DashboardEvent, DisconnectReason, EventBus, EventBusConfig,
    EventCategory, EventFilter, Notification, NotificationLevel, SettingsEvent, SubscriptionId,
};

pub use robot::{charge_percent, BoardStatus, RobotConfiguration};

pub use units::AngleUnit;
