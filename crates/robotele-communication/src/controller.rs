//! Robot controller interface
//!
//! The controller SDK is an external collaborator. Every call either fails
//! with a [`ControllerError`] or is accepted; queries answer later through
//! the [`TelemetrySender`] the controller was opened with.

use crate::telemetry::TelemetrySender;
use robotele_core::drive::Wheel;
use robotele_core::error::{ConnectionError, ControllerError};
use robotele_core::robot::{BoardStatus, RobotConfiguration};

/// Result type for controller calls
pub type ControllerResult<T> = std::result::Result<T, ControllerError>;

/// Capability set of a connected robot controller
pub trait RobotController: Send {
    /// Set target wheel speeds in m/s (PID mode). The controller answers
    /// with the measured speeds.
    fn set_motor_speeds(&mut self, left: f64, right: f64) -> ControllerResult<()>;

    /// Set a raw duty cycle on one motor (raw PWM mode)
    fn set_motor_pwm(&mut self, wheel: Wheel, duty: i32) -> ControllerResult<()>;

    /// Query the measured wheel speeds
    fn get_motor_speeds(&mut self) -> ControllerResult<()>;

    /// Query the battery voltage
    fn get_battery_charge_value(&mut self) -> ControllerResult<()>;

    /// Push feature flags
    fn set_board_status(&mut self, status: BoardStatus) -> ControllerResult<()>;

    /// Query feature flags
    fn get_board_status(&mut self) -> ControllerResult<()>;

    /// Query the configuration stored in EEPROM
    fn get_robot_configuration_from_eeprom(&mut self) -> ControllerResult<()>;

    /// Replace the working configuration
    fn set_robot_configuration(&mut self, config: &RobotConfiguration) -> ControllerResult<()>;

    /// Persist the working configuration to EEPROM
    fn save_robot_configuration_to_eeprom(&mut self) -> ControllerResult<()>;
}

/// Network address of a robot controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerEndpoint {
    /// Robot IP address or hostname
    pub ip: String,
    /// TCP command port
    pub tcp_port: u16,
    /// UDP control port
    pub udp_control_port: u16,
    /// UDP status port the robot sends on
    pub udp_status_port_send: u16,
    /// UDP status port the operator listens on
    pub udp_status_port_listen: u16,
}

/// Opens controller handles
pub trait ControllerConnector: Send {
    /// Open a controller at the endpoint. Replies must be sent through
    /// `telemetry`.
    fn open(
        &mut self,
        endpoint: &ControllerEndpoint,
        telemetry: TelemetrySender,
    ) -> Result<Box<dyn RobotController>, ConnectionError>;
}
