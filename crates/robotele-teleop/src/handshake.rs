//! Connection handshake
//!
//! A freshly opened controller is only usable after three calls succeed in
//! order: push the board status for the persisted control mode, fetch the
//! robot configuration from EEPROM, then fetch the board status. The
//! controller needs a settle delay between calls.

use robotele_communication::RobotController;
use robotele_core::drive::ControlMode;
use robotele_core::error::ControllerError;
use robotele_core::event_bus::Notification;
use robotele_core::robot::BoardStatus;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Title of the notification shown when the handshake fails
pub const HANDSHAKE_ERROR_TITLE: &str = "Communication Error";

/// A handshake step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    /// Board status push
    PushBoardStatus,
    /// Configuration fetch from EEPROM
    FetchConfiguration,
    /// Board status fetch
    FetchBoardStatus,
}

impl HandshakeStep {
    /// Message shown to the operator when this step fails
    pub fn operator_message(self) -> &'static str {
        match self {
            Self::PushBoardStatus => {
                "There was an error configuring Robot communication.\nPlease try again to connect."
            }
            Self::FetchConfiguration => {
                "There was an error retrieving Robot configuration.\nPlease try again to connect."
            }
            Self::FetchBoardStatus => {
                "There was an error retrieving RoboController configuration.\nPlease try again to connect."
            }
        }
    }
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushBoardStatus => write!(f, "set_board_status"),
            Self::FetchConfiguration => write!(f, "get_robot_configuration_from_eeprom"),
            Self::FetchBoardStatus => write!(f, "get_board_status"),
        }
    }
}

/// A failed handshake
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{step} failed: {source}")]
pub struct HandshakeError {
    /// The step that failed
    pub step: HandshakeStep,
    /// The controller error
    pub source: ControllerError,
}

impl HandshakeError {
    /// Blocking notification for the operator
    pub fn notification(&self) -> Notification {
        Notification::error(HANDSHAKE_ERROR_TITLE, self.step.operator_message())
    }
}

fn step(step: HandshakeStep, result: Result<(), ControllerError>) -> Result<(), HandshakeError> {
    result.map_err(|source| HandshakeError { step, source })
}

/// Run the handshake against `controller`.
///
/// Stops at the first failing step. Replies to the two fetches arrive later
/// as telemetry.
pub async fn perform(
    controller: &mut dyn RobotController,
    mode: ControlMode,
    settle: Duration,
) -> Result<(), HandshakeError> {
    let status = BoardStatus::for_pid(mode.is_pid());
    tracing::debug!("Handshake: pushing {:?}", status);
    step(
        HandshakeStep::PushBoardStatus,
        controller.set_board_status(status),
    )?;

    tokio::time::sleep(settle).await;

    tracing::debug!("Handshake: requesting robot configuration");
    step(
        HandshakeStep::FetchConfiguration,
        controller.get_robot_configuration_from_eeprom(),
    )?;

    tokio::time::sleep(settle).await;

    tracing::debug!("Handshake: requesting board status");
    step(
        HandshakeStep::FetchBoardStatus,
        controller.get_board_status(),
    )
}
