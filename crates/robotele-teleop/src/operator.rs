//! Operator commands
//!
//! Panel actions and joypad input reach the poll loop as
//! [`OperatorCommand`]s sent through a [`TeleopHandle`].

use crate::error::{TeleopError, TeleopResult};
use tokio::sync::mpsc;

/// Queue depth for operator commands
pub const COMMAND_QUEUE_DEPTH: usize = 64;

/// An operator action
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    /// Connect to the robot at `ip`, replacing any open session
    Connect {
        /// Robot IP address or hostname
        ip: String,
    },
    /// Close the session
    Disconnect,
    /// Look for a robot server on the network
    FindServer {
        /// Connect to the server that answers
        auto_connect: bool,
    },
    /// New joypad position
    Joystick {
        /// Horizontal axis, turning
        x: f64,
        /// Vertical axis, forward
        y: f64,
    },
    /// Switch between PID and raw PWM control
    SetPidEnabled(bool),
    /// Fetch the robot configuration and open the editor
    EditRobotConfiguration,
    /// Close the session and stop the loop
    Shutdown,
}

/// Sends commands to a running poll loop
#[derive(Debug, Clone)]
pub struct TeleopHandle {
    tx: mpsc::Sender<OperatorCommand>,
}

impl TeleopHandle {
    pub(crate) fn channel() -> (Self, mpsc::Receiver<OperatorCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        (Self { tx }, rx)
    }

    /// Send a command
    pub async fn send(&self, command: OperatorCommand) -> TeleopResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| TeleopError::LoopStopped)
    }

    /// Connect to the robot at `ip`
    pub async fn connect(&self, ip: impl Into<String>) -> TeleopResult<()> {
        self.send(OperatorCommand::Connect { ip: ip.into() }).await
    }

    /// Close the session
    pub async fn disconnect(&self) -> TeleopResult<()> {
        self.send(OperatorCommand::Disconnect).await
    }

    /// Look for a robot server
    pub async fn find_server(&self, auto_connect: bool) -> TeleopResult<()> {
        self.send(OperatorCommand::FindServer { auto_connect }).await
    }

    /// Report a joypad position.
    ///
    /// Never waits: input events arrive far faster than the command tick
    /// consumes them, so a full queue drops the sample.
    pub fn joystick(&self, x: f64, y: f64) -> TeleopResult<()> {
        match self.tx.try_send(OperatorCommand::Joystick { x, y }) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TeleopError::LoopStopped),
        }
    }

    /// Switch control mode
    pub async fn set_pid_enabled(&self, enabled: bool) -> TeleopResult<()> {
        self.send(OperatorCommand::SetPidEnabled(enabled)).await
    }

    /// Open the robot configuration editor
    pub async fn edit_robot_configuration(&self) -> TeleopResult<()> {
        self.send(OperatorCommand::EditRobotConfiguration).await
    }

    /// Stop the loop
    pub async fn shutdown(&self) -> TeleopResult<()> {
        self.send(OperatorCommand::Shutdown).await
    }

    /// Whether the loop has exited
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
