//! Error types for the teleoperation crate.

use thiserror::Error;

/// Errors returned by a [`TeleopHandle`](crate::TeleopHandle)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeleopError {
    /// The poll loop has exited
    #[error("Teleoperation loop has stopped")]
    LoopStopped,
}

/// Result type alias for handle operations.
pub type TeleopResult<T> = Result<T, TeleopError>;
