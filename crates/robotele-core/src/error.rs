//! Error handling for RoboTele
//!
//! Provides the error types shared by every layer of the application:
//! - Controller errors (any call into the robot controller)
//! - Connection errors (addresses, discovery, video link)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Controller error type
///
/// Raised by any call into a robot controller handle. The remote side only
/// reports one kind of failure, a communication error with a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// No controller session is open
    #[error("Controller not connected")]
    NotConnected,

    /// Transport or protocol failure while talking to the controller
    #[error("Controller communication error: {message}")]
    Communication {
        /// The error message reported by the transport.
        message: String,
    },
}

impl ControllerError {
    /// Create a communication error from a message
    pub fn communication(message: impl Into<String>) -> Self {
        ControllerError::Communication {
            message: message.into(),
        }
    }
}

/// Connection error type
///
/// Represents errors opening links to the robot: the controller endpoint,
/// the video client and server discovery.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// Invalid hostname/IP
    #[error("Invalid robot address: {address}")]
    InvalidAddress {
        /// The address that could not be parsed.
        address: String,
    },

    /// The controller endpoint refused or dropped the connection
    #[error("Failed to open controller at {address}: {reason}")]
    FailedToOpen {
        /// The address that was dialled.
        address: String,
        /// The reason the connection failed.
        reason: String,
    },

    /// The video client could not be started
    #[error("Video link error: {reason}")]
    Video {
        /// The reason the video link failed.
        reason: String,
    },

    /// Discovery could not run (socket setup, broadcast permission)
    #[error("Server discovery failed: {reason}")]
    Discovery {
        /// The reason discovery failed.
        reason: String,
    },
}
