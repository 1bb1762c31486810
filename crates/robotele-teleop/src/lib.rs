//! # RoboTele Teleop
//!
//! The teleoperation poll loop. A single task connects to a robot
//! controller, sends joypad commands, polls speeds and battery, shows video
//! frames and publishes the operator panel on the event bus.

pub mod dashboard;
pub mod editor;
pub mod error;
pub mod handshake;
pub mod operator;
pub mod poll_loop;
pub mod session;
pub mod timers;

pub use dashboard::Dashboard;
pub use editor::{CancelEditor, ConfigurationEditor};
pub use error::{TeleopError, TeleopResult};
pub use handshake::{HandshakeError, HandshakeStep};
pub use operator::{OperatorCommand, TeleopHandle};
pub use poll_loop::{Collaborators, TeleopLoop};
pub use session::{Applied, Session};
pub use timers::{PollPeriods, PollTimers, Tick};
