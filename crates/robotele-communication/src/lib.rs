//! # RoboTele Communication
//!
//! Links to the robot: the controller handle, the webcam client and server
//! discovery. Query results come back as epoch-tagged [`Telemetry`] on a
//! channel consumed by the poll loop.
//! Includes a simulated robot for demos and tests.

pub mod controller;
pub mod discovery;
pub mod sim;
pub mod telemetry;
pub mod video;

pub use controller::{ControllerConnector, ControllerEndpoint, ControllerResult, RobotController};
pub use discovery::{ServerDiscovery, UdpBroadcastDiscovery};
pub use sim::{SimulatedCamera, SimulatedConnector, SimulatedRobot, StaticDiscovery};
pub use telemetry::{
    telemetry_channel, Envelope, Epoch, Telemetry, TelemetryRouter, TelemetrySender,
};
pub use video::{Frame, FrameRenderer, FrameSlot, VideoConnector, VideoEndpoint, VideoSource};
