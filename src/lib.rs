//! # RoboTele
//!
//! Operator shell for teleoperating a differential-drive robot:
//! - Joypad driving in PID (closed loop) or raw PWM mode
//! - Live webcam video
//! - Wheel speed, battery and board status readouts
//! - Robot server discovery on the local network
//!
//! ## Architecture
//!
//! RoboTele is organized as a workspace with multiple crates:
//!
//! 1. **robotele-core** - Drive math, robot data model, event bus
//! 2. **robotele-communication** - Controller handle, webcam client, discovery, simulator
//! 3. **robotele-settings** - Persistent operator settings
//! 4. **robotele-teleop** - The teleoperation poll loop and dashboard model
//! 5. **robotele** - Main binary that wires the crates together

use std::sync::Arc;

pub use robotele_communication::{
    Frame, FrameRenderer, SimulatedCamera, SimulatedConnector, UdpBroadcastDiscovery,
};
pub use robotele_core::event_bus::{AppEvent, EventBus, EventFilter, NotificationLevel};
pub use robotele_core::{BoardStatus, ControlMode, RobotConfiguration};
pub use robotele_settings::{Config, SettingsStore};
pub use robotele_teleop::{CancelEditor, Collaborators, TeleopHandle, TeleopLoop};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Datagram sent to find a robot server
pub const DISCOVERY_REQUEST: &[u8] = b"ROBOTELE_DISCOVER";

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Mirror every bus event into the log
pub fn log_events(bus: &EventBus) {
    bus.subscribe(EventFilter::All, |event| match &event {
        AppEvent::Notification(n) if n.level == NotificationLevel::Error => {
            tracing::error!("{}", event.description())
        }
        AppEvent::Notification(_) => tracing::warn!("{}", event.description()),
        _ => tracing::info!(category = %event.category(), "{}", event.description()),
    });
}

/// Frame renderer for headless runs: logs every frame it is handed
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl LogRenderer {
    /// Frames shown so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameRenderer for LogRenderer {
    fn show(&mut self, frame: &Frame) {
        self.frames += 1;
        let (width, height) = frame.dimensions();
        tracing::debug!("Frame {} ({}x{})", frame.sequence, width, height);
    }
}

/// Collaborators wired to the simulated robot and webcam.
///
/// Discovery still goes to the network, so "find server" only answers when a
/// real robot server is reachable.
pub fn simulated_collaborators(config: &Config) -> Collaborators {
    let discovery = UdpBroadcastDiscovery::new(DISCOVERY_REQUEST, config.discovery_timeout());
    Collaborators {
        controllers: Box::new(SimulatedConnector::new(RobotConfiguration::default())),
        video: Box::new(SimulatedCamera::default()),
        discovery: Arc::new(discovery),
        renderer: Box::new(LogRenderer::default()),
        editor: Box::new(CancelEditor),
    }
}
