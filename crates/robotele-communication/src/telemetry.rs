//! Asynchronous replies from the robot
//!
//! Controller queries are fire-and-forget. Their answers, and "new frame"
//! notices from the webcam client, arrive later as [`Telemetry`] wrapped in an
//! [`Envelope`] that carries the connection [`Epoch`] it belongs to. The poll
//! loop drops envelopes from any epoch other than the live one, so a reply
//! that lands after a reconnect can never touch the new session.

use robotele_core::drive::Wheel;
use robotele_core::robot::{BoardStatus, RobotConfiguration};
use tokio::sync::mpsc;

/// Connection attempt counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Epoch(u64);

impl Epoch {
    /// The epoch following this one
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reply or notice from the robot side
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    /// Speed of one wheel in m/s
    MotorSpeed {
        /// Which wheel reported
        wheel: Wheel,
        /// Measured speed
        speed: f64,
    },
    /// Speeds of both wheels in m/s
    MotorSpeeds {
        /// Left wheel speed
        left: f64,
        /// Right wheel speed
        right: f64,
    },
    /// Configuration read from EEPROM
    RobotConfiguration(RobotConfiguration),
    /// Battery voltage in volts
    BatteryVoltage(f64),
    /// Controller feature flags
    BoardStatus(BoardStatus),
    /// The webcam client decoded a new frame
    FrameAvailable,
}

/// Telemetry tagged with its connection epoch
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Connection the telemetry belongs to
    pub epoch: Epoch,
    /// The payload
    pub telemetry: Telemetry,
}

/// Sending half handed to a controller or video client for one connection
#[derive(Debug, Clone)]
pub struct TelemetrySender {
    epoch: Epoch,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl TelemetrySender {
    /// Epoch stamped on everything sent through this handle
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Deliver telemetry to the poll loop.
    ///
    /// Returns false once the poll loop has gone away.
    pub fn send(&self, telemetry: Telemetry) -> bool {
        self.tx
            .send(Envelope {
                epoch: self.epoch,
                telemetry,
            })
            .is_ok()
    }

    /// Whether the poll loop is still listening
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Hands out epoch-bound senders that all feed one receiver
#[derive(Debug, Clone)]
pub struct TelemetryRouter {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl TelemetryRouter {
    /// Sender stamping the given epoch
    pub fn sender(&self, epoch: Epoch) -> TelemetrySender {
        TelemetrySender {
            epoch,
            tx: self.tx.clone(),
        }
    }
}

/// Create the telemetry channel consumed by the poll loop
pub fn telemetry_channel() -> (TelemetryRouter, mpsc::UnboundedReceiver<Envelope>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TelemetryRouter { tx }, rx)
}
