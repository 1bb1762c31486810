//! Video link
//!
//! The webcam client decodes frames on its own thread and keeps only the
//! newest one. [`FrameSlot`] is that single-frame buffer: publishing
//! overwrites, taking empties it, and a [`Telemetry::FrameAvailable`] notice
//! tells the poll loop there is something to show.

use crate::telemetry::{Telemetry, TelemetrySender};
use image::RgbImage;
use parking_lot::Mutex;
use robotele_core::error::ConnectionError;
use std::sync::Arc;

/// A decoded video frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Sequence number assigned by the producer
    pub sequence: u64,
    /// Pixel data
    pub image: RgbImage,
}

impl Frame {
    /// Create a frame
    pub fn new(sequence: u64, image: RgbImage) -> Self {
        Self { sequence, image }
    }

    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Source of decoded frames for one connection
pub trait VideoSource: Send {
    /// Most recent decoded frame, if any. Never blocks.
    fn last_frame(&mut self) -> Option<Frame>;
}

/// Where the frames are drawn
pub trait FrameRenderer: Send {
    /// Show a frame
    fn show(&mut self, frame: &Frame);
}

/// Network address of the robot webcam server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEndpoint {
    /// Robot IP address or hostname
    pub ip: String,
    /// Webcam command port
    pub command_port: u16,
    /// Webcam stream port
    pub stream_port: u16,
}

/// Opens video sources
pub trait VideoConnector: Send {
    /// Open a video source. New-frame notices must be sent through
    /// `telemetry`.
    fn open(
        &mut self,
        endpoint: &VideoEndpoint,
        telemetry: TelemetrySender,
    ) -> Result<Box<dyn VideoSource>, ConnectionError>;
}

/// Single-frame buffer shared between a decoder and the poll loop
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    frame: Arc<Mutex<Option<Frame>>>,
}

impl FrameSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame and notify the poll loop.
    ///
    /// Returns false once the poll loop has gone away.
    pub fn publish(&self, frame: Frame, telemetry: &TelemetrySender) -> bool {
        *self.frame.lock() = Some(frame);
        telemetry.send(Telemetry::FrameAvailable)
    }

    /// Remove and return the stored frame
    pub fn take(&self) -> Option<Frame> {
        self.frame.lock().take()
    }

    /// Whether a frame is waiting
    pub fn is_empty(&self) -> bool {
        self.frame.lock().is_none()
    }
}

impl VideoSource for FrameSlot {
    fn last_frame(&mut self) -> Option<Frame> {
        self.take()
    }
}
