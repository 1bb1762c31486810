//! Connection session
//!
//! Everything scoped to one established connection lives here: the
//! controller and video handles, the armed timers, the pending speed query,
//! the wheel readings, the cached robot configuration, the battery reading
//! and the frame flag. A session starts from scratch on every connect and
//! dropping it cancels the timers and releases both handles.

use crate::timers::PollTimers;
use robotele_communication::{
    ControllerResult, Epoch, Frame, RobotController, Telemetry, VideoSource,
};
use robotele_core::drive::{MotorCommand, Wheel, WheelSpeeds};
use robotele_core::robot::{BoardStatus, RobotConfiguration};

/// What a telemetry message changed
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Wheel readings changed
    Speeds,
    /// The robot configuration was replaced
    Configuration {
        /// The operator asked to edit it
        open_editor: bool,
    },
    /// A battery reading arrived
    Battery,
    /// The controller reported its flags
    BoardStatus(BoardStatus),
    /// A frame is waiting to be shown
    FrameFlagged,
}

/// State of one established connection
pub struct Session {
    epoch: Epoch,
    ip: String,
    controller: Box<dyn RobotController>,
    video: Option<Box<dyn VideoSource>>,
    pub(crate) timers: PollTimers,
    speed_requested: bool,
    speeds: WheelSpeeds,
    configuration: Option<RobotConfiguration>,
    battery_volts: Option<f64>,
    frame_available: bool,
    editor_pending: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("epoch", &self.epoch)
            .field("ip", &self.ip)
            .field("speed_requested", &self.speed_requested)
            .field("speeds", &self.speeds)
            .field("configuration", &self.configuration)
            .field("battery_volts", &self.battery_volts)
            .field("frame_available", &self.frame_available)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session with all per-connection state cleared
    pub fn new(
        epoch: Epoch,
        ip: impl Into<String>,
        controller: Box<dyn RobotController>,
        video: Option<Box<dyn VideoSource>>,
        timers: PollTimers,
    ) -> Self {
        Self {
            epoch,
            ip: ip.into(),
            controller,
            video,
            timers,
            speed_requested: false,
            speeds: WheelSpeeds::default(),
            configuration: None,
            battery_volts: None,
            frame_available: false,
            editor_pending: false,
        }
    }

    /// Epoch this session accepts telemetry for
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Robot address
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// A speed query is outstanding
    pub fn speed_requested(&self) -> bool {
        self.speed_requested
    }

    /// Latest wheel readings
    pub fn speeds(&self) -> &WheelSpeeds {
        &self.speeds
    }

    /// Cached robot configuration, once received
    pub fn configuration(&self) -> Option<&RobotConfiguration> {
        self.configuration.as_ref()
    }

    /// Latest battery voltage
    pub fn battery_volts(&self) -> Option<f64> {
        self.battery_volts
    }

    /// A frame is waiting to be shown
    pub fn frame_available(&self) -> bool {
        self.frame_available
    }

    /// The next configuration goes to the editor
    pub fn editor_pending(&self) -> bool {
        self.editor_pending
    }

    /// Dispatch a motor command.
    ///
    /// A speed command makes the controller echo the measured speeds, so it
    /// counts as an outstanding speed query.
    pub fn send_command(&mut self, command: MotorCommand) -> ControllerResult<()> {
        match command {
            MotorCommand::Speeds { left, right } => {
                self.controller.set_motor_speeds(left, right)?;
                self.speed_requested = true;
            }
            MotorCommand::Pwm { left, right } => {
                self.controller.set_motor_pwm(Wheel::Left, left)?;
                self.controller.set_motor_pwm(Wheel::Right, right)?;
            }
        }
        Ok(())
    }

    /// Take the flagged frame, if any. The flag clears with the take.
    pub fn take_frame(&mut self) -> Option<Frame> {
        if !std::mem::take(&mut self.frame_available) {
            return None;
        }
        self.video.as_mut().and_then(|video| video.last_frame())
    }

    /// Ask for wheel speeds unless a query is already outstanding.
    ///
    /// Returns whether a query was sent. A failed query leaves nothing
    /// outstanding, so the next tick tries again.
    pub fn request_speeds(&mut self) -> ControllerResult<bool> {
        if self.speed_requested {
            return Ok(false);
        }
        self.speed_requested = true;
        if let Err(e) = self.controller.get_motor_speeds() {
            self.speed_requested = false;
            return Err(e);
        }
        Ok(true)
    }

    /// Ask for the battery voltage
    pub fn request_battery(&mut self) -> ControllerResult<()> {
        self.controller.get_battery_charge_value()
    }

    /// Push new board flags
    pub fn push_board_status(&mut self, status: BoardStatus) -> ControllerResult<()> {
        self.controller.set_board_status(status)
    }

    /// Fetch the configuration and hand it to the editor when it arrives
    pub fn request_configuration_edit(&mut self) -> ControllerResult<()> {
        self.editor_pending = true;
        self.controller.get_robot_configuration_from_eeprom()
    }

    /// Send an edited configuration and store it in EEPROM
    pub fn store_configuration(&mut self, config: RobotConfiguration) -> ControllerResult<()> {
        self.controller.set_robot_configuration(&config)?;
        self.configuration = Some(config);
        self.controller.save_robot_configuration_to_eeprom()
    }

    /// Apply telemetry that belongs to this session
    pub fn apply(&mut self, telemetry: Telemetry) -> Applied {
        match telemetry {
            Telemetry::MotorSpeed { wheel, speed } => {
                self.speeds.set(wheel, speed);
                if self.speeds.pair().is_some() {
                    self.speed_requested = false;
                }
                Applied::Speeds
            }
            Telemetry::MotorSpeeds { left, right } => {
                self.speeds.set_both(left, right);
                self.speed_requested = false;
                Applied::Speeds
            }
            Telemetry::RobotConfiguration(config) => {
                self.configuration = Some(config);
                Applied::Configuration {
                    open_editor: std::mem::take(&mut self.editor_pending),
                }
            }
            Telemetry::BatteryVoltage(volts) => {
                self.battery_volts = Some(volts);
                Applied::Battery
            }
            Telemetry::BoardStatus(status) => Applied::BoardStatus(status),
            Telemetry::FrameAvailable => {
                self.frame_available = true;
                Applied::FrameFlagged
            }
        }
    }
}
