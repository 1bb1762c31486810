//! Differential drive math
//!
//! Translates joypad samples into motor commands and wheel speed telemetry
//! into a forward/rotational speed pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::mm_to_m;

/// Full-scale PWM duty cycle accepted by the motor driver
pub const PWM_MAX: i32 = 2047;

/// Motor control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlMode {
    /// Closed loop: commands are target wheel speeds in m/s
    Pid,
    /// Open loop: commands are raw duty cycles
    #[default]
    RawPwm,
}

impl ControlMode {
    /// Mode selected by the persisted `pid_enabled` flag
    pub fn from_pid_enabled(pid_enabled: bool) -> Self {
        if pid_enabled {
            Self::Pid
        } else {
            Self::RawPwm
        }
    }

    /// Whether the controller's PID loop should be enabled for this mode
    pub fn is_pid(self) -> bool {
        self == Self::Pid
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pid => write!(f, "PID"),
            Self::RawPwm => write!(f, "Raw PWM"),
        }
    }
}

/// Driven wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wheel {
    /// Left wheel, motor index 0
    Left,
    /// Right wheel, motor index 1
    Right,
}

impl Wheel {
    /// Motor index used on the wire
    pub fn index(self) -> u16 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// Wheel for a motor index. Anything other than 0 is the right wheel,
    /// as the controller only drives two motors.
    pub fn from_index(index: u16) -> Self {
        if index == 0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Latest joypad position, already mixed into per-wheel axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JoystickSample {
    /// Left wheel axis, in joypad units
    pub sx: f64,
    /// Right wheel axis, in joypad units
    pub dx: f64,
}

impl JoystickSample {
    /// Stick centred, both wheels stopped
    pub const NEUTRAL: Self = Self { sx: 0.0, dx: 0.0 };

    /// Create a sample from per-wheel axis values
    pub fn new(sx: f64, dx: f64) -> Self {
        Self { sx, dx }
    }

    /// Mix a joypad (x, y) position into wheel axes.
    ///
    /// `y` drives both wheels forward, `x` turns by slowing one side and
    /// speeding up the other.
    pub fn from_axes(x: f64, y: f64) -> Self {
        Self {
            sx: y - x,
            dx: y + x,
        }
    }
}

/// Scaling applied when turning joypad units into commands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveLimits {
    /// Maximum absolute joypad axis value
    pub axis_scale: f64,
    /// Wheel speed commanded at full deflection, in m/s
    pub max_speed: f64,
}

impl Default for DriveLimits {
    fn default() -> Self {
        Self {
            axis_scale: 100.0,
            max_speed: 2.0,
        }
    }
}

impl DriveLimits {
    /// Axis value as a fraction of full deflection. A non-positive scale
    /// yields zero so a misconfigured joypad never drives the motors.
    fn normalize(&self, axis: f64) -> f64 {
        if self.axis_scale > 0.0 && axis.is_finite() {
            axis / self.axis_scale
        } else {
            0.0
        }
    }
}

/// A command for both motors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    /// Target wheel speeds in m/s (PID mode)
    Speeds {
        /// Left wheel target speed
        left: f64,
        /// Right wheel target speed
        right: f64,
    },
    /// Raw duty cycles in [-PWM_MAX, PWM_MAX] (raw PWM mode)
    Pwm {
        /// Left wheel duty cycle
        left: i32,
        /// Right wheel duty cycle
        right: i32,
    },
}

impl MotorCommand {
    /// Build the command for a joypad sample in the given mode
    pub fn from_sample(sample: JoystickSample, mode: ControlMode, limits: &DriveLimits) -> Self {
        let left = limits.normalize(sample.sx);
        let right = limits.normalize(sample.dx);

        match mode {
            ControlMode::Pid => MotorCommand::Speeds {
                left: left * limits.max_speed,
                right: right * limits.max_speed,
            },
            ControlMode::RawPwm => MotorCommand::Pwm {
                left: to_duty_cycle(left),
                right: to_duty_cycle(right),
            },
        }
    }
}

/// Rounds half away from zero, so +0.5 and -0.5 steps stay symmetric.
fn to_duty_cycle(fraction: f64) -> i32 {
    let duty = (fraction * PWM_MAX as f64).round() as i32;
    duty.clamp(-PWM_MAX, PWM_MAX)
}

/// Per-wheel speed readings for the current connection
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    /// Left wheel speed in m/s, if reported
    pub left: Option<f64>,
    /// Right wheel speed in m/s, if reported
    pub right: Option<f64>,
}

impl WheelSpeeds {
    /// Store a single wheel reading
    pub fn set(&mut self, wheel: Wheel, speed: f64) {
        match wheel {
            Wheel::Left => self.left = Some(speed),
            Wheel::Right => self.right = Some(speed),
        }
    }

    /// Store both readings at once
    pub fn set_both(&mut self, left: f64, right: f64) {
        self.left = Some(left);
        self.right = Some(right);
    }

    /// Both readings, once both wheels have reported
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.left?, self.right?))
    }
}

/// Robot body speed derived from the two wheel speeds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedSummary {
    /// Forward speed in m/s
    pub forward: f64,
    /// Rotational speed in rad/s, `None` when the wheel base is unknown
    pub rotation: Option<f64>,
}

/// Combine wheel speeds (m/s) into forward and rotational speed.
///
/// Forward speed is `left + right / 2`, the value the controller panel has
/// always shown. Rotation is `(left - right) / wheel_base`, with the wheel
/// base in millimetres; a zero, negative or non-finite wheel base leaves
/// rotation unset.
pub fn combine_speeds(left: f64, right: f64, wheel_base_mm: f64) -> SpeedSummary {
    let forward = left + right / 2.0;

    let rotation = if wheel_base_mm.is_finite() && wheel_base_mm > 0.0 {
        Some((left - right) / mm_to_m(wheel_base_mm))
    } else {
        None
    };

    SpeedSummary { forward, rotation }
}
