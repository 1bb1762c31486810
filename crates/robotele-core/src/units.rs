//! Unit conversion utilities
//!
//! Rotational speeds are computed in rad/s and shown in the operator's
//! preferred angle unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Angle unit used for rotational speed display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    /// Degrees (rotational speed in deg/s)
    #[default]
    Degrees,
    /// Radians (rotational speed in rad/s)
    Radians,
}

impl AngleUnit {
    /// Convert a rate given in rad/s into this unit
    pub fn from_radians(self, rad_per_sec: f64) -> f64 {
        match self {
            Self::Degrees => rad_per_sec.to_degrees(),
            Self::Radians => rad_per_sec,
        }
    }

    /// Suffix for a rate in this unit
    pub fn rate_suffix(self) -> &'static str {
        match self {
            Self::Degrees => "deg/s",
            Self::Radians => "rad/s",
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrees => write!(f, "Degrees"),
            Self::Radians => write!(f, "Radians"),
        }
    }
}

impl FromStr for AngleUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degrees" | "deg" => Ok(Self::Degrees),
            "radians" | "rad" => Ok(Self::Radians),
            _ => Err(format!("Unknown angle unit: {}", s)),
        }
    }
}

/// Convert millimetres to metres
pub fn mm_to_m(value_mm: f64) -> f64 {
    value_mm / 1000.0
}
