//! Display values published to the operator panel

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown by numeric displays that have no data yet
pub const NO_DATA: &str = "------";

/// A numeric display value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Readout {
    /// No valid data, show the placeholder
    #[default]
    Placeholder,
    /// A value to show
    Value(f64),
}

impl Readout {
    /// Readout for an optional value
    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(Self::Placeholder, Self::Value)
    }

    /// The value, if any
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Placeholder => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Whether the placeholder is shown
    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => write!(f, "{}", NO_DATA),
            Self::Value(v) => write!(f, "{:.3}", v),
        }
    }
}

/// Background of a board status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndicatorColor {
    /// No status received yet
    #[default]
    Gray,
    /// Status received
    Green,
}

/// Battery bar color band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChargeColor {
    /// 10 % or less
    Red,
    /// 25 % or less
    Orange,
    /// Above 25 %
    #[default]
    Green,
}

impl ChargeColor {
    /// Band for a charge percentage
    pub fn for_percent(percent: f64) -> Self {
        if percent <= 10.0 {
            Self::Red
        } else if percent <= 25.0 {
            Self::Orange
        } else {
            Self::Green
        }
    }
}
