//! Robot data model
//!
//! Configuration and status blocks exchanged with the robot controller.

use serde::{Deserialize, Serialize};

/// Robot parameters stored in the controller EEPROM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfiguration {
    /// Distance between the two driven wheels, in mm
    pub wheel_base_mm: f64,
    /// Wheel radius, in mm
    pub wheel_radius_mm: f64,
    /// Encoder counts per motor shaft revolution
    pub encoder_cpr: u32,
    /// Motor to wheel gear ratio
    pub gear_ratio: f64,
    /// Battery level considered empty, in mV
    pub min_charged_battery_mv: u32,
    /// Battery level considered full, in mV
    pub max_charged_battery_mv: u32,
}

impl Default for RobotConfiguration {
    fn default() -> Self {
        Self {
            wheel_base_mm: 300.0,
            wheel_radius_mm: 60.0,
            encoder_cpr: 400,
            gear_ratio: 1.0,
            min_charged_battery_mv: 11_000,
            max_charged_battery_mv: 12_600,
        }
    }
}

impl RobotConfiguration {
    /// Fully charged voltage, in volts
    pub fn max_charged_volts(&self) -> f64 {
        self.max_charged_battery_mv as f64 / 1000.0
    }
}

/// Controller feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardStatus {
    /// Closed-loop speed control
    pub pid_enable: bool,
    /// Acceleration ramps on speed changes
    pub accel_ramp_enable: bool,
    /// Persist the status to EEPROM
    pub save_to_eeprom: bool,
    /// Motor watchdog, stops the motors when commands stop arriving
    pub wd_enable: bool,
}

impl BoardStatus {
    /// Status pushed to the controller for a given PID preference.
    ///
    /// PID and acceleration ramps follow the preference; the status is always
    /// saved and the watchdog always armed.
    pub fn for_pid(pid_enabled: bool) -> Self {
        Self {
            pid_enable: pid_enabled,
            accel_ramp_enable: pid_enabled,
            save_to_eeprom: true,
            wd_enable: true,
        }
    }
}

/// Charge level in percent for a battery voltage.
///
/// The range is `[min_mv, max_mv]`; readings outside it are clamped. A zero,
/// negative or non-finite voltage and an empty range both read as 0 %.
pub fn charge_percent(volts: f64, min_mv: u32, max_mv: u32) -> f64 {
    if !volts.is_finite() || volts <= 0.0 || max_mv <= min_mv {
        return 0.0;
    }

    let millivolts = volts * 1000.0;
    let span = (max_mv - min_mv) as f64;
    ((millivolts - min_mv as f64) / span * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_status_for_pid() {
        let on = BoardStatus::for_pid(true);
        assert!(on.pid_enable && on.accel_ramp_enable && on.save_to_eeprom && on.wd_enable);

        let off = BoardStatus::for_pid(false);
        assert!(!off.pid_enable);
        assert!(!off.accel_ramp_enable);
        assert!(off.save_to_eeprom);
        assert!(off.wd_enable);
    }

    #[test]
    fn test_charge_percent() {
        assert_eq!(charge_percent(11.0, 11_000, 12_600), 0.0);
        assert_eq!(charge_percent(12.6, 11_000, 12_600), 100.0);
        assert!((charge_percent(11.8, 11_000, 12_600) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_charge_percent_guards() {
        assert_eq!(charge_percent(0.0, 11_000, 12_600), 0.0);
        assert_eq!(charge_percent(-1.0, 11_000, 12_600), 0.0);
        assert_eq!(charge_percent(12.0, 0, 0), 0.0);
        assert_eq!(charge_percent(13.5, 11_000, 12_600), 100.0);
    }

    #[test]
    fn test_max_charged_volts() {
        let config = RobotConfiguration::default();
        assert!((config.max_charged_volts() - 12.6).abs() < 1e-9);
    }
}
