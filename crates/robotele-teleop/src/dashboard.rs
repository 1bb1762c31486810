//! Dashboard display model
//!
//! Turns session state into the text, numbers and colors of the operator
//! panel and publishes them on the event bus.

use robotele_core::display::{ChargeColor, IndicatorColor, Readout};
use robotele_core::drive::{combine_speeds, ControlMode, WheelSpeeds};
use robotele_core::event_bus::{
    AppEvent, ConnectionEvent, DashboardEvent, EventBus, Notification, SettingValue,
    SettingsEvent,
};
use robotele_core::robot::{charge_percent, BoardStatus, RobotConfiguration};
use robotele_core::units::AngleUnit;
use std::sync::Arc;

/// Status text while no session exists
pub const UNCONNECTED_TEXT: &str = "Unconnected";

/// Address field text when discovery finds nothing
pub const NO_SERVER_TEXT: &str = "No Robot Server found. Enter IP manually.";

/// Battery label before any reading
pub const BATTERY_UNKNOWN_LABEL: &str = "Battery: --.--V/--.--V";

/// Status text for an established session
pub fn connected_text(ip: &str) -> String {
    format!("Connected to robot on IP: {}", ip)
}

/// Forward and rotational readouts.
///
/// Both show the placeholder until a configuration is known and both wheels
/// have reported. Rotation also stays a placeholder for an unusable wheel
/// base.
pub fn speed_readouts(
    speeds: &WheelSpeeds,
    config: Option<&RobotConfiguration>,
    unit: AngleUnit,
) -> (Readout, Readout) {
    let (Some(config), Some((left, right))) = (config, speeds.pair()) else {
        return (Readout::Placeholder, Readout::Placeholder);
    };

    let summary = combine_speeds(left, right, config.wheel_base_mm);
    (
        Readout::Value(summary.forward),
        Readout::from_option(summary.rotation.map(|rad| unit.from_radians(rad))),
    )
}

/// Battery label, e.g. `Battery: 12.10V/12.60V`
pub fn battery_label(volts: f64, config: Option<&RobotConfiguration>) -> String {
    match config {
        Some(config) => format!(
            "Battery: {:5.2}V/{:5.2}V",
            volts,
            config.max_charged_volts()
        ),
        None => format!("Battery: {:5.2}V/--.--V", volts),
    }
}

/// Millivolts as a bar coordinate. EEPROM values past `i32::MAX` saturate.
fn bar_mv(mv: u32) -> i32 {
    i32::try_from(mv).unwrap_or(i32::MAX)
}

/// Battery label and bar for a reading
pub fn battery_display(volts: f64, config: Option<&RobotConfiguration>) -> DashboardEvent {
    let (range_mv, percent) = match config {
        Some(c) => (
            (bar_mv(c.min_charged_battery_mv), bar_mv(c.max_charged_battery_mv)),
            charge_percent(volts, c.min_charged_battery_mv, c.max_charged_battery_mv),
        ),
        None => ((0, 0), 0.0),
    };

    DashboardEvent::Battery {
        label: battery_label(volts, config),
        value_mv: (volts * 1000.0) as i32,
        range_mv,
        percent,
        color: ChargeColor::for_percent(percent),
    }
}

/// Indicator colors for PID, ramp, save to EEPROM and watchdog.
///
/// Every reported flag shows green whether it is set or not; the panel only
/// tells the operator that a status arrived.
pub fn indicator_colors(_status: &BoardStatus) -> [IndicatorColor; 4] {
    [IndicatorColor::Green; 4]
}

/// Publishes panel updates
#[derive(Clone)]
pub struct Dashboard {
    bus: Arc<EventBus>,
    angle_unit: AngleUnit,
}

impl Dashboard {
    /// Dashboard publishing on `bus`
    pub fn new(bus: Arc<EventBus>, angle_unit: AngleUnit) -> Self {
        Self { bus, angle_unit }
    }

    /// The underlying bus
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    fn dashboard(&self, event: DashboardEvent) {
        self.bus.publish(AppEvent::Dashboard(event));
    }

    /// Speed displays
    pub fn speeds(&self, speeds: &WheelSpeeds, config: Option<&RobotConfiguration>) {
        let (forward, rotation) = speed_readouts(speeds, config, self.angle_unit);
        tracing::trace!(
            "Speeds: fw {} rot {} {}",
            forward,
            rotation,
            self.angle_unit.rate_suffix()
        );
        self.dashboard(DashboardEvent::Speeds { forward, rotation });
    }

    /// Battery label and bar
    pub fn battery(&self, volts: f64, config: Option<&RobotConfiguration>) {
        self.dashboard(battery_display(volts, config));
    }

    /// Battery label and bar with no reading
    pub fn battery_unknown(&self) {
        self.dashboard(DashboardEvent::Battery {
            label: BATTERY_UNKNOWN_LABEL.to_string(),
            value_mv: 0,
            range_mv: (0, 0),
            percent: 0.0,
            color: ChargeColor::default(),
        });
    }

    /// Board status indicators
    pub fn board_status(&self, status: BoardStatus) {
        self.dashboard(DashboardEvent::BoardStatus {
            status,
            indicators: indicator_colors(&status),
        });
    }

    /// Status bar text
    pub fn status_text(&self, text: impl Into<String>) {
        self.dashboard(DashboardEvent::StatusText { text: text.into() });
    }

    /// Robot address field
    pub fn address_text(&self, text: impl Into<String>) {
        self.dashboard(DashboardEvent::AddressText { text: text.into() });
    }

    /// Button and menu enablement for the connection state
    pub fn controls(&self, connected: bool) {
        self.dashboard(DashboardEvent::Controls {
            connect_enabled: !connected,
            robot_actions_enabled: connected,
        });
    }

    /// Control mode toggle
    pub fn control_mode(&self, mode: ControlMode) {
        self.dashboard(DashboardEvent::ControlMode { mode });
    }

    /// A frame went to the renderer
    pub fn frame_shown(&self, sequence: u64) {
        self.dashboard(DashboardEvent::FrameShown { sequence });
    }

    /// Connection lifecycle
    pub fn connection(&self, event: ConnectionEvent) {
        self.bus.publish(AppEvent::Connection(event));
    }

    /// Modal message for the operator
    pub fn notify(&self, notification: Notification) {
        self.bus.publish(AppEvent::Notification(notification));
    }

    /// A persisted setting changed
    pub fn setting_changed(&self, key: &str, value: SettingValue) {
        self.bus.publish(AppEvent::Settings(SettingsEvent::Changed {
            key: key.to_string(),
            value,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robotele_core::drive::Wheel;

    fn config_with_wheel_base(wheel_base_mm: f64) -> RobotConfiguration {
        RobotConfiguration {
            wheel_base_mm,
            ..RobotConfiguration::default()
        }
    }

    #[test]
    fn test_placeholders_without_configuration() {
        let mut speeds = WheelSpeeds::default();
        speeds.set_both(0.5, 0.5);
        assert_eq!(
            speed_readouts(&speeds, None, AngleUnit::Degrees),
            (Readout::Placeholder, Readout::Placeholder)
        );
    }

    #[test]
    fn test_placeholders_until_both_wheels_report() {
        let config = config_with_wheel_base(500.0);
        let mut speeds = WheelSpeeds::default();
        speeds.set(Wheel::Left, 1.0);
        assert_eq!(
            speed_readouts(&speeds, Some(&config), AngleUnit::Degrees),
            (Readout::Placeholder, Readout::Placeholder)
        );
    }

    #[test]
    fn test_rotation_in_configured_unit() {
        let config = config_with_wheel_base(500.0);
        let mut speeds = WheelSpeeds::default();
        speeds.set_both(0.75, 0.25);

        let (forward, rotation) = speed_readouts(&speeds, Some(&config), AngleUnit::Radians);
        assert_eq!(forward, Readout::Value(0.875));
        assert_eq!(rotation, Readout::Value(1.0));

        let (_, rotation) = speed_readouts(&speeds, Some(&config), AngleUnit::Degrees);
        let degrees = rotation.value().unwrap();
        assert!((degrees - 57.29577951308232).abs() < 1e-9);
    }

    #[test]
    fn test_zero_wheel_base_suppresses_rotation() {
        let config = config_with_wheel_base(0.0);
        let mut speeds = WheelSpeeds::default();
        speeds.set_both(0.5, 0.1);

        let (forward, rotation) = speed_readouts(&speeds, Some(&config), AngleUnit::Degrees);
        assert!(!forward.is_placeholder());
        assert!(rotation.is_placeholder());
    }

    #[test]
    fn test_battery_label_format() {
        let config = RobotConfiguration::default();
        assert_eq!(battery_label(12.1, Some(&config)), "Battery: 12.10V/12.60V");
        assert_eq!(battery_label(9.5, None), "Battery:  9.50V/--.--V");
    }

    #[test]
    fn test_battery_display_at_zero_volts() {
        let config = RobotConfiguration::default();
        match battery_display(0.0, Some(&config)) {
            DashboardEvent::Battery {
                value_mv,
                range_mv,
                percent,
                color,
                ..
            } => {
                assert_eq!(value_mv, 0);
                assert_eq!(range_mv, (11_000, 12_600));
                assert_eq!(percent, 0.0);
                assert_eq!(color, ChargeColor::Red);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_battery_range_saturates() {
        let config = RobotConfiguration {
            min_charged_battery_mv: 11_000,
            max_charged_battery_mv: u32::MAX,
            ..RobotConfiguration::default()
        };
        match battery_display(12.0, Some(&config)) {
            DashboardEvent::Battery { range_mv, .. } => {
                assert_eq!(range_mv, (11_000, i32::MAX));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_battery_color_bands() {
        let config = RobotConfiguration {
            min_charged_battery_mv: 10_000,
            max_charged_battery_mv: 12_000,
            ..RobotConfiguration::default()
        };
        let color = |volts| match battery_display(volts, Some(&config)) {
            DashboardEvent::Battery { color, .. } => color,
            other => panic!("unexpected event {:?}", other),
        };
        assert_eq!(color(10.1), ChargeColor::Red);
        assert_eq!(color(10.4), ChargeColor::Orange);
        assert_eq!(color(11.5), ChargeColor::Green);
    }

    #[test]
    fn test_indicators_green_for_cleared_flags() {
        // Matches the shipped panel: a cleared flag is not shown differently.
        let status = BoardStatus::default();
        assert_eq!(indicator_colors(&status), [IndicatorColor::Green; 4]);
    }
}
