//! Simulated robot
//!
//! A stand-in for the controller SDK and webcam server so the teleoperation
//! loop can be driven without hardware. Replies go through the same
//! telemetry channel a real controller would use.

use crate::controller::{ControllerConnector, ControllerEndpoint, ControllerResult, RobotController};
use crate::discovery::ServerDiscovery;
use crate::telemetry::{Telemetry, TelemetrySender};
use crate::video::{Frame, FrameSlot, VideoConnector, VideoEndpoint, VideoSource};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use robotele_core::drive::{Wheel, PWM_MAX};
use robotele_core::error::{ConnectionError, ControllerError};
use robotele_core::robot::{BoardStatus, RobotConfiguration};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Wheel speed reached at full PWM duty cycle, in m/s
const SIM_FULL_DUTY_SPEED: f64 = 2.0;

/// Battery drop per charge query, in volts
const SIM_DISCHARGE_STEP: f64 = 0.001;

/// In-process robot controller
#[derive(Debug)]
pub struct SimulatedRobot {
    telemetry: TelemetrySender,
    configuration: RobotConfiguration,
    board_status: BoardStatus,
    battery_volts: f64,
    speeds: (f64, f64),
}

impl SimulatedRobot {
    /// Create a robot replying through `telemetry`
    pub fn new(telemetry: TelemetrySender, configuration: RobotConfiguration) -> Self {
        let battery_volts = configuration.max_charged_volts();
        Self {
            telemetry,
            configuration,
            board_status: BoardStatus::default(),
            battery_volts,
            speeds: (0.0, 0.0),
        }
    }

    fn reply(&self, telemetry: Telemetry) -> ControllerResult<()> {
        if self.telemetry.send(telemetry) {
            Ok(())
        } else {
            Err(ControllerError::NotConnected)
        }
    }

    fn empty_volts(&self) -> f64 {
        self.configuration.min_charged_battery_mv as f64 / 1000.0
    }
}

impl RobotController for SimulatedRobot {
    fn set_motor_speeds(&mut self, left: f64, right: f64) -> ControllerResult<()> {
        self.speeds = (left, right);
        self.reply(Telemetry::MotorSpeeds { left, right })
    }

    fn set_motor_pwm(&mut self, wheel: Wheel, duty: i32) -> ControllerResult<()> {
        let speed = duty.clamp(-PWM_MAX, PWM_MAX) as f64 / PWM_MAX as f64 * SIM_FULL_DUTY_SPEED;
        match wheel {
            Wheel::Left => self.speeds.0 = speed,
            Wheel::Right => self.speeds.1 = speed,
        }
        Ok(())
    }

    fn get_motor_speeds(&mut self) -> ControllerResult<()> {
        let (left, right) = self.speeds;
        self.reply(Telemetry::MotorSpeed {
            wheel: Wheel::Left,
            speed: left,
        })?;
        self.reply(Telemetry::MotorSpeed {
            wheel: Wheel::Right,
            speed: right,
        })
    }

    fn get_battery_charge_value(&mut self) -> ControllerResult<()> {
        self.battery_volts = (self.battery_volts - SIM_DISCHARGE_STEP).max(self.empty_volts());
        self.reply(Telemetry::BatteryVoltage(self.battery_volts))
    }

    fn set_board_status(&mut self, status: BoardStatus) -> ControllerResult<()> {
        tracing::debug!("Simulated board status: {:?}", status);
        self.board_status = status;
        Ok(())
    }

    fn get_board_status(&mut self) -> ControllerResult<()> {
        self.reply(Telemetry::BoardStatus(self.board_status))
    }

    fn get_robot_configuration_from_eeprom(&mut self) -> ControllerResult<()> {
        self.reply(Telemetry::RobotConfiguration(self.configuration.clone()))
    }

    fn set_robot_configuration(&mut self, config: &RobotConfiguration) -> ControllerResult<()> {
        self.configuration = config.clone();
        Ok(())
    }

    fn save_robot_configuration_to_eeprom(&mut self) -> ControllerResult<()> {
        tracing::info!("Simulated EEPROM write");
        Ok(())
    }
}

/// Opens [`SimulatedRobot`]s
#[derive(Debug, Clone, Default)]
pub struct SimulatedConnector {
    configuration: RobotConfiguration,
}

impl SimulatedConnector {
    /// Connector whose robots report `configuration`
    pub fn new(configuration: RobotConfiguration) -> Self {
        Self { configuration }
    }
}

impl ControllerConnector for SimulatedConnector {
    fn open(
        &mut self,
        endpoint: &ControllerEndpoint,
        telemetry: TelemetrySender,
    ) -> Result<Box<dyn RobotController>, ConnectionError> {
        if endpoint.ip.trim().is_empty() {
            return Err(ConnectionError::InvalidAddress {
                address: endpoint.ip.clone(),
            });
        }
        tracing::info!(
            "Simulated robot at {}:{} ({})",
            endpoint.ip,
            endpoint.tcp_port,
            telemetry.epoch()
        );
        Ok(Box::new(SimulatedRobot::new(
            telemetry,
            self.configuration.clone(),
        )))
    }
}

/// Webcam server producing a moving test pattern
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    frame_interval: Duration,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frame_interval: Duration::from_millis(100),
        }
    }
}

impl SimulatedCamera {
    /// Camera with the given frame size and rate
    pub fn new(width: u32, height: u32, frame_interval: Duration) -> Self {
        Self {
            width,
            height,
            frame_interval,
        }
    }

    fn pattern(width: u32, height: u32, sequence: u64) -> RgbImage {
        let shift = (sequence % 256) as u32;
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x + shift) % 256) as u8,
                ((y + shift) % 256) as u8,
                (shift * 4 % 256) as u8,
            ])
        })
    }
}

impl VideoConnector for SimulatedCamera {
    fn open(
        &mut self,
        endpoint: &VideoEndpoint,
        telemetry: TelemetrySender,
    ) -> Result<Box<dyn VideoSource>, ConnectionError> {
        let slot = FrameSlot::new();
        let stop = Arc::new(AtomicBool::new(false));

        let producer_slot = slot.clone();
        let producer_stop = stop.clone();
        let (width, height, interval) = (self.width, self.height, self.frame_interval);

        let worker = std::thread::Builder::new()
            .name("sim-camera".into())
            .spawn(move || {
                let mut sequence = 0u64;
                while !producer_stop.load(Ordering::Relaxed) {
                    sequence += 1;
                    let frame = Frame::new(sequence, Self::pattern(width, height, sequence));
                    if !producer_slot.publish(frame, &telemetry) {
                        break;
                    }
                    std::thread::sleep(interval);
                }
            })
            .map_err(|e| ConnectionError::Video {
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Simulated webcam streaming from {}:{}",
            endpoint.ip,
            endpoint.stream_port
        );

        Ok(Box::new(SimulatedStream {
            slot,
            stop,
            worker: Some(worker),
        }))
    }
}

/// Running simulated stream, stopped on drop
struct SimulatedStream {
    slot: FrameSlot,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl VideoSource for SimulatedStream {
    fn last_frame(&mut self) -> Option<Frame> {
        self.slot.take()
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Discovery that always reports the same answer
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDiscovery(pub Option<IpAddr>);

#[async_trait]
impl ServerDiscovery for StaticDiscovery {
    async fn find_server(&self, _port: u16) -> Result<Option<IpAddr>, ConnectionError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{telemetry_channel, Epoch};

    fn endpoint(ip: &str) -> ControllerEndpoint {
        ControllerEndpoint {
            ip: ip.to_string(),
            tcp_port: 14500,
            udp_control_port: 14560,
            udp_status_port_send: 14550,
            udp_status_port_listen: 14555,
        }
    }

    #[test]
    fn test_rejects_empty_address() {
        let (router, _rx) = telemetry_channel();
        let mut connector = SimulatedConnector::default();
        let result = connector.open(&endpoint("  "), router.sender(Epoch::default()));
        assert!(matches!(result, Err(ConnectionError::InvalidAddress { .. })));
    }

    #[test]
    fn test_pwm_moves_wheels() {
        let (router, mut rx) = telemetry_channel();
        let mut robot =
            SimulatedRobot::new(router.sender(Epoch::default()), RobotConfiguration::default());

        robot.set_motor_pwm(Wheel::Left, PWM_MAX).unwrap();
        robot.set_motor_pwm(Wheel::Right, -PWM_MAX).unwrap();
        robot.get_motor_speeds().unwrap();

        assert_eq!(
            rx.try_recv().unwrap().telemetry,
            Telemetry::MotorSpeed {
                wheel: Wheel::Left,
                speed: SIM_FULL_DUTY_SPEED
            }
        );
        assert_eq!(
            rx.try_recv().unwrap().telemetry,
            Telemetry::MotorSpeed {
                wheel: Wheel::Right,
                speed: -SIM_FULL_DUTY_SPEED
            }
        );
    }

    #[test]
    fn test_battery_discharges_to_floor() {
        let (router, mut rx) = telemetry_channel();
        let config = RobotConfiguration {
            min_charged_battery_mv: 12_599,
            max_charged_battery_mv: 12_600,
            ..RobotConfiguration::default()
        };
        let mut robot = SimulatedRobot::new(router.sender(Epoch::default()), config);

        for _ in 0..5 {
            robot.get_battery_charge_value().unwrap();
        }
        let mut last = 0.0;
        while let Ok(envelope) = rx.try_recv() {
            if let Telemetry::BatteryVoltage(v) = envelope.telemetry {
                last = v;
            }
        }
        assert!((last - 12.599).abs() < 1e-9);
    }

    #[test]
    fn test_reply_fails_when_loop_gone() {
        let (router, rx) = telemetry_channel();
        let mut robot =
            SimulatedRobot::new(router.sender(Epoch::default()), RobotConfiguration::default());
        drop(rx);
        assert_eq!(robot.get_board_status(), Err(ControllerError::NotConnected));
    }
}
