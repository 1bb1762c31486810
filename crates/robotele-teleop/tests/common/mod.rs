//! Recording collaborators for poll loop tests

#![allow(dead_code)]

use image::RgbImage;
use parking_lot::Mutex;
use robotele_communication::{
    ControllerConnector, ControllerEndpoint, ControllerResult, Frame, FrameRenderer, FrameSlot,
    RobotController, StaticDiscovery, Telemetry, TelemetrySender, VideoConnector, VideoEndpoint,
    VideoSource,
};
use robotele_core::drive::Wheel;
use robotele_core::error::{ConnectionError, ControllerError};
use robotele_core::event_bus::{AppEvent, DashboardEvent, EventBus, EventFilter};
use robotele_core::robot::{BoardStatus, RobotConfiguration};
use robotele_settings::SettingsStore;
use robotele_teleop::{Collaborators, ConfigurationEditor, TeleopHandle, TeleopLoop};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const ROBOT_IP: &str = "10.0.0.5";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetSpeeds(f64, f64),
    SetPwm(Wheel, i32),
    GetSpeeds,
    GetBattery,
    SetStatus(BoardStatus),
    GetStatus,
    GetConfig,
    SetConfig(RobotConfiguration),
    SaveConfig,
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Call::SetSpeeds(..) => "set_motor_speeds",
            Call::SetPwm(..) => "set_motor_pwm",
            Call::GetSpeeds => "get_motor_speeds",
            Call::GetBattery => "get_battery_charge_value",
            Call::SetStatus(_) => "set_board_status",
            Call::GetStatus => "get_board_status",
            Call::GetConfig => "get_robot_configuration_from_eeprom",
            Call::SetConfig(_) => "set_robot_configuration",
            Call::SaveConfig => "save_robot_configuration_to_eeprom",
        }
    }
}

/// Shared view of everything the mock controllers saw
#[derive(Clone)]
pub struct RobotRecorder {
    start: Instant,
    calls: Arc<Mutex<Vec<(Call, u128)>>>,
    failing: Arc<Mutex<Vec<&'static str>>>,
    senders: Arc<Mutex<Vec<TelemetrySender>>>,
}

impl RobotRecorder {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            calls: Arc::default(),
            failing: Arc::default(),
            senders: Arc::default(),
        }
    }

    /// Calls in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Calls with their time since the harness started, in ms
    pub fn timed_calls(&self) -> Vec<(Call, u128)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|(c, _)| c.name() == name).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Make every call to `name` fail
    pub fn fail(&self, name: &'static str) {
        self.failing.lock().push(name);
    }

    /// Telemetry sender of the latest connection
    pub fn sender(&self) -> TelemetrySender {
        self.senders
            .lock()
            .last()
            .cloned()
            .expect("no controller opened")
    }

    /// Send telemetry as the latest controller
    pub fn reply(&self, telemetry: Telemetry) {
        assert!(self.sender().send(telemetry));
    }

    fn record(&self, call: Call) -> ControllerResult<()> {
        let name = call.name();
        self.calls.lock().push((call, self.start.elapsed().as_millis()));
        if self.failing.lock().contains(&name) {
            Err(ControllerError::communication(format!("{} timed out", name)))
        } else {
            Ok(())
        }
    }
}

struct MockController {
    recorder: RobotRecorder,
}

impl RobotController for MockController {
    fn set_motor_speeds(&mut self, left: f64, right: f64) -> ControllerResult<()> {
        self.recorder.record(Call::SetSpeeds(left, right))
    }
    fn set_motor_pwm(&mut self, wheel: Wheel, duty: i32) -> ControllerResult<()> {
        self.recorder.record(Call::SetPwm(wheel, duty))
    }
    fn get_motor_speeds(&mut self) -> ControllerResult<()> {
        self.recorder.record(Call::GetSpeeds)
    }
    fn get_battery_charge_value(&mut self) -> ControllerResult<()> {
        self.recorder.record(Call::GetBattery)
    }
    fn set_board_status(&mut self, status: BoardStatus) -> ControllerResult<()> {
        self.recorder.record(Call::SetStatus(status))
    }
    fn get_board_status(&mut self) -> ControllerResult<()> {
        self.recorder.record(Call::GetStatus)
    }
    fn get_robot_configuration_from_eeprom(&mut self) -> ControllerResult<()> {
        self.recorder.record(Call::GetConfig)
    }
    fn set_robot_configuration(&mut self, config: &RobotConfiguration) -> ControllerResult<()> {
        self.recorder.record(Call::SetConfig(config.clone()))
    }
    fn save_robot_configuration_to_eeprom(&mut self) -> ControllerResult<()> {
        self.recorder.record(Call::SaveConfig)
    }
}

struct MockConnector {
    recorder: RobotRecorder,
}

impl ControllerConnector for MockConnector {
    fn open(
        &mut self,
        endpoint: &ControllerEndpoint,
        telemetry: TelemetrySender,
    ) -> Result<Box<dyn RobotController>, ConnectionError> {
        if endpoint.ip == "unreachable" {
            return Err(ConnectionError::FailedToOpen {
                address: endpoint.ip.clone(),
                reason: "host unreachable".to_string(),
            });
        }
        self.recorder.senders.lock().push(telemetry);
        Ok(Box::new(MockController {
            recorder: self.recorder.clone(),
        }))
    }
}

/// The webcam side: frames published here reach the loop
#[derive(Clone, Default)]
pub struct CameraRecorder {
    slot: FrameSlot,
    sender: Arc<Mutex<Option<TelemetrySender>>>,
    pub endpoints: Arc<Mutex<Vec<VideoEndpoint>>>,
}

impl CameraRecorder {
    pub fn publish(&self, sequence: u64) {
        let sender = self.sender.lock().clone().expect("webcam not opened");
        self.slot
            .publish(Frame::new(sequence, RgbImage::new(4, 4)), &sender);
    }
}

struct MockCamera {
    recorder: CameraRecorder,
}

impl VideoConnector for MockCamera {
    fn open(
        &mut self,
        endpoint: &VideoEndpoint,
        telemetry: TelemetrySender,
    ) -> Result<Box<dyn VideoSource>, ConnectionError> {
        self.recorder.endpoints.lock().push(endpoint.clone());
        *self.recorder.sender.lock() = Some(telemetry);
        Ok(Box::new(self.recorder.slot.clone()))
    }
}

struct RecordingRenderer {
    shown: Arc<Mutex<Vec<u64>>>,
}

impl FrameRenderer for RecordingRenderer {
    fn show(&mut self, frame: &Frame) {
        self.shown.lock().push(frame.sequence);
    }
}

struct ScriptedEditor {
    reply: Option<RobotConfiguration>,
    seen: Arc<Mutex<Vec<RobotConfiguration>>>,
}

impl ConfigurationEditor for ScriptedEditor {
    fn edit(&mut self, current: &RobotConfiguration) -> Option<RobotConfiguration> {
        self.seen.lock().push(current.clone());
        self.reply.clone()
    }
}

/// Options for a harness
#[derive(Default)]
pub struct HarnessOptions {
    pub discovery: Option<IpAddr>,
    pub editor_reply: Option<RobotConfiguration>,
}

/// A running poll loop wired to recording collaborators
pub struct Harness {
    pub handle: TeleopHandle,
    pub robot: RobotRecorder,
    pub camera: CameraRecorder,
    pub shown: Arc<Mutex<Vec<u64>>>,
    pub edited: Arc<Mutex<Vec<RobotConfiguration>>>,
    pub events: Arc<Mutex<Vec<AppEvent>>>,
    pub settings_path: PathBuf,
    pub task: JoinHandle<SettingsStore>,
    _dir: TempDir,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_options(options: HarnessOptions) -> Self {
        let dir = TempDir::new().unwrap();
        let settings_path = dir.path().join("settings.toml");
        let store = SettingsStore::open(&settings_path).unwrap();

        let bus = Arc::new(EventBus::new());
        let events: Arc<Mutex<Vec<AppEvent>>> = Arc::default();
        let sink = events.clone();
        bus.subscribe(EventFilter::All, move |event| sink.lock().push(event));

        let robot = RobotRecorder::new();
        let camera = CameraRecorder::default();
        let shown: Arc<Mutex<Vec<u64>>> = Arc::default();
        let edited: Arc<Mutex<Vec<RobotConfiguration>>> = Arc::default();

        let collaborators = Collaborators {
            controllers: Box::new(MockConnector {
                recorder: robot.clone(),
            }),
            video: Box::new(MockCamera {
                recorder: camera.clone(),
            }),
            discovery: Arc::new(StaticDiscovery(options.discovery)),
            renderer: Box::new(RecordingRenderer {
                shown: shown.clone(),
            }),
            editor: Box::new(ScriptedEditor {
                reply: options.editor_reply,
                seen: edited.clone(),
            }),
        };

        let (teleop, handle) = TeleopLoop::new(store, bus, collaborators);
        let task = tokio::spawn(teleop.run());

        Self {
            handle,
            robot,
            camera,
            shown,
            edited,
            events,
            settings_path,
            task,
            _dir: dir,
        }
    }

    /// Connect and wait until the handshake is over
    pub async fn connect(&self) {
        self.handle.connect(ROBOT_IP).await.unwrap();
        advance(Duration::from_millis(510)).await;
    }

    pub fn dashboard(&self) -> Vec<DashboardEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                AppEvent::Dashboard(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub async fn shutdown(self) -> SettingsStore {
        self.handle.shutdown().await.unwrap();
        self.task.await.unwrap()
    }
}

/// Let paused time move forward and the loop catch up
pub async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
    tokio::task::yield_now().await;
}
