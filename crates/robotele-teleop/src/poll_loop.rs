//! Teleoperation poll loop
//!
//! One task owns every piece of teleoperation state and reacts to three
//! sources in a single `select!`:
//! - operator commands from [`TeleopHandle`]s
//! - telemetry from the controller and the webcam client
//! - the session timers
//!
//! Nothing the loop does blocks. Controller calls are fire-and-forget and
//! their results come back as telemetry tagged with the connection epoch;
//! anything tagged with another epoch is dropped. The connection handshake
//! is the one exception: it awaits its settle delays inline, so no tick or
//! telemetry is handled while it runs.

use crate::dashboard::{connected_text, Dashboard, NO_SERVER_TEXT, UNCONNECTED_TEXT};
use crate::editor::ConfigurationEditor;
use crate::handshake;
use crate::operator::{OperatorCommand, TeleopHandle};
use crate::session::{Applied, Session};
use crate::timers::{next_tick, PollPeriods, PollTimers, Tick};
use robotele_communication::{
    telemetry_channel, ControllerConnector, Envelope, Epoch, FrameRenderer, ServerDiscovery,
    TelemetryRouter, VideoConnector,
};
use robotele_core::drive::{ControlMode, JoystickSample, MotorCommand, WheelSpeeds};
use robotele_core::event_bus::{
    ConnectionEvent, DisconnectReason, EventBus, Notification, SettingValue,
};
use robotele_core::robot::BoardStatus;
use robotele_settings::SettingsStore;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Title of the notification shown when a controller cannot be opened
pub const CONNECTION_ERROR_TITLE: &str = "Connection error";

/// The robot-side collaborators of the loop
pub struct Collaborators {
    /// Opens controller handles
    pub controllers: Box<dyn ControllerConnector>,
    /// Opens the webcam client
    pub video: Box<dyn VideoConnector>,
    /// Finds robot servers
    pub discovery: Arc<dyn ServerDiscovery>,
    /// Draws video frames
    pub renderer: Box<dyn FrameRenderer>,
    /// Edits the robot configuration
    pub editor: Box<dyn ConfigurationEditor>,
}

/// The teleoperation actor
pub struct TeleopLoop {
    settings: SettingsStore,
    collaborators: Collaborators,
    dashboard: Dashboard,
    periods: PollPeriods,
    commands: mpsc::Receiver<OperatorCommand>,
    router: TelemetryRouter,
    telemetry: mpsc::UnboundedReceiver<Envelope>,
    epoch: Epoch,
    session: Option<Session>,
    joystick: JoystickSample,
}

impl TeleopLoop {
    /// Build a loop and the handle that drives it
    pub fn new(
        settings: SettingsStore,
        bus: Arc<EventBus>,
        collaborators: Collaborators,
    ) -> (Self, TeleopHandle) {
        let (handle, commands) = TeleopHandle::channel();
        let (router, telemetry) = telemetry_channel();
        let config = settings.config();
        let dashboard = Dashboard::new(bus, config.control.angle_unit);
        let periods = PollPeriods::from(&config.polling);

        let teleop = Self {
            settings,
            collaborators,
            dashboard,
            periods,
            commands,
            router,
            telemetry,
            epoch: Epoch::default(),
            session: None,
            joystick: JoystickSample::NEUTRAL,
        };
        (teleop, handle)
    }

    /// Run until shut down or every handle is dropped.
    ///
    /// Returns the settings store with everything the operator changed.
    pub async fn run(mut self) -> SettingsStore {
        tracing::info!("Teleoperation loop started");
        self.publish_unconnected();
        self.dashboard
            .address_text(self.settings.config().connection.robot_ip.clone());
        self.dashboard.control_mode(self.control_mode());

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("All teleoperation handles dropped");
                        self.disconnect(DisconnectReason::Shutdown);
                        break;
                    };
                    if self.handle_command(command).await.is_break() {
                        break;
                    }
                }

                Some(envelope) = self.telemetry.recv() => self.handle_telemetry(envelope),

                tick = next_tick(self.session.as_mut().map(|s| &mut s.timers)) => self.handle_tick(tick),
            }
        }

        tracing::info!("Teleoperation loop stopped");
        self.settings
    }

    fn control_mode(&self) -> ControlMode {
        self.settings.config().control_mode()
    }

    async fn handle_command(&mut self, command: OperatorCommand) -> ControlFlow<()> {
        match command {
            OperatorCommand::Connect { ip } => self.connect(ip).await,
            OperatorCommand::Disconnect => self.disconnect(DisconnectReason::UserRequested),
            OperatorCommand::FindServer { auto_connect } => self.find_server(auto_connect).await,
            OperatorCommand::Joystick { x, y } => {
                self.joystick = JoystickSample::from_axes(x, y);
                tracing::trace!("Joypad: ({}, {})", x, y);
            }
            OperatorCommand::SetPidEnabled(enabled) => self.set_pid_enabled(enabled),
            OperatorCommand::EditRobotConfiguration => self.edit_robot_configuration(),
            OperatorCommand::Shutdown => {
                self.disconnect(DisconnectReason::Shutdown);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn connect(&mut self, ip: String) {
        if self.session.is_some() {
            self.disconnect(DisconnectReason::Reconnecting);
        }

        self.epoch = self.epoch.next();
        let sender = self.router.sender(self.epoch);
        tracing::info!("Connecting to {} (epoch {})", ip, self.epoch);
        self.dashboard
            .connection(ConnectionEvent::Connecting { ip: ip.clone() });

        let mut target = self.settings.config().clone();
        target.connection.robot_ip = ip.clone();

        let opened = self
            .collaborators
            .controllers
            .open(&target.controller_endpoint(), sender.clone());
        let mut controller = match opened {
            Ok(controller) => controller,
            Err(e) => {
                tracing::error!("Failed to open controller at {}: {}", ip, e);
                let notification = Notification::error(CONNECTION_ERROR_TITLE, e.to_string());
                self.connect_failed(ip, e.to_string(), notification);
                return;
            }
        };

        match self.settings.set_connection(target.connection.clone()) {
            Ok(()) => self
                .dashboard
                .setting_changed("connection.robot_ip", SettingValue::String(ip.clone())),
            Err(e) => tracing::warn!("Failed to persist connection settings: {}", e),
        }

        if let Err(e) =
            handshake::perform(controller.as_mut(), self.control_mode(), self.periods.settle).await
        {
            tracing::error!("Handshake with {} failed: {}", ip, e);
            self.connect_failed(ip, e.to_string(), e.notification());
            return;
        }

        let video = if target.video.enabled {
            match self.collaborators.video.open(&target.video_endpoint(), sender) {
                Ok(video) => Some(video),
                Err(e) => {
                    tracing::warn!("Webcam unavailable on {}: {}", ip, e);
                    None
                }
            }
        } else {
            None
        };

        let session = Session::new(
            self.epoch,
            ip.clone(),
            controller,
            video,
            PollTimers::arm(&self.periods),
        );
        self.dashboard.speeds(session.speeds(), session.configuration());
        self.dashboard.battery_unknown();
        self.session = Some(session);

        tracing::info!("Connected to robot on {}", ip);
        self.dashboard.controls(true);
        self.dashboard.status_text(connected_text(&ip));
        self.dashboard.connection(ConnectionEvent::Connected { ip });
    }

    /// A connect attempt ended without a session; any session it replaced
    /// is already gone.
    fn connect_failed(&self, ip: String, error: String, notification: Notification) {
        self.dashboard.notify(notification);
        self.dashboard
            .connection(ConnectionEvent::ConnectionFailed { ip, error });
        self.publish_unconnected();
    }

    fn disconnect(&mut self, reason: DisconnectReason) {
        let Some(session) = self.session.take() else {
            tracing::debug!("Disconnect ({:?}) without a session", reason);
            return;
        };

        let ip = session.ip().to_string();
        drop(session);
        tracing::info!("Disconnected from {} ({:?})", ip, reason);

        // Readings die with the session.
        self.dashboard.speeds(&WheelSpeeds::default(), None);
        self.dashboard.battery_unknown();

        self.dashboard
            .connection(ConnectionEvent::Disconnected { ip, reason });
        if reason != DisconnectReason::Reconnecting {
            self.publish_unconnected();
        }
    }

    fn publish_unconnected(&self) {
        self.dashboard.status_text(UNCONNECTED_TEXT);
        self.dashboard.controls(false);
    }

    async fn find_server(&mut self, auto_connect: bool) {
        if self.session.is_some() {
            tracing::warn!("Find server ignored while connected");
            return;
        }

        let port = self.settings.config().connection.udp_status_port_send;
        let found = match self.collaborators.discovery.find_server(port).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };

        let Some(ip) = found.map(|ip| ip.to_string()) else {
            self.dashboard.address_text(NO_SERVER_TEXT);
            self.dashboard.connection(ConnectionEvent::ServerNotFound);
            return;
        };

        tracing::info!("Robot server found at {}", ip);
        self.dashboard.address_text(ip.clone());
        self.dashboard
            .connection(ConnectionEvent::ServerFound { ip: ip.clone() });

        if auto_connect {
            self.connect(ip).await;
        }
    }

    fn set_pid_enabled(&mut self, enabled: bool) {
        match self.settings.set_pid_enabled(enabled) {
            Ok(()) => self
                .dashboard
                .setting_changed("control.pid_enabled", SettingValue::Bool(enabled)),
            Err(e) => tracing::warn!("Failed to persist control mode: {}", e),
        }

        let mode = ControlMode::from_pid_enabled(enabled);
        tracing::info!("Control mode: {}", mode);
        self.dashboard.control_mode(mode);

        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.push_board_status(BoardStatus::for_pid(enabled)) {
                tracing::warn!("Failed to push board status: {}", e);
            }
        }
    }

    fn edit_robot_configuration(&mut self) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Robot configuration requested without a session");
            return;
        };
        if let Err(e) = session.request_configuration_edit() {
            tracing::warn!("Failed to request robot configuration: {}", e);
        }
    }

    fn handle_tick(&mut self, tick: Tick) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let config = self.settings.config();

        match tick {
            Tick::Command => {
                let command = MotorCommand::from_sample(
                    self.joystick,
                    config.control_mode(),
                    &config.drive_limits(),
                );
                tracing::trace!("Command tick: {:?}", command);
                if let Err(e) = session.send_command(command) {
                    tracing::warn!("Motor command failed: {}", e);
                }
            }
            Tick::FastUpdate => {
                if let Some(frame) = session.take_frame() {
                    self.collaborators.renderer.show(&frame);
                    self.dashboard.frame_shown(frame.sequence);
                }
                match session.request_speeds() {
                    Ok(true) => tracing::trace!("Speed query sent"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Speed query failed: {}", e),
                }
            }
            Tick::Status => {
                tracing::debug!("Status tick");
                if let Err(e) = session.request_battery() {
                    tracing::warn!("Battery query failed: {}", e);
                }
            }
        }
    }

    fn handle_telemetry(&mut self, envelope: Envelope) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Dropping telemetry without a session");
            return;
        };
        if envelope.epoch != session.epoch() {
            tracing::debug!(
                "Dropping telemetry from epoch {} (current {})",
                envelope.epoch,
                session.epoch()
            );
            return;
        }

        match session.apply(envelope.telemetry) {
            Applied::Speeds => {
                // Without a configuration every reading shows the placeholder.
                if session.configuration().is_none() || session.speeds().pair().is_some() {
                    self.dashboard
                        .speeds(session.speeds(), session.configuration());
                }
            }
            Applied::Configuration { open_editor } => {
                if open_editor {
                    if let Some(current) = session.configuration().cloned() {
                        if let Some(edited) = self.collaborators.editor.edit(&current) {
                            tracing::info!("Storing edited robot configuration");
                            if let Err(e) = session.store_configuration(edited) {
                                tracing::warn!("Failed to store robot configuration: {}", e);
                            }
                        }
                    }
                }
                self.dashboard
                    .speeds(session.speeds(), session.configuration());
                if let Some(volts) = session.battery_volts() {
                    self.dashboard.battery(volts, session.configuration());
                }
            }
            Applied::Battery => {
                if let Some(volts) = session.battery_volts() {
                    self.dashboard.battery(volts, session.configuration());
                }
            }
            Applied::BoardStatus(status) => self.dashboard.board_status(status),
            Applied::FrameFlagged => tracing::trace!("New frame"),
        }
    }
}
