use robotele::{
    init_logging, log_events, simulated_collaborators, EventBus, SettingsStore, TeleopHandle,
    TeleopLoop,
};
use std::sync::Arc;
use std::time::Duration;

/// Joypad sweep sent while the demo runs
const DEMO_INPUT_PERIOD: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("RoboTele {} (built {})", robotele::VERSION, robotele::BUILD_DATE);

    let settings = SettingsStore::open_default()?;
    tracing::info!("Settings: {}", settings.path().display());
    let config = settings.config().clone();

    let bus = Arc::new(EventBus::new());
    log_events(&bus);

    let (teleop, handle) = TeleopLoop::new(settings, bus, simulated_collaborators(&config));
    let task = tokio::spawn(teleop.run());

    // `robotele --find` looks for a server, `robotele <ip>` connects to it.
    match std::env::args().nth(1).as_deref() {
        Some("--find") => handle.find_server(true).await?,
        Some(ip) => handle.connect(ip).await?,
        None => handle.connect(config.connection.robot_ip.clone()).await?,
    }

    let input = tokio::spawn(drive_demo(handle.clone(), config.control.joypad_axis_scale));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    input.abort();
    handle.shutdown().await?;

    let settings = task.await?;
    tracing::info!("Settings saved to {}", settings.path().display());
    Ok(())
}

/// Drive a slow circle with the joypad
async fn drive_demo(handle: TeleopHandle, axis_scale: f64) {
    let mut ticker = tokio::time::interval(DEMO_INPUT_PERIOD);
    let mut phase: f64 = 0.0;
    loop {
        ticker.tick().await;
        phase += 0.05;
        let x = 0.2 * axis_scale * phase.sin();
        let y = 0.4 * axis_scale;
        if handle.joystick(x, y).is_err() {
            break;
        }
    }
}
