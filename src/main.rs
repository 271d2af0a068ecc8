mod blackboard;   // shared runtime state
mod bus;          // broadcast topics
mod command;      // scripted upstream command source
mod control;      // control loop and module actuators
mod graphics;     // macroquad visualization
mod settings;     // configuration loading

use blackboard::{Blackboard, latch_estop, raise_fault, snapshot};
use bus::Topic;
use control::{DriveController, SimActuator};
use graphics::window_conf;
use settings::Settings;

use std::{sync::Arc, time::{Duration, Instant}};
use swerve_kinematics::{ChassisSpeeds, ModuleState, SwerveDrive, MODULE_COUNT};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Swerve Drive (Macroquad Frontend) Started. Loading configuration...");

    let settings = match load_startup_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            std::process::exit(1);
        }
    };

    let kinematics = Arc::new(settings.geometry.kinematics());
    info!(%kinematics, "Swerve kinematics constructed");

    let tokio_rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let bb: Blackboard = Arc::default();
    let state_topic: Topic<[ModuleState; MODULE_COUNT]> = Topic::new(16);
    let state_rx_for_vis = state_topic.subscribe();

    tokio_rt.spawn({
        let bb = Arc::clone(&bb);
        let kinematics = Arc::clone(&kinematics);
        async move {
            info!("Drive tasks starting.");
            match run(settings, kinematics, bb, state_topic).await {
                Ok(_) => info!("Drive tasks finished successfully."),
                Err(e) => error!("Drive tasks failed: {:?}. Modules are no longer commanded.", e),
            }
        }
    });

    graphics::run_visualization_loop(kinematics, bb, state_rx_for_vis).await;
}

fn load_startup_settings() -> anyhow::Result<Settings> {
    let path = settings::config_path();
    let settings = settings::load_settings(&path)?;
    settings.validate()?;
    Ok(settings)
}

async fn run(
    settings: Settings,
    kinematics: Arc<SwerveDrive>,
    bb: Blackboard,
    state_topic: Topic<[ModuleState; MODULE_COUNT]>,
) -> anyhow::Result<()> {
    let period = settings.drive.period();
    let cmd_topic: Topic<ChassisSpeeds> = Topic::new(4);

    info!("Spawning control thread...");
    std::thread::Builder::new()
        .name("control".into())
        .spawn({
            let bb = Arc::clone(&bb);
            let cmd_rx = cmd_topic.subscribe();
            let controller = DriveController::new(kinematics, SimActuator::default());
            move || control::run_control_loop(controller, bb, cmd_rx, state_topic, period)
        })?;

    info!("Starting async tasks (command source, watchdog)...");
    let script = command::CommandScript::new(settings.commands);
    tokio::try_join!(
        command::command_task(script, period, cmd_topic),
        watchdog(bb, settings.drive.cmd_timeout()),
    )?;
    info!("Async tasks finished.");
    Ok(())
}

async fn watchdog(bb: Blackboard, timeout: Duration) -> anyhow::Result<()> {
    info!(?timeout, "Watchdog task started.");
    let mut tick = tokio::time::interval(Duration::from_millis(25));
    loop {
        tick.tick().await;
        let last_cmd_ts = snapshot(&bb).last_cmd_ts;
        let age = Instant::now() - last_cmd_ts;
        if age > timeout && latch_estop(&bb) {
            warn!(?age, last_cmd_ts = ?last_cmd_ts, "Command velocity timeout! Triggering E-stop.");
            raise_fault(&bb, "cmd timeout");
        }
    }
}
