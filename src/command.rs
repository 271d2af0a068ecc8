use std::time::Duration;

use swerve_kinematics::ChassisSpeeds;
use tokio::time;
use tracing;

use crate::bus::Topic;
use crate::settings::CommandStep;

/// Plays a list of timed command steps in a loop.
#[derive(Debug, Clone)]
pub struct CommandScript {
    steps: Vec<CommandStep>,
    index: usize,
    elapsed: Duration,
}

impl CommandScript {
    pub fn new(steps: Vec<CommandStep>) -> Self {
        Self {
            steps,
            index: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Index of the step currently playing.
    pub fn current_step(&self) -> usize {
        self.index
    }

    /// Returns the command for the next tick, then advances the script by `dt`.
    ///
    /// An empty script commands zero velocity.
    pub fn advance(&mut self, dt: Duration) -> ChassisSpeeds {
        let Some(step) = self.steps.get(self.index) else {
            return ChassisSpeeds::default();
        };
        let speeds = step.speeds();

        self.elapsed += dt;
        if self.elapsed >= step.duration() {
            self.elapsed = Duration::ZERO;
            self.index = (self.index + 1) % self.steps.len();
            tracing::info!(step = self.index, "Advancing to next command step");
        }
        speeds
    }
}

/// Upstream command source: publishes the scripted command once per control period.
pub async fn command_task(
    mut script: CommandScript,
    period: Duration,
    cmd_tx: Topic<ChassisSpeeds>,
) -> anyhow::Result<()> {
    tracing::info!(?period, "Command task started.");
    let mut ticker = time::interval(period);

    loop {
        ticker.tick().await;
        let speeds = script.advance(period);
        tracing::debug!(
            vx = speeds.vx,
            vy = speeds.vy,
            omega = speeds.omega,
            step = script.current_step(),
            "Publishing command"
        );
        cmd_tx.publish(speeds);
    }
}
