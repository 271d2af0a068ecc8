use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use spin_sleep::SpinSleeper;
use swerve_kinematics::{ChassisSpeeds, Module, ModuleState, SwerveDrive, MODULE_COUNT};
use tokio::sync::broadcast;
use tracing::{error, info, trace, warn};

use crate::blackboard::{self, Blackboard};
use crate::bus::{self, Topic};

/// Downstream interface to the drive and steering motors of each module.
pub trait ModuleActuator {
    type Error: fmt::Display;

    /// Command one module to the given speed and steering angle.
    fn apply(&mut self, module: Module, state: ModuleState) -> Result<(), Self::Error>;

    /// Stop every drive motor, leaving steering where it is.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// Actuator for simulation: remembers the last state applied to each module.
#[derive(Debug, Default)]
pub struct SimActuator {
    applied: [ModuleState; MODULE_COUNT],
}

impl ModuleActuator for SimActuator {
    type Error = Infallible;

    fn apply(&mut self, module: Module, state: ModuleState) -> Result<(), Self::Error> {
        trace!(%module, speed = state.speed, angle = state.angle, "Applying module state");
        self.applied[module.index()] = state;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        for state in self.applied.iter_mut() {
            state.speed = 0.0;
        }
        Ok(())
    }
}

/// Runs the kinematics for one command and pushes the result to the actuator.
pub struct DriveController<A> {
    kinematics: Arc<SwerveDrive>,
    actuator: A,
    /// States last applied, or last stopped.
    last: [ModuleState; MODULE_COUNT],
}

impl<A: ModuleActuator> DriveController<A> {
    pub fn new(kinematics: Arc<SwerveDrive>, actuator: A) -> Self {
        Self {
            kinematics,
            actuator,
            last: [ModuleState::default(); MODULE_COUNT],
        }
    }

    /// Converts `speeds` into module states and applies them in module order.
    pub fn step(
        &mut self,
        speeds: ChassisSpeeds,
    ) -> Result<[ModuleState; MODULE_COUNT], A::Error> {
        let states = self.kinematics.transform_speeds(speeds);
        for (module, state) in Module::ALL.into_iter().zip(states) {
            self.actuator.apply(module, state)?;
        }
        self.last = states;
        Ok(states)
    }

    /// Stops the actuator and returns the resulting states: zero speed, steering held.
    pub fn stop(&mut self) -> Result<[ModuleState; MODULE_COUNT], A::Error> {
        self.actuator.stop()?;
        for state in self.last.iter_mut() {
            state.speed = 0.0;
        }
        Ok(self.last)
    }
}

/// Fixed-rate control loop. Runs on a dedicated thread until the command
/// topic closes.
pub fn run_control_loop<A: ModuleActuator>(
    mut controller: DriveController<A>,
    bb: Blackboard,
    mut cmd_rx: broadcast::Receiver<Arc<ChassisSpeeds>>,
    state_tx: Topic<[ModuleState; MODULE_COUNT]>,
    period: Duration,
) {
    info!(?period, "Control loop started.");
    let sleeper = SpinSleeper::new(1_000);
    let mut command = ChassisSpeeds::default();
    let mut stopped = false;

    loop {
        match bus::latest(&mut cmd_rx) {
            Ok(Some(speeds)) => {
                command = speeds;
                blackboard::touch_cmd(&bb, command);
            }
            Ok(None) => {}
            Err(_) => {
                warn!("Command topic closed. Stopping control loop.");
                if let Err(e) = controller.stop() {
                    error!("Failed to stop modules: {}", e);
                }
                return;
            }
        }

        if blackboard::snapshot(&bb).estop {
            if !stopped {
                warn!("E-stop latched, stopping modules.");
                match controller.stop() {
                    Ok(states) => state_tx.publish(states),
                    Err(e) => {
                        error!("Failed to stop modules: {}", e);
                        blackboard::raise_fault(&bb, "actuator stop failed");
                    }
                }
                stopped = true;
            }
        } else {
            stopped = false;
            match controller.step(command) {
                Ok(states) => state_tx.publish(states),
                Err(e) => {
                    error!("Failed to apply module states: {}", e);
                    blackboard::raise_fault(&bb, "actuator apply failed");
                }
            }
        }

        sleeper.sleep(period);
    }
}
