use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use swerve_kinematics::ChassisSpeeds;

#[derive(Clone)]
pub struct State {
    /// Last command received by the control loop.
    pub command: ChassisSpeeds,
    pub last_cmd_ts: Instant,
    /// Latched by the watchdog, cleared by the next command.
    pub estop: bool,
    pub faults: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        State {
            command: ChassisSpeeds::default(),
            last_cmd_ts: Instant::now(),
            estop: false,
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

/// Records a fresh command and releases a latched e-stop.
pub fn touch_cmd(bb: &Blackboard, command: ChassisSpeeds) {
    let mut g = bb.write();
    g.command = command;
    g.last_cmd_ts = Instant::now();
    g.estop = false;
}

/// Latches e-stop. Returns `true` if it was not already latched.
pub fn latch_estop(bb: &Blackboard) -> bool {
    let mut g = bb.write();
    !std::mem::replace(&mut g.estop, true)
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}
