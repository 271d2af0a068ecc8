use macroquad::prelude::*;
use std::sync::Arc;
use swerve_kinematics::{Module, ModuleState, SwerveDrive, MODULE_COUNT};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::blackboard::{Blackboard, snapshot};
use crate::bus;

// Function to configure the macroquad window
pub fn window_conf() -> Conf {
    Conf {
        window_title: "Swerve Drive Visualization".to_string(),
        window_width: 800,
        window_height: 600,
        high_dpi: true,
        ..Default::default()
    }
}

const VIS_SCALE: f32 = 400.0; // pixels per meter of module offset
const ARROW_SCALE: f32 = 60.0; // pixels per m/s of module speed

/// Robot frame (x forward, y left) to screen, robot x pointing up the screen.
fn to_screen(center: Vec2, x: f64, y: f64) -> Vec2 {
    Vec2::new(center.x - y as f32 * VIS_SCALE, center.y - x as f32 * VIS_SCALE)
}

fn draw_module(origin: Vec2, state: &ModuleState) {
    let angle = state.angle as f32;
    let length = state.speed as f32 * ARROW_SCALE;
    let tip = origin + Vec2::new(-angle.sin(), -angle.cos()) * length;

    draw_circle(origin.x, origin.y, 6.0, DARKGRAY);
    draw_line(origin.x, origin.y, tip.x, tip.y, 3.0, DARKBLUE);
    if length > 1.0 {
        let back = (origin - tip).normalize() * 10.0;
        let left = Vec2::new(back.x * 0.866 - back.y * 0.5, back.x * 0.5 + back.y * 0.866);
        let right = Vec2::new(back.x * 0.866 + back.y * 0.5, -back.x * 0.5 + back.y * 0.866);
        draw_triangle(tip, tip + left, tip + right, DARKBLUE);
    }
}

pub async fn run_visualization_loop(
    kinematics: Arc<SwerveDrive>,
    bb: Blackboard,
    mut state_rx: broadcast::Receiver<Arc<[ModuleState; MODULE_COUNT]>>,
) {
    let mut states = [ModuleState::default(); MODULE_COUNT];

    info!("Visualization loop starting inside graphics module...");

    loop {
        match bus::latest(&mut state_rx) {
            Ok(Some(latest)) => states = latest,
            Ok(None) => {
                // No new states, keep drawing the last ones
            }
            Err(_) => {
                error!("Module state channel closed. Exiting visualization loop.");
                break;
            }
        }

        clear_background(LIGHTGRAY);
        let center = Vec2::new(screen_width() / 2.0, screen_height() / 2.0);

        // Footprint: FL - FR - BR - BL
        let corners = [Module::FrontLeft, Module::FrontRight, Module::BackRight, Module::BackLeft]
            .map(|m| {
                let g = kinematics.module_geometry(m);
                to_screen(center, g.rx, g.ry)
            });
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            draw_line(a.x, a.y, b.x, b.y, 2.0, GRAY);
        }
        draw_circle(center.x, center.y, 4.0, RED);

        for module in Module::ALL {
            let g = kinematics.module_geometry(module);
            draw_module(to_screen(center, g.rx, g.ry), &states[module.index()]);
        }

        let state = snapshot(&bb);
        draw_text(&format!("Command: {}", state.command), 10.0, 20.0, 20.0, BLACK);
        for (i, module) in Module::ALL.iter().enumerate() {
            draw_text(
                &format!("{}: {}", module, states[module.index()]),
                10.0,
                45.0 + 20.0 * i as f32,
                20.0,
                BLACK,
            );
        }
        if state.estop {
            draw_text("E-STOP", 10.0, screen_height() - 40.0, 30.0, RED);
        }
        if !state.faults.is_empty() {
            draw_text(
                &format!("Faults: {}", state.faults.join(", ")),
                10.0,
                screen_height() - 15.0,
                20.0,
                MAROON,
            );
        }

        next_frame().await
    }
}
