#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for four-module swerve drive inverse kinematics."]
#![doc = ""]
#![doc = "This crate maps a robot-frame velocity command `(vx, vy, ω)` to a speed and"]
#![doc = "steering angle for each of the four independently steered swerve modules."]

use core::f64::consts::PI;
use core::fmt;
use libm::{atan2, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of swerve modules on the drivetrain.
pub const MODULE_COUNT: usize = 4;

/// Identifies one of the four swerve modules.
///
/// The discriminant is the module's position in every array this crate takes
/// or returns.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Front-left module (index 0).
    FrontLeft = 0,
    /// Front-right module (index 1).
    FrontRight = 1,
    /// Back-left module (index 2).
    BackLeft = 2,
    /// Back-right module (index 3).
    BackRight = 3,
}

impl Module {
    /// All modules in array order.
    pub const ALL: [Module; MODULE_COUNT] = [
        Module::FrontLeft,
        Module::FrontRight,
        Module::BackLeft,
        Module::BackRight,
    ];

    /// Position of this module in geometry and state arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short label, e.g. `"FL"`.
    pub const fn label(self) -> &'static str {
        match self {
            Module::FrontLeft => "FL",
            Module::FrontRight => "FR",
            Module::BackLeft => "BL",
            Module::BackRight => "BR",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed displacement of a module's wheel contact point from the robot's
/// center of rotation, in the robot frame.
///
/// No validation is performed; coincident or zero offsets are accepted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModuleGeometry {
    /// Robot-frame x offset (m).
    pub rx: f64,
    /// Robot-frame y offset (m).
    pub ry: f64,
}

impl ModuleGeometry {
    /// Construct a new module geometry.
    ///
    /// # Arguments
    ///
    /// * `rx`: x offset from the center of rotation in meters.
    /// * `ry`: y offset from the center of rotation in meters.
    pub const fn new(rx: f64, ry: f64) -> Self {
        ModuleGeometry { rx, ry }
    }
}

impl fmt::Display for ModuleGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}) m", self.rx, self.ry)
    }
}

/// Robot-frame velocity command.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Linear x velocity (m/s).
    pub vx: f64,
    /// Linear y velocity (m/s).
    pub vy: f64,
    /// Angular velocity about the center of rotation (rad/s), counter-clockwise positive.
    pub omega: f64,
}

impl ChassisSpeeds {
    /// Construct chassis speeds.
    ///
    /// # Arguments
    ///
    /// * `vx`: Linear velocity along the robot's x-axis (m/s).
    /// * `vy`: Linear velocity along the robot's y-axis (m/s).
    /// * `omega`: Angular velocity (rad/s).
    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        ChassisSpeeds { vx, vy, omega }
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(vx: {:.2} m/s, vy: {:.2} m/s, ω: {:.2} rad/s)",
            self.vx, self.vy, self.omega
        )
    }
}

/// Planar velocity of a single module's contact point, before the polar
/// conversion.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModuleVelocity {
    /// x component (m/s).
    pub x: f64,
    /// y component (m/s).
    pub y: f64,
}

impl ModuleVelocity {
    /// Construct a module velocity from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        ModuleVelocity { x, y }
    }

    /// Converts the velocity vector into a `(speed, angle)` pair.
    ///
    /// `speed` is the Euclidean norm and `angle` is `atan2(y, x)`. A zero
    /// vector yields angle 0 by the usual `atan2` convention.
    pub fn to_state(self) -> ModuleState {
        ModuleState {
            speed: sqrt(self.x * self.x + self.y * self.y),
            angle: atan2(self.y, self.x),
        }
    }
}

/// Target speed and steering angle for one module.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModuleState {
    /// Wheel ground speed (m/s), never negative for states produced by [`SwerveDrive`].
    pub speed: f64,
    /// Steering angle (rad) in `(-PI, PI]`, measured counter-clockwise from the robot x-axis.
    pub angle: f64,
}

impl ModuleState {
    /// Construct a module state.
    ///
    /// # Arguments
    ///
    /// * `speed`: Wheel ground speed in meters per second.
    /// * `angle`: Steering angle in radians.
    pub const fn new(speed: f64, angle: f64) -> Self {
        ModuleState { speed, angle }
    }

    /// Steering angle in degrees.
    pub fn angle_degrees(&self) -> f64 {
        self.angle * (180.0 / PI)
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(v: {:.4} m/s, θ: {:.4} rad / {:.2}°)",
            self.speed,
            self.angle,
            self.angle_degrees()
        )
    }
}

/// Swerve drive inverse kinematics.
///
/// Holds the constant 8×3 matrix mapping `[vx, vy, ω]` to the x and y
/// velocity of each module's contact point. Rows `2i` and `2i + 1` belong to
/// module `i` in [`Module::ALL`] order:
///
/// ```text
/// row 2i:     [1, 0, -ry_i]
/// row 2i + 1: [0, 1,  rx_i]
/// ```
///
/// which is the rigid-body velocity field `(vx - ω·ry, vy + ω·rx)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwerveDrive {
    /// Module offsets, in module order.
    geometry: [ModuleGeometry; MODULE_COUNT],
    /// Kinematic coefficient matrix.
    matrix: [[f64; 3]; 2 * MODULE_COUNT],
}

impl SwerveDrive {
    /// Construct the kinematics from the four module offsets.
    ///
    /// # Arguments
    ///
    /// * `fl`: Front-left module offset.
    /// * `fr`: Front-right module offset.
    /// * `bl`: Back-left module offset.
    /// * `br`: Back-right module offset.
    pub fn new(
        fl: ModuleGeometry,
        fr: ModuleGeometry,
        bl: ModuleGeometry,
        br: ModuleGeometry,
    ) -> Self {
        Self::from_geometry([fl, fr, bl, br])
    }

    /// Construct the kinematics from module offsets ordered as [`Module::ALL`].
    pub fn from_geometry(geometry: [ModuleGeometry; MODULE_COUNT]) -> Self {
        let mut matrix = [[0.0; 3]; 2 * MODULE_COUNT];
        for (i, module) in geometry.iter().enumerate() {
            matrix[2 * i] = [1.0, 0.0, -module.ry];
            matrix[2 * i + 1] = [0.0, 1.0, module.rx];
        }
        SwerveDrive { geometry, matrix }
    }

    /// Returns the module offsets in module order.
    pub fn geometry(&self) -> &[ModuleGeometry; MODULE_COUNT] {
        &self.geometry
    }

    /// Returns the offset of a single module.
    pub fn module_geometry(&self, module: Module) -> ModuleGeometry {
        self.geometry[module.index()]
    }

    /// Returns the 8×3 kinematic matrix.
    pub fn matrix(&self) -> &[[f64; 3]; 2 * MODULE_COUNT] {
        &self.matrix
    }

    /// Evaluates `M · [vx, vy, ω]ᵀ`, grouped into one velocity vector per module.
    ///
    /// This is the linear part of [`SwerveDrive::transform`].
    ///
    /// # Arguments
    ///
    /// * `vx`: Robot x velocity (m/s).
    /// * `vy`: Robot y velocity (m/s).
    /// * `omega`: Robot angular velocity (rad/s).
    pub fn module_velocities(
        &self,
        vx: f64,
        vy: f64,
        omega: f64,
    ) -> [ModuleVelocity; MODULE_COUNT] {
        let dot = |row: &[f64; 3]| row[0] * vx + row[1] * vy + row[2] * omega;
        core::array::from_fn(|i| {
            ModuleVelocity::new(dot(&self.matrix[2 * i]), dot(&self.matrix[2 * i + 1]))
        })
    }

    /// Calculates the speed and steering angle for every module.
    ///
    /// Inputs are not clamped or checked; non-finite values propagate into
    /// the result.
    ///
    /// # Arguments
    ///
    /// * `vx`: Robot x velocity (m/s).
    /// * `vy`: Robot y velocity (m/s).
    /// * `omega`: Robot angular velocity (rad/s).
    ///
    /// # Returns
    ///
    /// One state per module, ordered front-left, front-right, back-left, back-right.
    pub fn transform(&self, vx: f64, vy: f64, omega: f64) -> [ModuleState; MODULE_COUNT] {
        self.module_velocities(vx, vy, omega).map(ModuleVelocity::to_state)
    }

    /// Same as [`SwerveDrive::transform`], taking the command as [`ChassisSpeeds`].
    pub fn transform_speeds(&self, speeds: ChassisSpeeds) -> [ModuleState; MODULE_COUNT] {
        self.transform(speeds.vx, speeds.vy, speeds.omega)
    }
}

impl fmt::Display for SwerveDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SwerveDrive (")?;
        for (module, geometry) in Module::ALL.iter().zip(self.geometry.iter()) {
            if module.index() > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", module, geometry)?;
        }
        write!(f, ")")
    }
}
