use std::time::Duration;

use anyhow::ensure;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use swerve_kinematics::{ChassisSpeeds, ModuleGeometry, SwerveDrive};
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable holding an alternative config file path.
pub const CONFIG_PATH_ENV: &str = "SWERVE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub drive: DriveSettings,
    pub geometry: GeometrySettings,
    #[serde(default)]
    pub commands: Vec<CommandStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveSettings {
    pub loop_hz: u32,
    pub cmd_timeout_ms: u64,
}

impl DriveSettings {
    /// Control loop period.
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.loop_hz
    }

    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_millis(self.cmd_timeout_ms)
    }
}

/// Module offsets as read from the config file.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GeometrySettings {
    pub front_left: ModuleGeometry,
    pub front_right: ModuleGeometry,
    pub back_left: ModuleGeometry,
    pub back_right: ModuleGeometry,
}

impl GeometrySettings {
    pub fn kinematics(&self) -> SwerveDrive {
        SwerveDrive::new(
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        )
    }
}

/// One step of the scripted command sequence. Omitted velocities are zero.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommandStep {
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub omega: f64,
    pub duration_ms: u64,
}

impl CommandStep {
    pub fn speeds(&self) -> ChassisSpeeds {
        ChassisSpeeds::new(self.vx, self.vy, self.omega)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Settings {
    /// Checks the values the runtime cannot work with. Geometry is not checked.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.drive.loop_hz > 0, "drive.loop_hz must be positive");
        ensure!(
            !self.drive.period().is_zero(),
            "drive.loop_hz of {} leaves no time for a control period",
            self.drive.loop_hz
        );
        ensure!(
            !self.commands.is_empty(),
            "at least one [[commands]] step is required"
        );
        Ok(())
    }
}

/// Config file path, taken from `SWERVE_CONFIG` when set.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_settings(path: &str) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("SWERVE")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!(
                loop_hz = settings.drive.loop_hz,
                steps = settings.commands.len(),
                "Successfully loaded configuration"
            );
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use swerve_kinematics::Module;

    fn default_config() -> String {
        format!("{}/{}", env!("CARGO_MANIFEST_DIR"), DEFAULT_CONFIG_PATH)
    }

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("swerve-drive-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_default_config() {
        let settings = load_settings(&default_config()).unwrap();
        settings.validate().unwrap();
        assert!(settings.drive.loop_hz > 0);
        assert!(!settings.commands.is_empty());

        let kinematics = settings.geometry.kinematics();
        assert_eq!(
            kinematics.module_geometry(Module::FrontLeft),
            settings.geometry.front_left
        );
        assert_eq!(
            kinematics.module_geometry(Module::BackRight),
            settings.geometry.back_right
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(load_settings("does/not/exist.toml").is_err());
    }

    #[test]
    fn test_omitted_velocities_default_to_zero() {
        let path = write_temp_config(
            "defaults",
            r#"
            [drive]
            loop_hz = 50
            cmd_timeout_ms = 100

            [geometry]
            front_left = { rx = 0.2, ry = 0.2 }
            front_right = { rx = 0.2, ry = -0.2 }
            back_left = { rx = -0.2, ry = 0.2 }
            back_right = { rx = -0.2, ry = -0.2 }

            [[commands]]
            omega = 2.0
            duration_ms = 500
            "#,
        );
        let settings = load_settings(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.commands[0].speeds(), ChassisSpeeds::new(0.0, 0.0, 2.0));
        assert_eq!(settings.commands[0].duration(), Duration::from_millis(500));
        assert_eq!(settings.drive.period(), Duration::from_millis(20));
        assert_eq!(settings.drive.cmd_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        let path = write_temp_config(
            "invalid",
            r#"
            [drive]
            loop_hz = 0
            cmd_timeout_ms = 100

            [geometry]
            front_left = { rx = 0.0, ry = 0.0 }
            front_right = { rx = 0.0, ry = 0.0 }
            back_left = { rx = 0.0, ry = 0.0 }
            back_right = { rx = 0.0, ry = 0.0 }
            "#,
        );
        let mut settings = load_settings(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(settings.validate().is_err());
        settings.drive.loop_hz = 10;
        assert!(settings.validate().is_err());
        settings.commands.push(CommandStep {
            vx: 0.0,
            vy: 0.0,
            omega: 0.0,
            duration_ms: 10,
        });
        // Degenerate geometry is the caller's problem, not a config error
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_sub_nanosecond_period() {
        let mut settings = load_settings(&default_config()).unwrap();
        settings.drive.loop_hz = 2_000_000_000;
        assert!(settings.drive.period().is_zero());
        assert!(settings.validate().is_err());

        // Exactly one nanosecond is still a usable interval
        settings.drive.loop_hz = 1_000_000_000;
        assert_eq!(settings.drive.period(), Duration::from_nanos(1));
        assert!(settings.validate().is_ok());
    }
}
