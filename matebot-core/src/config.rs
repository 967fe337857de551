//! Configuration loading for the MateBot stack.
//!
//! Loads from a TOML file; every field has a calibrated default so a missing
//! or partial file still yields a runnable configuration.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub slam: SlamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chassis geometry and actuator calibration
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// Wheel radius in meters
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f32,

    /// Half the front-back wheel separation (meters)
    #[serde(default = "default_half_length")]
    pub half_length: f32,

    /// Half the left-right wheel separation (meters)
    #[serde(default = "default_half_width")]
    pub half_width: f32,

    /// Stepper steps per wheel revolution, including microstepping
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: f32,

    /// Actuator backend: "sim" or "gpio" (degrades to "sim" when absent)
    #[serde(default = "default_backend")]
    pub backend: String,
}

/// Motion loop timing and ramp parameters
#[derive(Debug, Clone, Deserialize)]
pub struct MotionConfig {
    /// Motion loop frequency (Hz)
    #[serde(default = "default_motion_hz")]
    pub cycle_hz: f32,

    /// Dead-man's switch: seconds without a command before forcing zero velocity
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: f32,

    #[serde(default)]
    pub ramp: RampConfig,
}

/// Ramp controller parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RampConfig {
    /// Ramping strategy
    #[serde(default)]
    pub strategy: RampStrategyKind,

    /// Maximum change in step rate per second while accelerating
    #[serde(default = "default_accel_limit")]
    pub accel_limit: f32,

    /// Deceleration limit as a multiple of `accel_limit`
    #[serde(default = "default_decel_factor")]
    pub decel_factor: f32,

    /// Step-rate magnitude below which output snaps to zero and disables
    #[serde(default = "default_dead_band")]
    pub dead_band: f32,

    /// Settle delay after re-enabling the drivers before stepping resumes
    #[serde(default = "default_settle_secs")]
    pub settle_secs: f32,
}

/// Selectable ramping strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampStrategyKind {
    /// Each wheel channel ramps toward its own target rate
    PerWheel,
    /// One shared step frequency ramps; wheel directions switch instantly
    #[default]
    Frequency,
}

/// SLAM loop and map parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SlamConfig {
    /// SLAM loop frequency (Hz)
    #[serde(default = "default_nav_hz")]
    pub cycle_hz: f32,

    /// Occupancy grid side length in cells
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Grid resolution in meters per cell
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// Radius around the robot marked free each stationary tick (meters)
    #[serde(default = "default_free_radius")]
    pub free_radius_m: f32,

    /// Minimum accepted lidar range (meters); closer points are noise
    #[serde(default = "default_scan_min")]
    pub scan_min_m: f32,

    /// Maximum accepted lidar range (meters)
    #[serde(default = "default_scan_max")]
    pub scan_max_m: f32,

    /// Lidar backend: "sim" or "serial" (degrades to "sim" when absent)
    #[serde(default = "default_backend")]
    pub lidar: String,
}

/// Debug log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Path of the append-only debug file; empty disables it
    #[serde(default = "default_debug_file")]
    pub debug_file: String,
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Force all hardware backends to simulation.
    pub fn force_simulation(&mut self) {
        self.drive.backend = "sim".to_string();
        self.slam.lidar = "sim".to_string();
    }
}

impl SlamConfig {
    /// Side length of the map in meters.
    pub fn map_extent_m(&self) -> f32 {
        self.map_size as f32 * self.resolution
    }

    /// Initial pose: the grid center, heading zero.
    pub fn center_pose(&self) -> crate::types::Pose2D {
        let center = self.map_size as f32 / 2.0 * self.resolution;
        crate::types::Pose2D::new(center, center, 0.0)
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            wheel_radius: default_wheel_radius(),
            half_length: default_half_length(),
            half_width: default_half_width(),
            steps_per_revolution: default_steps_per_revolution(),
            backend: default_backend(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            cycle_hz: default_motion_hz(),
            command_timeout_secs: default_command_timeout(),
            ramp: RampConfig::default(),
        }
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            strategy: RampStrategyKind::default(),
            accel_limit: default_accel_limit(),
            decel_factor: default_decel_factor(),
            dead_band: default_dead_band(),
            settle_secs: default_settle_secs(),
        }
    }
}

impl Default for SlamConfig {
    fn default() -> Self {
        Self {
            cycle_hz: default_nav_hz(),
            map_size: default_map_size(),
            resolution: default_resolution(),
            free_radius_m: default_free_radius(),
            scan_min_m: default_scan_min(),
            scan_max_m: default_scan_max(),
            lidar: default_backend(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug_file: default_debug_file(),
        }
    }
}

// Default value functions. Geometry and map constants are the calibrated
// values for the MateBot chassis: 50 mm wheel radius, 0.3 m wheel
// separations, 200-step motors at 32 microsteps, 20 m x 20 m map at 5 cm.
fn default_wheel_radius() -> f32 {
    0.05
}
fn default_half_length() -> f32 {
    0.15
}
fn default_half_width() -> f32 {
    0.15
}
fn default_steps_per_revolution() -> f32 {
    6400.0
}
fn default_backend() -> String {
    "sim".to_string()
}
fn default_motion_hz() -> f32 {
    50.0
}
fn default_command_timeout() -> f32 {
    1.0
}
fn default_accel_limit() -> f32 {
    4000.0
}
fn default_decel_factor() -> f32 {
    2.0
}
fn default_dead_band() -> f32 {
    15.0
}
fn default_settle_secs() -> f32 {
    0.05
}
fn default_nav_hz() -> f32 {
    10.0
}
fn default_map_size() -> usize {
    400
}
fn default_resolution() -> f32 {
    0.05
}
fn default_free_radius() -> f32 {
    0.5
}
fn default_scan_min() -> f32 {
    0.15
}
fn default_scan_max() -> f32 {
    8.0
}
fn default_debug_file() -> String {
    String::new()
}
