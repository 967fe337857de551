//! Mecanum drive inverse kinematics.
//!
//! Robot-frame convention: x forward, y right-strafe, omega counter-clockwise
//! positive. Wheel angular rates come out of the standard mecanum model
//!
//! ```text
//! fl = (vx - vy - (lx+ly)*omega) / r
//! fr = (vx + vy + (lx+ly)*omega) / r
//! bl = (vx + vy - (lx+ly)*omega) / r
//! br = (vx - vy + (lx+ly)*omega) / r
//! ```
//!
//! and are scaled to the stepper's native step-rate unit.

use std::f32::consts::TAU;

use matebot_core::config::DriveConfig;
use matebot_core::types::WheelRates;

/// Converts robot-frame velocity into per-wheel step rates.
#[derive(Debug, Clone)]
pub struct MecanumKinematics {
    /// Half the front-back wheel separation (meters)
    half_length: f32,
    /// Half the left-right wheel separation (meters)
    half_width: f32,
    /// Wheel radius (meters)
    wheel_radius: f32,
    /// Steps per radian of wheel rotation
    steps_per_rad: f32,
}

impl MecanumKinematics {
    /// Build from the chassis configuration.
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            half_length: config.half_length,
            half_width: config.half_width,
            wheel_radius: config.wheel_radius,
            steps_per_rad: config.steps_per_revolution / TAU,
        }
    }

    /// Compute wheel step rates for a robot-frame velocity.
    ///
    /// Pure: every real input is valid.
    pub fn inverse_kinematics(&self, vx: f32, vy: f32, omega: f32) -> WheelRates {
        let k = (self.half_length + self.half_width) * omega;
        let r = self.wheel_radius;

        let fl = (vx - vy - k) / r;
        let fr = (vx + vy + k) / r;
        let bl = (vx + vy - k) / r;
        let br = (vx - vy + k) / r;

        WheelRates {
            front_left: fl * self.steps_per_rad,
            front_right: fr * self.steps_per_rad,
            back_left: bl * self.steps_per_rad,
            back_right: br * self.steps_per_rad,
        }
    }
}
