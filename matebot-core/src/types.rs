//! Message and state types shared between the motion and SLAM loops.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::normalize_angle;

/// Robot pose in the map frame.
///
/// Position (x, y) in meters and heading (theta) in radians,
/// normalized to `[0, 2π)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians, normalized to `[0, 2π)`
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized to `[0, 2π)`.
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Pose at the origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Robot-frame velocity command.
///
/// Produced by the external interface, consumed exactly once by the motion
/// loop. When several commands arrive between ticks only the most recent one
/// is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Forward velocity (m/s)
    pub vx: f32,
    /// Strafe velocity (m/s, positive = right)
    pub vy: f32,
    /// Angular velocity (rad/s, positive = counter-clockwise)
    pub omega: f32,
    /// Optional step-frequency override for drive diagnostics
    #[serde(default)]
    pub pwm_frequency: Option<f32>,
}

impl VelocityCommand {
    /// Create a plain velocity command without a frequency override.
    pub fn new(vx: f32, vy: f32, omega: f32) -> Self {
        Self {
            vx,
            vy,
            omega,
            pwm_frequency: None,
        }
    }

    /// Command that brings the drive to a stop.
    pub fn stop() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Parse a command from its JSON wire form.
    ///
    /// Malformed input is rejected with [`crate::Error::InvalidCommand`].
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Signed wheel angular-rate commands in step-rate units.
///
/// Sign encodes rotation direction. Recomputed every motion tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelRates {
    pub front_left: f32,
    pub front_right: f32,
    pub back_left: f32,
    pub back_right: f32,
}

impl WheelRates {
    /// Rates as an array in `[fl, fr, bl, br]` order.
    #[inline]
    pub fn as_array(&self) -> [f32; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    /// Largest magnitude across the four wheels.
    pub fn peak(&self) -> f32 {
        self.as_array()
            .iter()
            .fold(0.0_f32, |acc, r| acc.max(r.abs()))
    }
}

/// Robot-frame pose change accumulated over one motion tick.
///
/// Produced once per motion tick, summed by the SLAM loop across all deltas
/// pending since its last tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OdometryDelta {
    /// Forward displacement (m, robot frame)
    pub dx: f32,
    /// Strafe displacement (m, robot frame)
    pub dy: f32,
    /// Heading change (rad)
    pub dtheta: f32,
    /// True if the commanded velocity exceeded the motion epsilon this tick
    pub moving: bool,
}

impl OdometryDelta {
    /// Fold another delta into this one. `moving` is OR-ed.
    pub fn accumulate(&mut self, other: &OdometryDelta) {
        self.dx += other.dx;
        self.dy += other.dy;
        self.dtheta += other.dtheta;
        self.moving |= other.moving;
    }
}

/// Discrete control actions from the external interface.
///
/// Wire form is a tagged JSON object:
/// `{"action": "reset_map"}` or
/// `{"action": "navigate", "target_id": "loc_001"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    /// Clear the occupancy grid and recenter the pose
    ResetMap,
    /// Drive to a saved location (resolved by the planning layer)
    Navigate {
        /// Identifier of the saved target location
        target_id: String,
    },
}

impl ControlAction {
    /// Parse an action from its JSON wire form.
    ///
    /// Malformed input is rejected with [`crate::Error::InvalidCommand`].
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_pose_normalizes_theta() {
        let pose = Pose2D::new(1.0, 2.0, TAU + 0.5);
        assert_relative_eq!(pose.theta, 0.5, epsilon = 1e-6);

        let pose = Pose2D::new(0.0, 0.0, -PI);
        assert_relative_eq!(pose.theta, PI, epsilon = 1e-6);
    }

    #[test]
    fn test_wheel_rates_peak() {
        let rates = WheelRates {
            front_left: 10.0,
            front_right: -35.0,
            back_left: 20.0,
            back_right: 5.0,
        };
        assert_relative_eq!(rates.peak(), 35.0);
        assert_relative_eq!(WheelRates::default().peak(), 0.0);
    }

    #[test]
    fn test_odometry_accumulate() {
        let mut sum = OdometryDelta::default();
        sum.accumulate(&OdometryDelta {
            dx: 0.1,
            dy: 0.0,
            dtheta: 0.05,
            moving: false,
        });
        sum.accumulate(&OdometryDelta {
            dx: 0.2,
            dy: -0.1,
            dtheta: 0.0,
            moving: true,
        });

        assert_relative_eq!(sum.dx, 0.3, epsilon = 1e-6);
        assert_relative_eq!(sum.dy, -0.1, epsilon = 1e-6);
        assert_relative_eq!(sum.dtheta, 0.05, epsilon = 1e-6);
        assert!(sum.moving);
    }

    #[test]
    fn test_velocity_command_json() {
        let cmd = VelocityCommand::from_json(r#"{"vx": 0.2, "vy": 0.0, "omega": 0.1}"#).unwrap();
        assert_relative_eq!(cmd.vx, 0.2);
        assert_relative_eq!(cmd.omega, 0.1);
        assert!(cmd.pwm_frequency.is_none());

        let cmd = VelocityCommand::from_json(
            r#"{"vx": 0.0, "vy": 0.0, "omega": 0.0, "pwm_frequency": 1500.0}"#,
        )
        .unwrap();
        assert_eq!(cmd.pwm_frequency, Some(1500.0));
    }

    #[test]
    fn test_control_action_json() {
        assert_eq!(
            ControlAction::from_json(r#"{"action": "reset_map"}"#).unwrap(),
            ControlAction::ResetMap
        );

        assert_eq!(
            ControlAction::from_json(r#"{"action": "navigate", "target_id": "loc_003"}"#).unwrap(),
            ControlAction::Navigate {
                target_id: "loc_003".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_messages_rejected() {
        assert!(matches!(
            ControlAction::from_json(r#"{"action": "fly"}"#),
            Err(Error::InvalidCommand(_))
        ));
        assert!(matches!(
            VelocityCommand::from_json(r#"{"vx": "fast"}"#),
            Err(Error::InvalidCommand(_))
        ));
    }
}
