//! Path planning seam.
//!
//! The loops only depend on these two traits, so a real A* planner and a
//! pure-pursuit controller can be substituted without touching the motion
//! or SLAM code. The provided implementations are deliberately minimal:
//! a straight-line "plan" and a proportional creep toward the goal.

use matebot_core::types::{Pose2D, VelocityCommand};

use crate::grid::OccupancyGrid;

/// A 2D waypoint in world coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
}

/// Produces a waypoint sequence from the current pose to a target.
pub trait Planner {
    fn plan(&self, current: &Pose2D, target: &Pose2D, grid: &OccupancyGrid) -> Vec<Waypoint>;
}

/// Converts a waypoint sequence into a velocity command.
pub trait Pursuit {
    fn pursue(&self, current: &Pose2D, waypoints: &[Waypoint]) -> VelocityCommand;
}

/// Straight-line planner: start and goal, nothing in between.
///
/// TODO: replace with A* over the occupancy grid once obstacle inflation
/// parameters are settled.
#[derive(Debug, Default)]
pub struct StraightLinePlanner;

impl Planner for StraightLinePlanner {
    fn plan(&self, current: &Pose2D, target: &Pose2D, _grid: &OccupancyGrid) -> Vec<Waypoint> {
        vec![
            Waypoint {
                x: current.x,
                y: current.y,
            },
            Waypoint {
                x: target.x,
                y: target.y,
            },
        ]
    }
}

/// Proportional pursuit: creep toward the final waypoint, axis by axis.
#[derive(Debug)]
pub struct ProportionalPursuit {
    /// Cruise speed per axis (m/s)
    pub speed: f32,
    /// Position tolerance below which an axis stops (meters)
    pub tolerance: f32,
}

impl Default for ProportionalPursuit {
    fn default() -> Self {
        Self {
            speed: 0.1,
            tolerance: 0.05,
        }
    }
}

impl Pursuit for ProportionalPursuit {
    fn pursue(&self, current: &Pose2D, waypoints: &[Waypoint]) -> VelocityCommand {
        let Some(goal) = waypoints.last() else {
            return VelocityCommand::stop();
        };
        if waypoints.len() < 2 {
            return VelocityCommand::stop();
        }

        let dx = goal.x - current.x;
        let dy = goal.y - current.y;

        let vx = if dx.abs() > self.tolerance {
            self.speed.copysign(dx)
        } else {
            0.0
        };
        let vy = if dy.abs() > self.tolerance {
            self.speed.copysign(dy)
        } else {
            0.0
        };

        VelocityCommand::new(vx, vy, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_line_plan() {
        let grid = OccupancyGrid::new(10, 0.1);
        let current = Pose2D::new(0.2, 0.2, 0.0);
        let target = Pose2D::new(0.8, 0.6, 0.0);

        let path = StraightLinePlanner.plan(&current, &target, &grid);
        assert_eq!(path.len(), 2);
        assert_relative_eq!(path[0].x, 0.2);
        assert_relative_eq!(path[1].x, 0.8);
        assert_relative_eq!(path[1].y, 0.6);
    }

    #[test]
    fn test_pursuit_moves_toward_goal() {
        let pursuit = ProportionalPursuit::default();
        let current = Pose2D::new(0.0, 0.0, 0.0);
        let path = [
            Waypoint { x: 0.0, y: 0.0 },
            Waypoint { x: 1.0, y: -1.0 },
        ];

        let cmd = pursuit.pursue(&current, &path);
        assert_relative_eq!(cmd.vx, 0.1);
        assert_relative_eq!(cmd.vy, -0.1);
        assert_relative_eq!(cmd.omega, 0.0);
    }

    #[test]
    fn test_pursuit_stops_inside_tolerance() {
        let pursuit = ProportionalPursuit::default();
        let current = Pose2D::new(0.99, 0.0, 0.0);
        let path = [Waypoint { x: 0.0, y: 0.0 }, Waypoint { x: 1.0, y: 0.02 }];

        let cmd = pursuit.pursue(&current, &path);
        assert_relative_eq!(cmd.vx, 0.0);
        assert_relative_eq!(cmd.vy, 0.0);
    }

    #[test]
    fn test_pursuit_without_path_stops() {
        let pursuit = ProportionalPursuit::default();
        let current = Pose2D::identity();
        assert_eq!(pursuit.pursue(&current, &[]), VelocityCommand::stop());
        assert_eq!(
            pursuit.pursue(&current, &[Waypoint { x: 1.0, y: 1.0 }]),
            VelocityCommand::stop()
        );
    }
}
