//! SLAM engine: odometry integration and scan projection.
//!
//! Pose correction is odometry-only; the scan-matching seam would slot in
//! where `update` integrates the summed delta.

use matebot_core::config::SlamConfig;
use matebot_core::math::normalize_angle;
use matebot_core::types::{OdometryDelta, Pose2D};

use crate::grid::{CellState, OccupancyGrid};
use crate::sensor::LidarScan;

/// Occupancy-grid SLAM with odometry-integrated pose.
///
/// Owns the pose and the grid exclusively; the loop publishes copies.
pub struct SlamEngine {
    pose: Pose2D,
    grid: OccupancyGrid,
    free_radius_m: f32,
    scan_min_m: f32,
    scan_max_m: f32,
    initial_pose: Pose2D,
}

impl SlamEngine {
    /// Create an engine with an all-unknown grid and the pose centered.
    pub fn new(config: &SlamConfig) -> Self {
        let initial_pose = config.center_pose();
        Self {
            pose: initial_pose,
            grid: OccupancyGrid::from_config(config),
            free_radius_m: config.free_radius_m,
            scan_min_m: config.scan_min_m,
            scan_max_m: config.scan_max_m,
            initial_pose,
        }
    }

    /// Current pose (copy).
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// The occupancy grid.
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Integrate a robot-frame odometry delta into the world-frame pose.
    ///
    /// The translational delta is rotated by the current heading before
    /// being added; the heading stays normalized to `[0, 2π)` so repeated
    /// integration is stable over unbounded runtime.
    pub fn integrate_odometry(&mut self, delta: &OdometryDelta) {
        let (sin_t, cos_t) = self.pose.theta.sin_cos();

        self.pose.x += delta.dx * cos_t - delta.dy * sin_t;
        self.pose.y += delta.dx * sin_t + delta.dy * cos_t;
        self.pose.theta = normalize_angle(self.pose.theta + delta.dtheta);
    }

    /// Full map update for a stationary tick.
    ///
    /// Integrates the (normally near-zero) summed odometry as a correction,
    /// clears a free disk around the robot, projects the scan, and redraws
    /// the robot marker.
    pub fn update(&mut self, scan: &LidarScan, odometry: Option<&OdometryDelta>) {
        if let Some(delta) = odometry {
            self.integrate_odometry(delta);
        }

        self.grid
            .mark_free_disk(self.pose.x, self.pose.y, self.free_radius_m);

        for point in &scan.points {
            if point.distance_m < self.scan_min_m || point.distance_m > self.scan_max_m {
                continue;
            }
            let angle = point.angle_deg.to_radians() + self.pose.theta;
            let ox = self.pose.x + point.distance_m * angle.cos();
            let oy = self.pose.y + point.distance_m * angle.sin();
            self.grid.set_world(ox, oy, CellState::Occupied);
        }

        self.mark_robot();
    }

    /// Redraw the robot marker without touching the rest of the grid.
    pub fn mark_robot(&mut self) {
        self.grid.mark_robot(self.pose.x, self.pose.y);
    }

    /// Clear the map and recenter the pose.
    pub fn reset_map(&mut self) {
        self.grid.reset();
        self.pose = self.initial_pose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::ScanPoint;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn engine() -> SlamEngine {
        SlamEngine::new(&SlamConfig::default())
    }

    fn scan(points: &[(f32, f32)]) -> LidarScan {
        LidarScan {
            points: points
                .iter()
                .map(|&(angle_deg, distance_m)| ScanPoint {
                    angle_deg,
                    distance_m,
                })
                .collect(),
        }
    }

    #[test]
    fn test_starts_centered() {
        let e = engine();
        assert_relative_eq!(e.pose().x, 10.0);
        assert_relative_eq!(e.pose().y, 10.0);
        assert_relative_eq!(e.pose().theta, 0.0);
    }

    #[test]
    fn test_zero_delta_is_idempotent() {
        let mut e = engine();
        let start = e.pose();

        let zero = OdometryDelta::default();
        for _ in 0..10_000 {
            e.integrate_odometry(&zero);
        }

        let end = e.pose();
        assert_relative_eq!(end.x, start.x, epsilon = 1e-5);
        assert_relative_eq!(end.y, start.y, epsilon = 1e-5);
        assert_relative_eq!(end.theta, start.theta, epsilon = 1e-5);
    }

    #[test]
    fn test_odometry_rotates_into_world_frame() {
        let mut e = engine();

        // Face +y, then drive "forward" in the robot frame
        e.integrate_odometry(&OdometryDelta {
            dx: 0.0,
            dy: 0.0,
            dtheta: FRAC_PI_2,
            moving: true,
        });
        e.integrate_odometry(&OdometryDelta {
            dx: 1.0,
            dy: 0.0,
            dtheta: 0.0,
            moving: true,
        });

        assert_relative_eq!(e.pose().x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(e.pose().y, 11.0, epsilon = 1e-5);
    }

    #[test]
    fn test_theta_stays_normalized() {
        let mut e = engine();
        let turn = OdometryDelta {
            dx: 0.0,
            dy: 0.0,
            dtheta: 0.5,
            moving: true,
        };
        for _ in 0..1000 {
            e.integrate_odometry(&turn);
        }
        let theta = e.pose().theta;
        assert!((0.0..std::f32::consts::TAU).contains(&theta));
    }

    #[test]
    fn test_scan_point_projected_to_expected_cell() {
        let mut e = engine();
        let pose = e.pose();

        e.update(&scan(&[(0.0, 1.0)]), None);

        // One point straight ahead at 1 m lands at (x0 + 1, y0)
        assert_eq!(e.grid().state_at(pose.x + 1.0, pose.y), CellState::Occupied);
    }

    #[test]
    fn test_range_gate_drops_noise() {
        let mut e = engine();
        let pose = e.pose();

        e.update(&scan(&[(0.0, 0.1), (90.0, 9.5)]), None);

        // Both points are outside [0.15, 8.0] and must be dropped
        assert_eq!(e.grid().state_at(pose.x + 0.1, pose.y), CellState::Free);
        assert_eq!(e.grid().state_at(pose.x, pose.y + 9.5), CellState::Unknown);
    }

    #[test]
    fn test_out_of_map_projection_is_harmless() {
        let mut e = engine();

        // 8 m ray from 2.1 m off the map edge: projects outside [0, 20)
        e.integrate_odometry(&OdometryDelta {
            dx: 7.9,
            dy: 0.0,
            dtheta: 0.0,
            moving: true,
        });
        let occupied_before = e.grid().occupied_count();
        e.update(&scan(&[(0.0, 7.9)]), None);

        // The projection fell off the grid: only marker/free-disk changed
        let pose = e.pose();
        assert!(e.grid().world_to_cell(pose.x + 7.9, pose.y).is_none());
        assert!(e.grid().occupied_count() <= occupied_before + 4);
    }

    #[test]
    fn test_free_disk_painted_around_robot() {
        let mut e = engine();
        let pose = e.pose();

        e.update(&LidarScan::default(), None);

        assert_eq!(e.grid().state_at(pose.x + 0.3, pose.y), CellState::Free);
        assert_eq!(e.grid().state_at(pose.x, pose.y - 0.3), CellState::Free);
        // Robot marker drawn over the freed disk
        assert_eq!(e.grid().state_at(pose.x, pose.y), CellState::Occupied);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut e = engine();
        e.integrate_odometry(&OdometryDelta {
            dx: 2.0,
            dy: 1.0,
            dtheta: 1.0,
            moving: true,
        });
        e.update(&scan(&[(0.0, 1.0)]), None);
        assert!(e.grid().occupied_count() > 0);

        e.reset_map();

        assert!(e.grid().as_bytes().iter().all(|&c| c == 0));
        assert_relative_eq!(e.pose().x, 10.0);
        assert_relative_eq!(e.pose().y, 10.0);
        assert_relative_eq!(e.pose().theta, 0.0);
    }
}
