//! Lidar backend seam.
//!
//! The SLAM loop reads scans through [`LidarBackend`] without knowing what
//! produces them. On the robot that is the serial lidar driver; elsewhere
//! the simulated backend synthesizes a plausible room so the rest of the
//! stack runs unchanged.

use log::{info, warn};
use rand::Rng;

use matebot_core::config::SlamConfig;

use crate::error::Result;

/// One lidar return: bearing in degrees (0 = robot front, CCW) and range
/// in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPoint {
    pub angle_deg: f32,
    pub distance_m: f32,
}

/// One revolution's worth of lidar returns. May be empty (no data yet, or a
/// degraded tick).
#[derive(Debug, Clone, Default)]
pub struct LidarScan {
    pub points: Vec<ScanPoint>,
}

impl LidarScan {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Capability interface over the range sensor.
pub trait LidarBackend: Send {
    /// Begin sampling.
    fn start(&mut self) -> Result<()>;

    /// Take the scan accumulated since the last call.
    ///
    /// Returning an empty scan is normal; errors are transient and the
    /// caller degrades to an empty scan for the tick.
    fn take_scan(&mut self) -> Result<LidarScan>;

    /// Stop sampling and release the sensor.
    fn stop(&mut self);
}

/// Simulated lidar: the robot sits in a square room.
///
/// Ranges are the distance from the room center to the walls along each
/// bearing, with a little uniform jitter so downstream consumers never see
/// perfectly clean data.
pub struct SimulatedLidar {
    /// Half the room's side length (meters)
    half_extent_m: f32,
    /// Returns per revolution
    points_per_rev: usize,
    /// Range jitter amplitude (meters)
    jitter_m: f32,
    running: bool,
}

impl SimulatedLidar {
    pub fn new() -> Self {
        Self {
            half_extent_m: 4.0,
            points_per_rev: 180,
            jitter_m: 0.01,
            running: false,
        }
    }

    /// Room with a specific half-extent, for tests.
    pub fn with_half_extent(half_extent_m: f32) -> Self {
        Self {
            half_extent_m,
            ..Self::new()
        }
    }
}

impl Default for SimulatedLidar {
    fn default() -> Self {
        Self::new()
    }
}

impl LidarBackend for SimulatedLidar {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        info!(
            "sim lidar: {:.0} m square room, {} points/rev",
            self.half_extent_m * 2.0,
            self.points_per_rev
        );
        Ok(())
    }

    fn take_scan(&mut self) -> Result<LidarScan> {
        if !self.running {
            return Ok(LidarScan::default());
        }

        let mut rng = rand::thread_rng();
        let step = 360.0 / self.points_per_rev as f32;
        let points = (0..self.points_per_rev)
            .map(|i| {
                let angle_deg = i as f32 * step;
                let rad = angle_deg.to_radians();
                // Distance to the boundary of an axis-aligned square
                let denom = rad.cos().abs().max(rad.sin().abs());
                let range = self.half_extent_m / denom;
                let jitter = rng.gen_range(-self.jitter_m..=self.jitter_m);
                ScanPoint {
                    angle_deg,
                    distance_m: range + jitter,
                }
            })
            .collect();

        Ok(LidarScan { points })
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Select a lidar backend from the configuration.
///
/// The serial driver only exists on the robot; anywhere else the stack
/// degrades to the simulated backend with a single warning.
pub fn create_lidar(config: &SlamConfig) -> Box<dyn LidarBackend> {
    match config.lidar.as_str() {
        "sim" => {
            info!("Lidar backend: simulation");
            Box::new(SimulatedLidar::new())
        }
        other => {
            warn!(
                "Lidar backend '{}' unavailable on this host, degrading to simulation",
                other
            );
            Box::new(SimulatedLidar::new())
        }
    }
}
