//! MateBot SLAM library.
//!
//! The mapping side of the stack: the occupancy grid, the SLAM engine that
//! integrates odometry and projects lidar scans, the lidar backend seam,
//! the fixed-rate SLAM loop, and the path-planning seam.

pub mod engine;
pub mod error;
pub mod grid;
pub mod planning;
pub mod sensor;
pub mod slam_loop;

pub use engine::SlamEngine;
pub use error::{Result, SlamError};
pub use grid::{CellState, OccupancyGrid};
pub use sensor::{create_lidar, LidarBackend, LidarScan, ScanPoint, SimulatedLidar};
pub use slam_loop::{SlamLoop, SlamThread};
