//! MateBot core library.
//!
//! Shared foundation for the motion and SLAM loops:
//!
//! - Message and state types exchanged between the loops
//! - The IPC fabric: drain-to-empty queues and the shared map buffer
//! - TOML configuration with calibrated defaults
//! - Error types and the best-effort hardware debug log

pub mod config;
pub mod debug_log;
pub mod error;
pub mod ipc;
pub mod math;
pub mod types;

pub use config::BotConfig;
pub use error::{Error, Result};
pub use types::{ControlAction, OdometryDelta, Pose2D, VelocityCommand, WheelRates};
