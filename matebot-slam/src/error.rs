//! Error types for the SLAM crate

/// Result type alias
pub type Result<T> = std::result::Result<T, SlamError>;

/// SLAM error types
#[derive(Debug, thiserror::Error)]
pub enum SlamError {
    /// Requested lidar hardware is not available on this host
    #[error("Lidar hardware unavailable: {0}")]
    HardwareUnavailable(String),

    /// Transient sensor read failure; the tick degrades to an empty scan
    #[error("Sensor read failed: {0}")]
    SensorRead(String),
}
