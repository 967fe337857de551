//! Error types for the drive crate

/// Result type alias
pub type Result<T> = std::result::Result<T, DriveError>;

/// Drive error types
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Requested actuator hardware is not available on this host
    #[error("Actuator hardware unavailable: {0}")]
    HardwareUnavailable(String),

    /// Fault reported by the actuator backend
    #[error("Actuator fault: {0}")]
    Actuator(String),
}
