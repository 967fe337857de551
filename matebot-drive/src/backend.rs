//! Actuator backend seam.
//!
//! The motion loop is backend-agnostic: it hands a [`DriveOutput`] to
//! whatever [`ActuatorBackend`] was selected at startup. On hardware that is
//! the stepper driver bank; everywhere else the simulated backend accepts
//! the same calls and performs no I/O.

use log::{info, trace, warn};

use crate::error::Result;
use matebot_core::config::DriveConfig;

/// Per-tick actuation command: signed step rates in `[fl, fr, bl, br]`
/// order plus the driver enable line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveOutput {
    /// Signed step rates per wheel (steps/s); sign is rotation direction
    pub channels: [f32; 4],
    /// Driver enable (sleep) line state
    pub enabled: bool,
}

impl DriveOutput {
    /// Largest magnitude across the four channels.
    pub fn peak(&self) -> f32 {
        self.channels.iter().fold(0.0_f32, |acc, c| acc.max(c.abs()))
    }

    /// True when nothing is being driven.
    pub fn is_stopped(&self) -> bool {
        self.peak() == 0.0
    }
}

/// Capability interface over the drive electronics.
pub trait ActuatorBackend: Send {
    /// Apply one tick's output to the hardware.
    fn apply(&mut self, output: &DriveOutput) -> Result<()>;

    /// Release the hardware: stop stepping and drop the enable line.
    fn shutdown(&mut self) -> Result<()>;
}

/// Simulated actuator: accepts the full API, performs no I/O.
///
/// Retains the last applied output so tests and diagnostics can inspect it.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    last: DriveOutput,
    applied_ticks: u64,
}

impl SimulatedActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last output applied by the motion loop.
    pub fn last_output(&self) -> DriveOutput {
        self.last
    }

    /// Number of outputs applied so far.
    pub fn applied_ticks(&self) -> u64 {
        self.applied_ticks
    }
}

impl ActuatorBackend for SimulatedActuator {
    fn apply(&mut self, output: &DriveOutput) -> Result<()> {
        self.last = *output;
        self.applied_ticks += 1;
        trace!(
            "sim actuator: channels=[{:.0}, {:.0}, {:.0}, {:.0}] enabled={}",
            output.channels[0],
            output.channels[1],
            output.channels[2],
            output.channels[3],
            output.enabled
        );
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.last = DriveOutput::default();
        Ok(())
    }
}

/// Select an actuator backend from the configuration.
///
/// The GPIO stepper backend only exists on the robot itself; anywhere it is
/// requested but absent the stack degrades to simulation with a single
/// warning rather than failing.
pub fn create_actuator(config: &DriveConfig) -> Box<dyn ActuatorBackend> {
    match config.backend.as_str() {
        "sim" => {
            info!("Actuator backend: simulation");
            Box::new(SimulatedActuator::new())
        }
        other => {
            warn!(
                "Actuator backend '{}' unavailable on this host, degrading to simulation",
                other
            );
            Box::new(SimulatedActuator::new())
        }
    }
}
