//! MateBot drive library.
//!
//! The actuation side of the stack: mecanum inverse kinematics, the ramp
//! controller that bounds acceleration and gates the driver enable line,
//! the actuator backend seam (real hardware or simulation), and the motion
//! loop that ties them together under the dead-man's switch.

pub mod backend;
pub mod error;
pub mod kinematics;
pub mod motion;
pub mod ramp;

pub use backend::{create_actuator, ActuatorBackend, DriveOutput, SimulatedActuator};
pub use error::{DriveError, Result};
pub use kinematics::MecanumKinematics;
pub use motion::{MotionLoop, MotionThread};
pub use ramp::RampController;
