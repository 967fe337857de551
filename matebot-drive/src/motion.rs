//! Motion loop: fixed-frequency drive control with a dead-man's switch.
//!
//! Each tick drains the motor-command queue (last writer wins), forces the
//! velocity to zero if no command arrived within the timeout, runs the
//! kinematics and ramp controller, applies the result to the actuator
//! backend, and emits one odometry delta for the SLAM loop.
//!
//! A failure inside a tick is fatal to this loop only; the actuator is
//! released on the way out and sibling loops keep running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info};

use matebot_core::config::BotConfig;
use matebot_core::debug_log::DebugLog;
use matebot_core::ipc::{QueueReceiver, QueueSender};
use matebot_core::types::{OdometryDelta, VelocityCommand};

use crate::backend::ActuatorBackend;
use crate::error::Result;
use crate::kinematics::MecanumKinematics;
use crate::ramp::RampController;

/// Velocity magnitude below which the robot counts as stationary.
const MOVING_EPSILON: f32 = 0.01;

/// Drive activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriveState {
    /// No command within the timeout; actuation ramping to or at zero
    Idle,
    /// Fresh command received; actuation follows the commanded velocity
    Active,
}

/// The motion control loop.
///
/// `tick` holds the whole per-cycle algorithm and is driven either by
/// [`MotionThread`] at the configured rate or directly by tests with
/// synthetic time steps.
pub struct MotionLoop {
    kinematics: MecanumKinematics,
    ramp: RampController,
    backend: Box<dyn ActuatorBackend>,
    commands: QueueReceiver<VelocityCommand>,
    odometry: QueueSender<OdometryDelta>,
    timeout_secs: f32,
    /// Seconds accumulated since the last received command
    since_last_command: f32,
    state: DriveState,
    velocity: (f32, f32, f32),
    freq_override: Option<f32>,
}

impl MotionLoop {
    /// Build the loop around an actuator backend and its queue endpoints.
    pub fn new(
        config: &BotConfig,
        backend: Box<dyn ActuatorBackend>,
        commands: QueueReceiver<VelocityCommand>,
        odometry: QueueSender<OdometryDelta>,
    ) -> Self {
        Self {
            kinematics: MecanumKinematics::new(&config.drive),
            ramp: RampController::new(&config.motion.ramp),
            backend,
            commands,
            odometry,
            timeout_secs: config.motion.command_timeout_secs,
            // Start timed-out: the drive stays asleep until a command arrives
            since_last_command: config.motion.command_timeout_secs,
            state: DriveState::Idle,
            velocity: (0.0, 0.0, 0.0),
            freq_override: None,
        }
    }

    /// Run one control cycle over a measured `dt` in seconds.
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        self.since_last_command += dt;

        // Drain the queue completely; only the freshest command is applied
        if let Some(cmd) = self.commands.drain_latest() {
            self.velocity = (cmd.vx, cmd.vy, cmd.omega);
            self.freq_override = cmd.pwm_frequency;
            self.since_last_command = 0.0;
            if self.state == DriveState::Idle {
                debug!(
                    "drive active: vx={:.2} vy={:.2} omega={:.2}",
                    cmd.vx, cmd.vy, cmd.omega
                );
                self.state = DriveState::Active;
            }
            self.ramp.wake();
        }

        // Dead-man's switch: stale command stream forces zero velocity
        if self.since_last_command > self.timeout_secs {
            if self.state == DriveState::Active {
                info!(
                    "no command for {:.1}s, stopping drive",
                    self.since_last_command
                );
                self.state = DriveState::Idle;
            }
            self.velocity = (0.0, 0.0, 0.0);
            self.freq_override = None;
        }

        let (vx, vy, omega) = self.velocity;
        let rates = self.kinematics.inverse_kinematics(vx, vy, omega);
        self.ramp.set_target(&rates, self.freq_override);
        let output = self.ramp.advance(dt);
        self.backend.apply(&output)?;

        let moving =
            vx.abs() > MOVING_EPSILON || vy.abs() > MOVING_EPSILON || omega.abs() > MOVING_EPSILON;
        self.odometry.send(OdometryDelta {
            dx: vx * dt,
            dy: vy * dt,
            dtheta: omega * dt,
            moving,
        });

        Ok(())
    }

    /// Whether the drive currently has a live command.
    pub fn is_active(&self) -> bool {
        self.state == DriveState::Active
    }

    /// Release the actuator: zero output, enable line dropped.
    pub fn release(&mut self) -> Result<()> {
        self.ramp.halt();
        self.backend.shutdown()
    }
}

/// Handle to the spawned motion loop thread.
pub struct MotionThread {
    handle: JoinHandle<()>,
}

impl MotionThread {
    /// Spawn the motion loop at its configured rate.
    ///
    /// The loop exits when `running` clears. Tick errors end only this
    /// thread; the actuator is released either way.
    pub fn spawn(
        mut motion: MotionLoop,
        cycle_hz: f32,
        running: Arc<AtomicBool>,
        debug_log: DebugLog,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("motion".into())
            .spawn(move || {
                let period = Duration::from_secs_f32(1.0 / cycle_hz);
                info!("motion loop starting at {:.0} Hz", cycle_hz);
                debug_log.append("MOTION: loop starting");

                let mut last_tick = Instant::now();
                while running.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    if let Err(e) = motion.tick(dt) {
                        error!("motion loop fatal: {}", e);
                        debug_log.append(&format!("MOTION: ERROR {}", e));
                        break;
                    }

                    // Sleep the remainder of the nominal period, never negative
                    let elapsed = last_tick.elapsed();
                    if elapsed < period {
                        thread::sleep(period - elapsed);
                    }
                }

                if let Err(e) = motion.release() {
                    error!("failed to release actuator: {}", e);
                }
                info!("motion loop stopped");
                debug_log.append("MOTION: loop stopping");
            })
            .expect("failed to spawn motion thread");

        Self { handle }
    }

    /// Whether the loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}
