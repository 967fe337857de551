//! SLAM loop: fixed-frequency mapping with odometry-gated scan processing.
//!
//! Each tick drains the control-action queue, then drains and sums all
//! odometry pending since the last tick. While the robot is moving the tick
//! integrates odometry only and skips lidar ingestion - scans taken during
//! motion are noisier and cost CPU the motion loop needs. Once stationary,
//! the tick runs a full scan update with the summed odometry as a
//! correction term. The grid and pose are republished every tick either way.
//!
//! Sensor read failures degrade to an empty scan; they never end the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use matebot_core::config::BotConfig;
use matebot_core::debug_log::DebugLog;
use matebot_core::ipc::{Latest, QueueReceiver, SharedMap};
use matebot_core::types::{ControlAction, OdometryDelta, Pose2D};

use crate::engine::SlamEngine;
use crate::sensor::{LidarBackend, LidarScan};

/// The SLAM processing loop.
///
/// `tick` holds the whole per-cycle algorithm; [`SlamThread`] drives it at
/// the configured rate, tests drive it directly.
pub struct SlamLoop {
    engine: SlamEngine,
    lidar: Box<dyn LidarBackend>,
    odometry: QueueReceiver<OdometryDelta>,
    actions: QueueReceiver<ControlAction>,
    map: Arc<SharedMap>,
    pose_out: Arc<Latest<Pose2D>>,
}

impl SlamLoop {
    /// Build the loop around a lidar backend and its fabric endpoints.
    pub fn new(
        config: &BotConfig,
        lidar: Box<dyn LidarBackend>,
        odometry: QueueReceiver<OdometryDelta>,
        actions: QueueReceiver<ControlAction>,
        map: Arc<SharedMap>,
        pose_out: Arc<Latest<Pose2D>>,
    ) -> Self {
        Self {
            engine: SlamEngine::new(&config.slam),
            lidar,
            odometry,
            actions,
            map,
            pose_out,
        }
    }

    /// Start the sensor. A failure here degrades to empty scans rather than
    /// preventing the loop from running.
    pub fn start_sensor(&mut self) {
        if let Err(e) = self.lidar.start() {
            warn!("lidar start failed, mapping degrades to odometry only: {}", e);
        }
    }

    /// Run one mapping cycle.
    pub fn tick(&mut self) {
        for action in self.actions.drain() {
            self.handle_action(action);
        }

        // Sum everything the motion loop emitted since our last tick
        let mut summed = OdometryDelta::default();
        for delta in self.odometry.drain() {
            summed.accumulate(&delta);
        }

        if summed.moving {
            // In motion: pose integration only, keep the marker fresh
            self.engine.integrate_odometry(&summed);
            self.engine.mark_robot();
        } else {
            let scan = match self.lidar.take_scan() {
                Ok(scan) => scan,
                Err(e) => {
                    warn!("sensor read failed, using empty scan: {}", e);
                    LidarScan::default()
                }
            };
            self.engine.update(&scan, Some(&summed));
        }

        self.pose_out.set(self.engine.pose());
        if let Err(e) = self.map.publish(self.engine.grid().as_bytes()) {
            error!("map publish failed: {}", e);
        }
    }

    fn handle_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::ResetMap => {
                info!("resetting map");
                self.engine.reset_map();
            }
            ControlAction::Navigate { target_id } => {
                // Target poses live in the saved-location store, which is
                // owned by the external interface. Without one attached the
                // request cannot be resolved.
                warn!("navigate: no location store attached, dropping target '{}'", target_id);
            }
        }
    }

    /// Current pose (copy), for diagnostics.
    pub fn pose(&self) -> Pose2D {
        self.engine.pose()
    }

    /// Stop the sensor and release it.
    pub fn release(&mut self) {
        self.lidar.stop();
    }
}

/// Handle to the spawned SLAM loop thread.
pub struct SlamThread {
    handle: JoinHandle<()>,
}

impl SlamThread {
    /// Spawn the SLAM loop at its configured rate.
    ///
    /// The loop exits when `running` clears; the sensor is released on the
    /// way out.
    pub fn spawn(
        mut slam: SlamLoop,
        cycle_hz: f32,
        running: Arc<AtomicBool>,
        debug_log: DebugLog,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("slam".into())
            .spawn(move || {
                let period = Duration::from_secs_f32(1.0 / cycle_hz);
                info!("slam loop starting at {:.0} Hz", cycle_hz);
                debug_log.append("NAV: loop starting");

                slam.start_sensor();

                while running.load(Ordering::Relaxed) {
                    let tick_start = Instant::now();
                    slam.tick();

                    // Sleep the remainder of the nominal period, never negative
                    let elapsed = tick_start.elapsed();
                    if elapsed < period {
                        thread::sleep(period - elapsed);
                    }
                }

                slam.release();
                info!("slam loop stopped");
                debug_log.append("NAV: loop stopping");
            })
            .expect("failed to spawn slam thread");

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
