//! Application orchestration.
//!
//! Builds the IPC fabric, spawns the motion and SLAM loops as named
//! threads, and owns the shutdown flag. The external command/telemetry
//! interface attaches through the queue senders and the shared map; the
//! loops never learn who is on the other side.
//!
//! One loop dying degrades the system (logged, surfaced via `health`) but
//! never takes its sibling down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use matebot_core::config::BotConfig;
use matebot_core::debug_log::DebugLog;
use matebot_core::ipc::{queue, Latest, QueueSender, SharedMap};
use matebot_core::types::{ControlAction, Pose2D, VelocityCommand};
use matebot_drive::{create_actuator, MotionLoop, MotionThread};
use matebot_slam::{create_lidar, SlamLoop, SlamThread};

/// Health of the two control loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopHealth {
    pub motion_alive: bool,
    pub slam_alive: bool,
}

impl LoopHealth {
    pub fn all_alive(&self) -> bool {
        self.motion_alive && self.slam_alive
    }
}

/// The running MateBot stack.
pub struct App {
    running: Arc<AtomicBool>,
    motor_tx: QueueSender<VelocityCommand>,
    action_tx: QueueSender<ControlAction>,
    map: Arc<SharedMap>,
    pose: Arc<Latest<Pose2D>>,
    motion: MotionThread,
    slam: SlamThread,
    degraded_logged: bool,
}

impl App {
    /// Build the fabric and start both loops.
    pub fn start(config: &BotConfig) -> Self {
        let debug_log = DebugLog::from_config(&config.logging.debug_file);

        // IPC fabric: three queues plus the shared map and pose telemetry
        let (motor_tx, motor_rx) = queue::<VelocityCommand>();
        let (odom_tx, odom_rx) = queue();
        let (action_tx, action_rx) = queue::<ControlAction>();
        let map = Arc::new(SharedMap::new(config.slam.map_size));
        let pose = Arc::new(Latest::new(config.slam.center_pose()));

        let running = Arc::new(AtomicBool::new(true));

        let motion_loop = MotionLoop::new(
            config,
            create_actuator(&config.drive),
            motor_rx,
            odom_tx,
        );
        let motion = MotionThread::spawn(
            motion_loop,
            config.motion.cycle_hz,
            Arc::clone(&running),
            debug_log.clone(),
        );

        let slam_loop = SlamLoop::new(
            config,
            create_lidar(&config.slam),
            odom_rx,
            action_rx,
            Arc::clone(&map),
            Arc::clone(&pose),
        );
        let slam = SlamThread::spawn(
            slam_loop,
            config.slam.cycle_hz,
            Arc::clone(&running),
            debug_log,
        );

        info!(
            "stack running: motion {:.0} Hz, slam {:.0} Hz, map {}x{} cells",
            config.motion.cycle_hz, config.slam.cycle_hz, config.slam.map_size, config.slam.map_size,
        );

        Self {
            running,
            motor_tx,
            action_tx,
            map,
            pose,
            motion,
            slam,
            degraded_logged: false,
        }
    }

    /// Sender for velocity commands (the external interface's input seam).
    pub fn motor_sender(&self) -> QueueSender<VelocityCommand> {
        self.motor_tx.clone()
    }

    /// Sender for control actions.
    pub fn action_sender(&self) -> QueueSender<ControlAction> {
        self.action_tx.clone()
    }

    /// The shared occupancy-grid buffer (read side).
    pub fn map(&self) -> Arc<SharedMap> {
        Arc::clone(&self.map)
    }

    /// Latest published pose.
    pub fn pose(&self) -> Pose2D {
        self.pose.get()
    }

    /// Shutdown flag, for wiring into a signal handler.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Current loop health.
    pub fn health(&mut self) -> LoopHealth {
        let health = LoopHealth {
            motion_alive: !self.motion.is_finished(),
            slam_alive: !self.slam.is_finished(),
        };
        if !health.all_alive() && !self.degraded_logged {
            warn!(
                "running degraded: motion alive={}, slam alive={}",
                health.motion_alive, health.slam_alive
            );
            self.degraded_logged = true;
        }
        health
    }

    /// Block until the shutdown flag clears, monitoring loop health.
    pub fn run_until_shutdown(&mut self) {
        let check_interval = Duration::from_millis(500);
        while self.running.load(Ordering::Relaxed) {
            std::thread::sleep(check_interval);
            self.health();
        }
    }

    /// Clear the running flag; both loops exit within one tick.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Shut down and wait for both loops to finish.
    pub fn join(self) {
        self.shutdown();
        if self.motion.join().is_err() {
            warn!("motion thread panicked");
        }
        if self.slam.join().is_err() {
            warn!("slam thread panicked");
        }
        info!("stack stopped");
    }
}
