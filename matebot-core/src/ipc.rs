//! IPC fabric binding the control loops together.
//!
//! Three unidirectional queues (motor commands, odometry, control actions)
//! plus one shared buffer holding the latest occupancy grid:
//!
//! - Queues never block: producers enqueue freely, consumers drain to empty
//!   each tick so stale state is discarded instead of piling up.
//! - The map buffer is written by exactly one loop. Each publish swaps in a
//!   freshly built immutable snapshot, so a reader either sees the previous
//!   grid or the new one in full - never a torn mix, including across a map
//!   reset.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};

/// Producer half of a loop queue.
///
/// Cloneable; multiple producers may feed the same queue.
#[derive(Debug, Clone)]
pub struct QueueSender<T> {
    tx: crossbeam_channel::Sender<T>,
}

impl<T> QueueSender<T> {
    /// Enqueue a message. Never blocks.
    ///
    /// Returns false if the consumer side is gone (its loop has exited);
    /// the message is dropped, which is the degraded-but-running behavior
    /// the rest of the stack expects.
    pub fn send(&self, msg: T) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// Consumer half of a loop queue.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: crossbeam_channel::Receiver<T>,
}

impl<T> QueueReceiver<T> {
    /// Take one pending message, if any. Empty is a normal result.
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending messages in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Drain all pending messages and keep only the most recent.
    pub fn drain_latest(&self) -> Option<T> {
        let mut latest = None;
        while let Ok(msg) = self.rx.try_recv() {
            latest = Some(msg);
        }
        latest
    }
}

/// Create a new unbounded loop queue.
pub fn queue<T>() -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Shared occupancy-grid buffer: one writer, any number of readers.
///
/// Holds exactly `side * side` bytes, row-major, one byte per cell.
#[derive(Debug)]
pub struct SharedMap {
    side: usize,
    cells: RwLock<Arc<[u8]>>,
}

impl SharedMap {
    /// Create a zeroed (all-unknown) map buffer of `side * side` cells.
    pub fn new(side: usize) -> Self {
        Self {
            side,
            cells: RwLock::new(vec![0u8; side * side].into()),
        }
    }

    /// Grid side length in cells.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Replace the published grid with a new snapshot.
    ///
    /// The buffer must be exactly `side * side` bytes. Readers holding an
    /// earlier snapshot are unaffected.
    pub fn publish(&self, cells: &[u8]) -> Result<()> {
        let expected = self.side * self.side;
        if cells.len() != expected {
            return Err(Error::MapSize {
                expected,
                actual: cells.len(),
            });
        }
        *self.cells.write() = Arc::from(cells);
        Ok(())
    }

    /// Get the latest published grid.
    ///
    /// The returned snapshot is immutable; it stays valid (and unchanged)
    /// however many publishes or resets happen afterwards.
    pub fn snapshot(&self) -> Arc<[u8]> {
        Arc::clone(&self.cells.read())
    }
}

/// Latest-value cell for telemetry state (e.g. the robot pose).
///
/// A writer overwrites the slot; readers copy the current value without
/// blocking the writer for longer than the swap.
#[derive(Debug, Default)]
pub struct Latest<T> {
    slot: Mutex<T>,
}

impl<T: Clone> Latest<T> {
    /// Create a cell holding an initial value.
    pub fn new(value: T) -> Self {
        Self {
            slot: Mutex::new(value),
        }
    }

    /// Overwrite the stored value.
    pub fn set(&self, value: T) {
        *self.slot.lock() = value;
    }

    /// Copy out the stored value.
    pub fn get(&self) -> T {
        self.slot.lock().clone()
    }
}
