//! Occupancy grid map.
//!
//! A square grid of tri-state cells stored as one byte each, row-major.
//! The world frame spans `[0, side * resolution)` on both axes; the robot
//! starts at the center cell. Dimensions and resolution are fixed for the
//! life of the process.

use matebot_core::config::SlamConfig;

/// Cell belief states and their byte encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CellState {
    /// Never observed
    Unknown = 0,
    /// Observed free space
    Free = 127,
    /// Obstacle (or the robot marker)
    Occupied = 255,
}

impl CellState {
    /// Decode a raw cell byte. Reserved values map to their state, anything
    /// else counts as occupied.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => CellState::Unknown,
            127 => CellState::Free,
            _ => CellState::Occupied,
        }
    }
}

/// 2D occupancy grid.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    /// Grid cells, row-major: index = cy * side + cx
    cells: Vec<u8>,
    /// Side length in cells
    side: usize,
    /// Meters per cell
    resolution: f32,
}

impl OccupancyGrid {
    /// Create an all-unknown grid.
    pub fn new(side: usize, resolution: f32) -> Self {
        Self {
            cells: vec![CellState::Unknown as u8; side * side],
            side,
            resolution,
        }
    }

    /// Build from the SLAM configuration.
    pub fn from_config(config: &SlamConfig) -> Self {
        Self::new(config.map_size, config.resolution)
    }

    /// Side length in cells.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Meters per cell.
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Raw cell bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Convert world coordinates to cell indices.
    ///
    /// Returns `None` outside `[0, side * resolution)` on either axis.
    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let cx = (x / self.resolution) as usize;
        let cy = (y / self.resolution) as usize;
        if cx < self.side && cy < self.side {
            Some((cx, cy))
        } else {
            None
        }
    }

    /// State of the cell containing a world point; `Unknown` out of bounds.
    pub fn state_at(&self, x: f32, y: f32) -> CellState {
        match self.world_to_cell(x, y) {
            Some((cx, cy)) => CellState::from_byte(self.cells[cy * self.side + cx]),
            None => CellState::Unknown,
        }
    }

    /// Set the cell containing a world point. Out-of-bounds points are
    /// silently dropped; they are expected from long or noisy rays.
    pub fn set_world(&mut self, x: f32, y: f32, state: CellState) {
        if let Some((cx, cy)) = self.world_to_cell(x, y) {
            self.cells[cy * self.side + cx] = state as u8;
        }
    }

    /// Mark a disk of `radius` meters around a world point as free,
    /// clipped to the grid bounds.
    pub fn mark_free_disk(&mut self, x: f32, y: f32, radius: f32) {
        let Some((cx, cy)) = self.world_to_cell(x, y) else {
            return;
        };
        let r = (radius / self.resolution) as isize;
        let r_sq = r * r;
        let (cx, cy) = (cx as isize, cy as isize);

        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r_sq {
                    continue;
                }
                let (px, py) = (cx + dx, cy + dy);
                if px >= 0 && py >= 0 && (px as usize) < self.side && (py as usize) < self.side {
                    self.cells[py as usize * self.side + px as usize] = CellState::Free as u8;
                }
            }
        }
    }

    /// Redraw the robot marker: a 2x2 occupied block at the robot's cell so
    /// the display can always locate it, even over stale map data.
    pub fn mark_robot(&mut self, x: f32, y: f32) {
        let Some((cx, cy)) = self.world_to_cell(x, y) else {
            return;
        };
        for py in cy.saturating_sub(1)..=cy {
            for px in cx.saturating_sub(1)..=cx {
                self.cells[py * self.side + px] = CellState::Occupied as u8;
            }
        }
    }

    /// Number of occupied cells (marker included).
    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| CellState::from_byte(c) == CellState::Occupied)
            .count()
    }

    /// Clear every cell back to unknown.
    pub fn reset(&mut self) {
        self.cells.fill(CellState::Unknown as u8);
    }
}
