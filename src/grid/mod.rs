mod basic;
mod basic_diff;
mod neighbours;

use crate::cell::{Cell, STATE_MASK};
use crate::error::Error;
use crate::sync::{SpinGuard, SpinLock};
use crate::Topology;
use anyhow::{ensure, Result};
use std::cell::UnsafeCell;
use tracing::{debug, trace};

/// The strategy used for calculating new generations. Chosen once at
/// construction and dispatched on every step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// Recounts every cell's live neighbours from scratch each generation.
    /// O(width * height) per step; the reference algorithm.
    Basic,
    /// Only recomputes cells whose needs-check flag was set by a state flip
    /// in their neighbourhood last generation.
    BasicDiff,
    /// Keeps a running live-neighbour count in each cell's payload bits and
    /// patches it with ±1 deltas when a cell flips. Per-step cost follows
    /// flip activity, not grid area.
    Neighbours,
}

/// Double-buffered dense field of packed cells.
///
/// Two locks guard the state: the write lock serializes everything that
/// mutates cell contents (`step`, `clear`, `set_cell`, `randomize`), the
/// read lock covers traversals of the current generation. `step` computes
/// the next generation into the back buffer under the write lock alone and
/// takes the read lock only for the O(1) buffer swap, so concurrent readers
/// are never blocked by the per-cell work and always observe a complete
/// generation. Direct edits touch the current buffer and therefore hold
/// both locks, write before read, always in that order.
pub struct Grid {
    width: usize,
    height: usize,
    topology: Topology,
    algorithm: Algorithm,
    // Current generation. Readers see only this buffer.
    cells: UnsafeCell<Vec<u8>>,
    // Back buffer: the superseded generation, reused as scratch for the
    // next one. Roles swap at the end of every step.
    cells_prev: UnsafeCell<Vec<u8>>,
    write_lock: SpinLock,
    read_lock: SpinLock,
}

// Sound under the locking discipline documented on the struct.
unsafe impl Sync for Grid {}

/// Offsets of the 8 cells around a cell.
const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

fn alloc_buffer(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

impl Grid {
    /// Creates a grid with all cells dead, clean and unchanged.
    pub fn new(
        width: usize,
        height: usize,
        topology: Topology,
        algorithm: Algorithm,
    ) -> Result<Self> {
        ensure!(width >= 1 && height >= 1, "grid dimensions must be nonzero");
        let size = width * height;
        let grid = Self {
            width,
            height,
            topology,
            algorithm,
            cells: UnsafeCell::new(alloc_buffer(size)?),
            cells_prev: UnsafeCell::new(alloc_buffer(size)?),
            write_lock: SpinLock::new(()),
            read_lock: SpinLock::new(()),
        };
        debug!(width, height, ?topology, ?algorithm, "grid created");
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Advances the field by exactly one generation.
    pub fn step(&self) {
        let _w = self.write_lock.lock();
        // Safety: the write lock excludes every other mutator; readers never
        // touch the back buffer.
        let curr: &[u8] = unsafe { &*self.cells.get() };
        let next: &mut [u8] = unsafe { &mut *self.cells_prev.get() };
        match self.algorithm {
            Algorithm::Basic => self.step_basic(curr, next),
            Algorithm::BasicDiff => self.step_basic_diff(curr, next),
            Algorithm::Neighbours => self.step_neighbours(curr, next),
        }
        // Swap buffer roles under the read lock so a concurrent reader never
        // observes a torn generation.
        let _r = self.read_lock.lock();
        unsafe { std::ptr::swap(self.cells.get(), self.cells_prev.get()) };
    }

    /// Resets every cell to dead/clean/unchanged in both buffers.
    pub fn clear(&self) {
        let _w = self.write_lock.lock();
        let _r = self.read_lock.lock();
        unsafe {
            (*self.cells.get()).fill(0);
            (*self.cells_prev.get()).fill(0);
        }
        trace!("grid cleared");
    }

    /// Directly edits one cell of the current generation, maintaining the
    /// dirty marks (and, for NEIGHBOURS, the stored counts) that the
    /// incremental algorithms rely on.
    pub fn set_cell(&self, x: usize, y: usize, alive: bool) {
        let _w = self.write_lock.lock();
        let _r = self.read_lock.lock();
        let cells = unsafe { &mut *self.cells.get() };
        let idx = x + y * self.width;
        let mut cell = Cell(cells[idx]);
        if cell.is_alive() == alive {
            return;
        }
        cell.set_alive(alive);
        cell.set_changed(true);
        cell.set_check(true);
        cells[idx] = cell.0;

        let delta = if alive { 1 } else { -1 };
        let patch_counts = self.algorithm == Algorithm::Neighbours;
        self.for_each_neighbour(x, y, |nidx| {
            let mut n = Cell(cells[nidx]);
            n.set_check(true);
            if patch_counts {
                n.add_neighbours(delta);
            }
            cells[nidx] = n.0;
        });
    }

    /// Reads one cell of the current generation.
    pub fn get_cell(&self, x: usize, y: usize) -> bool {
        self.read().get(x, y)
    }

    /// Acquires the read lock and exposes the current generation.
    pub fn read(&self) -> ReadGuard<'_> {
        ReadGuard {
            grid: self,
            _guard: self.read_lock.lock(),
        }
    }

    /// Number of live cells in the current generation.
    pub fn population(&self) -> u64 {
        self.read()
            .cells()
            .iter()
            .filter(|&&c| c & STATE_MASK != 0)
            .count() as u64
    }

    /// Fills the field with random cells through `set_cell`, so the
    /// incremental bookkeeping stays consistent.
    ///
    /// `seed` defaults to 42 and `fill_rate` to 0.3.
    pub fn randomize(&self, seed: Option<u64>, fill_rate: Option<f64>) {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        const DEFAULT_SEED: u64 = 42;
        const DEFAULT_FILL_RATE: f64 = 0.3;

        let mut rng = ChaCha8Rng::seed_from_u64(seed.unwrap_or(DEFAULT_SEED));
        let fill_rate = fill_rate.unwrap_or(DEFAULT_FILL_RATE);
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_cell(x, y, rng.gen_bool(fill_rate));
            }
        }
    }

    /// Counts live neighbours of `(x, y)` in `cells` under the grid's
    /// boundary policy.
    fn count_neighbours(&self, cells: &[u8], x: usize, y: usize) -> u8 {
        let (w, h) = (self.width, self.height);
        match self.topology {
            Topology::Torus => {
                let x1 = if x == 0 { w - 1 } else { x - 1 };
                let x2 = if x == w - 1 { 0 } else { x + 1 };
                let y1 = if y == 0 { h - 1 } else { y - 1 };
                let y2 = if y == h - 1 { 0 } else { y + 1 };
                let alive = |x: usize, y: usize| (cells[x + y * w] >> 7) & 1;
                alive(x1, y1)
                    + alive(x, y1)
                    + alive(x2, y1)
                    + alive(x1, y)
                    + alive(x2, y)
                    + alive(x1, y2)
                    + alive(x, y2)
                    + alive(x2, y2)
            }
            Topology::Bounded => {
                let mut count = 0;
                for (dx, dy) in NEIGHBOUR_OFFSETS {
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx >= 0 && nx < w as isize && ny >= 0 && ny < h as isize {
                        count += (cells[nx as usize + ny as usize * w] >> 7) & 1;
                    }
                }
                count
            }
        }
    }

    /// Calls `f` with the linear index of every neighbour of `(x, y)` that
    /// exists under the grid's boundary policy.
    fn for_each_neighbour(&self, x: usize, y: usize, mut f: impl FnMut(usize)) {
        let (w, h) = (self.width as isize, self.height as isize);
        for (dx, dy) in NEIGHBOUR_OFFSETS {
            let mut nx = x as isize + dx;
            let mut ny = y as isize + dy;
            match self.topology {
                Topology::Torus => {
                    nx = nx.rem_euclid(w);
                    ny = ny.rem_euclid(h);
                }
                Topology::Bounded => {
                    if nx < 0 || nx >= w || ny < 0 || ny >= h {
                        continue;
                    }
                }
            }
            f((nx + ny * w) as usize);
        }
    }
}

/// Read-side view of the current generation. Holds the grid's read lock for
/// its whole lifetime; writers can keep stepping concurrently and will only
/// stall on the final buffer swap.
pub struct ReadGuard<'a> {
    grid: &'a Grid,
    _guard: SpinGuard<'a, ()>,
}

impl ReadGuard<'_> {
    /// Raw packed cell array of the current generation, row-major, one byte
    /// per cell, top bit = alive.
    pub fn cells(&self) -> &[u8] {
        // Safety: mutations of the current buffer and the swap both require
        // the read lock, which we hold.
        unsafe { &*self.grid.cells.get() }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        Cell(self.cells()[x + y * self.grid.width]).is_alive()
    }
}
