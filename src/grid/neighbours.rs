use super::{Algorithm, Grid};
use crate::cell::{next_state, Cell};

impl Grid {
    /// Evaluates dirty cells against their stored neighbour count instead of
    /// recounting. A flip patches all neighbours' counts with a ±1 delta in
    /// the next generation and marks them (and the flipped cell) for
    /// re-evaluation. Deltas from several flips in one neighbourhood
    /// accumulate on top of the carried-over counts, so the stored count
    /// always equals the old count plus the sum of this step's flips.
    pub(super) fn step_neighbours(&self, curr: &[u8], next: &mut [u8]) {
        debug_assert_eq!(self.algorithm(), Algorithm::Neighbours);
        for (dst, &src) in next.iter_mut().zip(curr) {
            *dst = Cell(src).without_step_flags().0;
        }

        let w = self.width();
        for y in 0..self.height() {
            for x in 0..w {
                let idx = x + y * w;
                let cell = Cell(curr[idx]);
                if !cell.needs_check() {
                    continue;
                }
                let alive = cell.is_alive();
                let will_live = next_state(alive, cell.neighbours());
                if will_live == alive {
                    continue;
                }
                let mut flipped = Cell(next[idx]);
                flipped.set_alive(will_live);
                flipped.set_changed(true);
                flipped.set_check(true);
                next[idx] = flipped.0;

                let delta = if will_live { 1 } else { -1 };
                self.for_each_neighbour(x, y, |nidx| {
                    let mut n = Cell(next[nidx]);
                    n.add_neighbours(delta);
                    n.set_check(true);
                    next[nidx] = n.0;
                });
            }
        }
    }
}
