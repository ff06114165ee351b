use super::Grid;
use crate::cell::{next_state, Cell};

impl Grid {
    /// Recomputes only the cells marked needs-check by a flip in their
    /// neighbourhood last generation. Quiescent regions are carried over
    /// untouched, which is valid because a cell's neighbour count can only
    /// change if one of its neighbours changed, and every flip marks all 8
    /// neighbours.
    pub(super) fn step_basic_diff(&self, curr: &[u8], next: &mut [u8]) {
        // Carry state forward; the check flags below are consumed and the
        // change flags describe this step only.
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
                let will_live = next_state(alive, self.count_neighbours(curr, x, y));
                if will_live == alive {
                    continue;
                }
                let mut flipped = Cell(next[idx]);
                flipped.set_alive(will_live);
                flipped.set_changed(true);
                flipped.set_check(true);
                next[idx] = flipped.0;
                self.for_each_neighbour(x, y, |nidx| {
                    let mut n = Cell(next[nidx]);
                    n.set_check(true);
                    next[nidx] = n.0;
                });
            }
        }
    }
}
