use super::Grid;
use crate::cell::{next_state, Cell};

impl Grid {
    /// Recomputes every cell from scratch. Writes fresh bytes, so any
    /// bookkeeping flags left by other algorithms are discarded.
    pub(super) fn step_basic(&self, curr: &[u8], next: &mut [u8]) {
        let w = self.width();
        for y in 0..self.height() {
            for x in 0..w {
                let idx = x + y * w;
                let alive = Cell(curr[idx]).is_alive();
                let will_live = next_state(alive, self.count_neighbours(curr, x, y));
                let mut cell = Cell::DEAD;
                cell.set_alive(will_live);
                cell.set_changed(will_live != alive);
                next[idx] = cell.0;
            }
        }
    }
}
