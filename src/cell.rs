/// Mask of the bit representing whether the cell is alive.
pub const STATE_MASK: u8 = 1 << 7;
/// Mask of the bit representing whether the cell needs to be checked.
pub const CHECK_MASK: u8 = 1 << 6;
/// Mask of the bit indicating whether the cell changed value this step.
pub const CHANGE_MASK: u8 = 1 << 5;
/// Mask of the payload bits. The NEIGHBOURS algorithm stores the running
/// live-neighbour count (0..=8) here; other algorithms leave it zero.
pub const NEIGHBOURS_MASK: u8 = 0x1F;

/// One packed cell of the dense grid.
///
/// The raw byte is part of the public surface: renderers consume the
/// row-major cell array directly and only look at the top bit. Everything
/// else goes through the accessors so the bit layout stays an internal
/// detail.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell(pub u8);

impl Cell {
    pub const DEAD: Cell = Cell(0);

    #[inline]
    pub fn is_alive(self) -> bool {
        self.0 & STATE_MASK != 0
    }

    #[inline]
    pub fn set_alive(&mut self, alive: bool) {
        if alive {
            self.0 |= STATE_MASK;
        } else {
            self.0 &= !STATE_MASK;
        }
    }

    #[inline]
    pub fn needs_check(self) -> bool {
        self.0 & CHECK_MASK != 0
    }

    #[inline]
    pub fn set_check(&mut self, value: bool) {
        if value {
            self.0 |= CHECK_MASK;
        } else {
            self.0 &= !CHECK_MASK;
        }
    }

    #[inline]
    pub fn has_changed(self) -> bool {
        self.0 & CHANGE_MASK != 0
    }

    #[inline]
    pub fn set_changed(&mut self, value: bool) {
        if value {
            self.0 |= CHANGE_MASK;
        } else {
            self.0 &= !CHANGE_MASK;
        }
    }

    /// Stored live-neighbour count (NEIGHBOURS algorithm payload).
    #[inline]
    pub fn neighbours(self) -> u8 {
        self.0 & NEIGHBOURS_MASK
    }

    #[inline]
    pub fn set_neighbours(&mut self, count: u8) {
        debug_assert!(count <= 8);
        self.0 = (self.0 & !NEIGHBOURS_MASK) | (count & NEIGHBOURS_MASK);
    }

    /// Applies a ±1 delta to the stored neighbour count.
    #[inline]
    pub fn add_neighbours(&mut self, delta: i8) {
        let count = (self.neighbours() as i8 + delta) as u8;
        debug_assert!(count <= 8);
        self.set_neighbours(count);
    }

    /// Clears the per-step bookkeeping flags, keeping state and payload.
    #[inline]
    pub fn without_step_flags(self) -> Cell {
        Cell(self.0 & !(CHECK_MASK | CHANGE_MASK))
    }
}

/// The standard birth/survival rule (B3/S23).
#[inline]
pub fn next_state(alive: bool, neighbours: u8) -> bool {
    if alive {
        neighbours == 2 || neighbours == 3
    } else {
        neighbours == 3
    }
}
