use crate::cell::Cell;

/// Mask for all check bits in the metadata of a quad.
pub const CHECK_MASK_ALL: u8 = 0x0F;
/// Mask for all exist bits in the metadata of a quad.
pub const EXIST_MASK_ALL: u8 = 0xF0;

/// Arena handle of a quadtree node. Index 0 is reserved as the null
/// sentinel, so a plain `u32` doubles as an optional non-owning reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    pub const NULL: NodeIdx = NodeIdx(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// A node of the sparse quadtree.
///
/// The metadata byte describes the four child slots: the low nibble holds
/// one check (dirty) bit per slot, the high nibble one existence bit per
/// slot. A node's *own* dirty status is not stored here; it lives in bit
/// `pos_in_parent` of the parent's low nibble, so one byte in the parent
/// fully describes all four children.
#[derive(Clone, Copy, Default)]
pub struct QuadNode {
    /// Level of the quad, 0 at the leaves.
    pub level: u8,
    /// Position at this level's resolution.
    pub x: u32,
    pub y: u32,
    /// Low nibble: check bits of the sub quads. High nibble: exist bits.
    pub metadata: u8,
    /// Sub quads, `NodeIdx::NULL` where empty. At level 1 these refer to
    /// leaf nodes, which carry cell data instead of further children.
    pub children: [NodeIdx; 4],
    /// Non-owning back-reference; `NodeIdx::NULL` at the root.
    pub parent: NodeIdx,
    /// Local position of the quad in its parent.
    pub pos_in_parent: u8,
    /// Packed cell payload, meaningful at level 0.
    pub leaf: Cell,
}

#[inline]
fn check_mask(pos: usize) -> u8 {
    debug_assert!(pos < 4);
    1 << pos
}

#[inline]
fn exist_mask(pos: usize) -> u8 {
    debug_assert!(pos < 4);
    1 << (pos + 4)
}

impl QuadNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    #[inline]
    pub fn child_exists(&self, pos: usize) -> bool {
        self.metadata & exist_mask(pos) != 0
    }

    #[inline]
    pub fn child_dirty(&self, pos: usize) -> bool {
        self.metadata & check_mask(pos) != 0
    }

    #[inline]
    pub(super) fn set_exist(&mut self, pos: usize, value: bool) {
        if value {
            self.metadata |= exist_mask(pos);
        } else {
            self.metadata &= !exist_mask(pos);
        }
    }

    #[inline]
    pub(super) fn set_dirty(&mut self, pos: usize, value: bool) {
        if value {
            self.metadata |= check_mask(pos);
        } else {
            self.metadata &= !check_mask(pos);
        }
    }

    /// Occupied child slots, in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, NodeIdx)> + '_ {
        (0..4).filter_map(|pos| self.child_exists(pos).then_some((pos, self.children[pos])))
    }

    /// Slots whose check bit is set, in slot order.
    pub fn dirty_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..4).filter(|&pos| self.child_dirty(pos))
    }
}
