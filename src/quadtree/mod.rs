mod node;

pub use node::{NodeIdx, QuadNode, CHECK_MASK_ALL, EXIST_MASK_ALL};

use crate::cell::Cell;
use crate::config::get_config;
use crate::error::Error;
use crate::sync::SpinLock;
use anyhow::Result;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

const CHUNK_SIZE: usize = 1 << 12;

struct AllocState {
    /// Number of slots handed out so far, including the reserved sentinel.
    len: usize,
    /// Slots released by `destroy`, reused before the arena grows.
    free: Vec<NodeIdx>,
}

/// Chunked arena holding every node of one quadtree.
///
/// Nodes never move: storage grows by whole chunks and the chunk table's
/// capacity is fixed at construction, so a `NodeIdx` handed out once stays
/// valid until the node is destroyed. Each slot carries its own spinlock;
/// any access to a node's metadata or child array goes through it, which
/// lets disjoint subtrees be mutated concurrently. Operations that touch a
/// node and its parent lock the parent first, always.
pub struct QuadArena {
    /// Fixed-size chunk table; cells past `chunk_count` are still `None`.
    chunks: Box<[UnsafeCell<Option<Box<[SpinLock<QuadNode>]>>>]>,
    /// Number of published chunks. Stored with Release after a cell is
    /// written, loaded with Acquire before a cell is read, so `slot` never
    /// observes a half-written chunk.
    chunk_count: AtomicUsize,
    alloc: SpinLock<AllocState>,
    cap: usize,
}

// Sound: the chunk table never moves, chunk cells are written once (by
// `init`, serialized by the alloc lock) and published through the
// Release/Acquire pair on `chunk_count`; node mutation is guarded by the
// per-slot locks.
unsafe impl Sync for QuadArena {}

fn new_chunk() -> Result<Box<[SpinLock<QuadNode>]>, Error> {
    let mut chunk = Vec::new();
    chunk
        .try_reserve_exact(CHUNK_SIZE)
        .map_err(|_| Error::Allocation {
            bytes: CHUNK_SIZE * std::mem::size_of::<SpinLock<QuadNode>>(),
        })?;
    chunk.resize_with(CHUNK_SIZE, SpinLock::default);
    Ok(chunk.into_boxed_slice())
}

impl QuadArena {
    /// Creates an arena capped at `2^quad_arena_cap_log2` nodes (see
    /// [`crate::set_quad_arena_cap_log2`]).
    pub fn new() -> Result<Self> {
        Self::with_capacity_log2(get_config().quad_arena_cap_log2)
    }

    pub fn with_capacity_log2(cap_log2: u32) -> Result<Self> {
        let cap = 1usize << cap_log2;
        let max_chunks = cap.div_ceil(CHUNK_SIZE);
        let mut table = Vec::new();
        table
            .try_reserve_exact(max_chunks)
            .map_err(|_| Error::Allocation {
                bytes: max_chunks * std::mem::size_of::<usize>(),
            })?;
        table.resize_with(max_chunks, || UnsafeCell::new(None));
        // Slot 0 is the reserved null sentinel.
        table[0] = UnsafeCell::new(Some(new_chunk()?));
        debug!(cap, "quad arena created");
        Ok(Self {
            chunks: table.into_boxed_slice(),
            chunk_count: AtomicUsize::new(1),
            alloc: SpinLock::new(AllocState {
                len: 1,
                free: Vec::new(),
            }),
            cap,
        })
    }

    #[inline]
    fn slot(&self, idx: NodeIdx) -> &SpinLock<QuadNode> {
        debug_assert!(!idx.is_null());
        let chunk_idx = idx.0 as usize / CHUNK_SIZE;
        // Acquire pairs with the Release store in `init`: a chunk cell is
        // fully written before the count covering it is visible.
        assert!(chunk_idx < self.chunk_count.load(Ordering::Acquire));
        // Safety: the cell was published by the check above and is never
        // written again; the table itself never moves.
        unsafe {
            let chunk = (*self.chunks[chunk_idx].get()).as_deref().unwrap_unchecked();
            &chunk[idx.0 as usize % CHUNK_SIZE]
        }
    }

    /// Allocates a node with zero metadata and four empty slots. The slot
    /// index within the parent is recorded when the node is installed via
    /// [`QuadArena::set_child`].
    pub fn init(&self, x: u32, y: u32, level: u8, parent: NodeIdx) -> Result<NodeIdx> {
        let idx = {
            let mut alloc = self.alloc.lock();
            if let Some(idx) = alloc.free.pop() {
                idx
            } else {
                if alloc.len == self.cap {
                    return Err(Error::Allocation {
                        bytes: std::mem::size_of::<SpinLock<QuadNode>>(),
                    }
                    .into());
                }
                if alloc.len % CHUNK_SIZE == 0 {
                    let count = self.chunk_count.load(Ordering::Relaxed);
                    // Safety: only `init` writes chunk cells, serialized by
                    // the alloc lock we hold; `count < chunks.len()` because
                    // `len < cap`.
                    unsafe { *self.chunks[count].get() = Some(new_chunk()?) };
                    self.chunk_count.store(count + 1, Ordering::Release);
                    trace!(len = alloc.len, "quad arena grew by one chunk");
                }
                let idx = NodeIdx(alloc.len as u32);
                alloc.len += 1;
                idx
            }
        };
        *self.slot(idx).lock() = QuadNode {
            level,
            x,
            y,
            parent,
            ..QuadNode::default()
        };
        Ok(idx)
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        let alloc = self.alloc.lock();
        alloc.len - 1 - alloc.free.len()
    }

    /// Installs (or, with `NodeIdx::NULL`, clears) the child reference at
    /// slot `pos`, keeping the existence bit and the installed child's
    /// `parent`/`pos_in_parent` fields consistent.
    pub fn set_child(&self, node: NodeIdx, child: NodeIdx, pos: usize) -> Result<(), Error> {
        check_pos(pos)?;
        let mut n = self.slot(node).lock();
        n.children[pos] = child;
        n.set_exist(pos, !child.is_null());
        if !child.is_null() {
            // Parent before child, per the fixed acquisition order.
            let mut c = self.slot(child).lock();
            debug_assert_eq!(c.level + 1, n.level);
            c.parent = node;
            c.pos_in_parent = pos as u8;
        }
        Ok(())
    }

    /// Sets or clears the check bit for slot `pos` in `node`'s own
    /// metadata. Marking a node itself dirty means calling this on its
    /// parent with the node's `pos_in_parent`.
    pub fn set_check(&self, node: NodeIdx, pos: usize, value: bool) -> Result<(), Error> {
        check_pos(pos)?;
        self.slot(node).lock().set_dirty(pos, value);
        Ok(())
    }

    /// Whether `node` is marked dirty, read from bit `pos_in_parent` of its
    /// parent's metadata. A root has no parent to record its status, so it
    /// is always considered dirty.
    pub fn get_check(&self, node: NodeIdx) -> bool {
        let (parent, pos) = {
            let n = self.slot(node).lock();
            (n.parent, n.pos_in_parent)
        };
        if parent.is_null() {
            return true;
        }
        self.slot(parent).lock().child_dirty(pos as usize)
    }

    /// Copy of the node taken under its lock, for traversal: the caller
    /// enumerates occupied and dirty slots through [`QuadNode`]'s
    /// accessors.
    pub fn snapshot(&self, node: NodeIdx) -> QuadNode {
        *self.slot(node).lock()
    }

    pub fn child(&self, node: NodeIdx, pos: usize) -> Result<NodeIdx, Error> {
        check_pos(pos)?;
        Ok(self.slot(node).lock().children[pos])
    }

    pub fn child_exists(&self, node: NodeIdx, pos: usize) -> Result<bool, Error> {
        check_pos(pos)?;
        Ok(self.slot(node).lock().child_exists(pos))
    }

    /// Leaf cell payload of a level-0 node.
    pub fn leaf(&self, node: NodeIdx) -> Cell {
        self.slot(node).lock().leaf
    }

    pub fn set_leaf(&self, node: NodeIdx, value: Cell) {
        let mut n = self.slot(node).lock();
        debug_assert!(n.is_leaf());
        n.leaf = value;
    }

    /// Recursively releases the subtree rooted at `node`, children before
    /// the node that owns them. Never touches the parent or siblings; use
    /// [`QuadArena::remove_child`] to detach and release in one call.
    /// Returns the number of nodes released.
    pub fn destroy(&self, node: NodeIdx) -> usize {
        let children = {
            let mut n = self.slot(node).lock();
            let children = n.children;
            n.children = [NodeIdx::NULL; 4];
            n.metadata = 0;
            children
        };
        let mut freed = 0;
        for child in children {
            if !child.is_null() {
                freed += self.destroy(child);
            }
        }
        self.alloc.lock().free.push(node);
        freed + 1
    }

    /// Clears slot `pos` of `node` (existence and check bit included) and
    /// releases the detached subtree. Returns the number of nodes released.
    pub fn remove_child(&self, node: NodeIdx, pos: usize) -> Result<usize, Error> {
        check_pos(pos)?;
        let child = {
            let mut n = self.slot(node).lock();
            let child = n.children[pos];
            n.children[pos] = NodeIdx::NULL;
            n.set_exist(pos, false);
            n.set_dirty(pos, false);
            child
        };
        if child.is_null() {
            Ok(0)
        } else {
            Ok(self.destroy(child))
        }
    }
}

#[inline]
fn check_pos(pos: usize) -> Result<(), Error> {
    if pos < 4 {
        Ok(())
    } else {
        Err(Error::InvalidPosition(pos))
    }
}
