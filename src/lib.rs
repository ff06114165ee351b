#![warn(clippy::all, clippy::cargo)]

mod cell;
mod config;
mod error;
mod grid;
mod quadtree;
mod sync;
mod utils;

pub use cell::{next_state, Cell, CHANGE_MASK, CHECK_MASK, NEIGHBOURS_MASK, STATE_MASK};
pub use config::{get_config, set_quad_arena_cap_log2, ConfigSnapshot};
pub use error::Error;
pub use grid::{Algorithm, Grid, ReadGuard};
pub use quadtree::{NodeIdx, QuadArena, QuadNode, CHECK_MASK_ALL, EXIST_MASK_ALL};
pub use sync::{SpinGuard, SpinLock};
pub use utils::Topology;
