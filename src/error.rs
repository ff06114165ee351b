use thiserror::Error;

/// Errors produced by grid and quadtree construction and the quad
/// operations that validate their child slot position.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Memory for cell buffers or quadtree nodes could not be obtained.
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    /// A quad child slot position outside 0..4 was passed in. Accepting it
    /// silently would flip a metadata bit belonging to another slot.
    #[error("child slot position {0} out of range (quads have 4 slots)")]
    InvalidPosition(usize),
}
