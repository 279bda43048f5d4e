//! Sparse cell grid: per-face tile references, packed face rotations, the
//! position lookup, and bulk re-keying transforms.
#![forbid(unsafe_code)]

mod cell;
mod face;
mod grid;
mod rotation;
mod transform;

pub use cell::{Cell, TileId};
pub use face::Face;
pub use grid::VoxelGrid;
pub use rotation::FaceRotations;
