//! CPU mesh generation for the cell grid: a face-culled render mesh, a
//! matching collision mesh, and greedy box merging for collision proxies.
#![forbid(unsafe_code)]

mod boxes;
mod builder;
mod constants;
mod face_quad;
mod mesh_build;

pub use boxes::{BoxMerger, CellBox};
pub use builder::{MeshBuilder, TileRects, rotate_uvs};
pub use face_quad::{EMIT_ORDER, QUAD_INDICES, face_corners};
pub use mesh_build::{CollisionBuild, MeshBuffers, MeshBuild};
