//! Editing facade over the grid, mesher, box merger and tile atlas.
#![forbid(unsafe_code)]

mod catalog;
mod tilemap;

pub use catalog::{CatalogError, TileCatalog, TileSurface};
pub use tilemap::{BoxCollider, Tilemap};
