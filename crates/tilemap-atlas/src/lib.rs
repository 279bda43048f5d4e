//! Row-based texture atlas packing with a one-pixel bleed guard.
#![forbid(unsafe_code)]

mod packer;
mod rect;

pub use packer::{AtlasError, AtlasPacker, PackConfig, PackedAtlas, load_tile_image};
pub use rect::AtlasRect;
