//! Shared constants for tilemap-mesh.

// Bitset configuration (u64-based)
pub(crate) const BITS_PER_WORD: usize = 64;
pub(crate) const WORD_INDEX_SHIFT: usize = 6; // log2(64)
pub(crate) const WORD_INDEX_MASK: usize = 63; // (1<<6) - 1

// Bounding volumes above this many cells per occupied cell merge sparsely
pub(crate) const SPARSE_VOLUME_RATIO: usize = 16;

// Per-vertex colour of the render mesh
pub(crate) const WHITE: [u8; 4] = [255, 255, 255, 255];
