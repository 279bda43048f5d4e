use serde::{Deserialize, Serialize};
use tilemap_geom::IVec3;

use crate::face::Face;
use crate::rotation::FaceRotations;

/// Reference to a tile surface owned by the caller's tile catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

/// Occupancy record for one grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pos: IVec3,
    faces: [Option<TileId>; 6],
    rot: FaceRotations,
}

impl Cell {
    /// Occupied cell with no textured faces. It still blocks movement.
    pub fn new(pos: IVec3) -> Self {
        Self {
            pos,
            faces: [None; 6],
            rot: FaceRotations::NONE,
        }
    }

    pub fn with_faces(pos: IVec3, faces: [Option<TileId>; 6], rot: FaceRotations) -> Self {
        Self { pos, faces, rot }
    }

    /// Every face shows `tile`, unrotated.
    pub fn uniform(pos: IVec3, tile: TileId) -> Self {
        Self::with_faces(pos, [Some(tile); 6], FaceRotations::NONE)
    }

    #[inline]
    pub fn pos(&self) -> IVec3 {
        self.pos
    }

    // Only the grid moves cells; a free-standing setter would let two
    // cells share a key.
    #[inline]
    pub(crate) fn set_pos(&mut self, pos: IVec3) {
        self.pos = pos;
    }

    #[inline]
    pub fn surface(&self, face: Face) -> Option<TileId> {
        self.faces[face.index()]
    }

    #[inline]
    pub fn rotation(&self, face: Face) -> u8 {
        self.rot.get(face)
    }

    #[inline]
    pub fn faces(&self) -> &[Option<TileId>; 6] {
        &self.faces
    }

    #[inline]
    pub fn rotations(&self) -> FaceRotations {
        self.rot
    }

    #[inline]
    pub fn set_surface(&mut self, face: Face, surface: Option<TileId>) {
        self.faces[face.index()] = surface;
    }

    #[inline]
    pub fn set_rotation(&mut self, face: Face, quarter_turns: i32) {
        self.rot.set(face, quarter_turns);
    }

    /// Replaces one face's tile and rotation together.
    pub fn paint(&mut self, face: Face, surface: Option<TileId>, quarter_turns: i32) {
        self.set_surface(face, surface);
        self.set_rotation(face, quarter_turns);
    }

    /// Moves every face's tile to `map(face)`. Rotations stay in their
    /// slots. `map` must be a permutation of the six faces.
    pub(crate) fn remap_faces(&mut self, map: impl Fn(Face) -> Face) {
        let old_faces = self.faces;
        for f in Face::ALL {
            self.faces[map(f).index()] = old_faces[f.index()];
        }
    }
}
