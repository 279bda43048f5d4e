//! Bulk re-keying of cell positions. Every transform ends with a lookup
//! rebuild; rebuilding meshes is left to the caller.

use tilemap_geom::IVec3;

use crate::face::Face;
use crate::grid::VoxelGrid;

impl VoxelGrid {
    pub fn shift(&mut self, offset: IVec3) {
        self.rekey(|c| c.set_pos(c.pos() + offset));
        self.rebuild_lookup();
    }

    /// Mirrors positions across the YZ plane. Face references are not swapped.
    pub fn flip_x(&mut self) {
        self.rekey(|c| {
            let p = c.pos();
            c.set_pos(IVec3::new(-p.x, p.y, p.z));
        });
        self.rebuild_lookup();
    }

    /// Mirrors positions across the XY plane. Face references are not swapped.
    pub fn flip_z(&mut self) {
        self.rekey(|c| {
            let p = c.pos();
            c.set_pos(IVec3::new(p.x, p.y, -p.z));
        });
        self.rebuild_lookup();
    }

    /// Quarter turn about +Y: `(x, y, z) -> (z, y, -x)`. Side face tiles
    /// move with the cell (front to right, right to back, and so on); face
    /// rotations stay where they are.
    pub fn rotate_cw(&mut self) {
        self.rekey(|c| {
            let p = c.pos();
            c.set_pos(IVec3::new(p.z, p.y, -p.x));
            c.remap_faces(Face::rotated_cw);
        });
        self.rebuild_lookup();
    }

    /// Inverse of [`VoxelGrid::rotate_cw`]: `(x, y, z) -> (-z, y, x)`.
    pub fn rotate_ccw(&mut self) {
        self.rekey(|c| {
            let p = c.pos();
            c.set_pos(IVec3::new(-p.z, p.y, p.x));
            c.remap_faces(Face::rotated_ccw);
        });
        self.rebuild_lookup();
    }

    /// Moves the bounding-box center (rounded toward the min corner) to the origin.
    pub fn center_origin(&mut self) {
        if let Some((lo, hi)) = self.bounds() {
            let half = hi - lo;
            let center = lo + IVec3::new(half.x / 2, half.y / 2, half.z / 2);
            self.shift(-center);
        }
    }

    /// Like [`VoxelGrid::center_origin`] on x and z; on y the lowest layer
    /// moves to zero so the footprint rests on the origin.
    pub fn bottom_center_origin(&mut self) {
        if let Some((lo, hi)) = self.bounds() {
            let half = hi - lo;
            let center = IVec3::new(lo.x + half.x / 2, lo.y, lo.z + half.z / 2);
            self.shift(-center);
        }
    }
}
