use hashbrown::HashMap;
use tilemap_geom::{IVec3, Vec3};

use crate::cell::{Cell, TileId};
use crate::face::Face;
use crate::rotation::FaceRotations;

/// The cell collection plus a position lookup derived from it.
///
/// The collection is the source of truth. The lookup is a cache that only
/// [`VoxelGrid::rebuild_lookup`] refreshes; after a structural edit
/// (insert, remove, re-key) queries may miss until the next rebuild, which
/// lets a batch of edits pay for one O(n) rebuild. A stale lookup never
/// returns the wrong cell: every hit is checked against the cell's key.
///
/// Mutations go through `slots`, a private index kept exact on every edit,
/// so inserts stay O(1) average while the lookup is stale.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    cells: Vec<Cell>,
    lookup: HashMap<IVec3, usize>,
    slots: HashMap<IVec3, usize>,
    stale: bool,
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a grid and its lookup. Later duplicates of a position win.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut grid = Self::new();
        for c in cells {
            grid.set(c);
        }
        grid.rebuild_lookup();
        grid
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in insertion order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// True between a structural edit and the next `rebuild_lookup`.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Clears and repopulates the position lookup from the collection.
    pub fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        self.lookup.reserve(self.cells.len());
        for (i, c) in self.cells.iter().enumerate() {
            self.lookup.insert(c.pos(), i);
        }
        self.stale = false;
        log::trace!("rebuilt cell lookup: {} cells", self.cells.len());
    }

    #[inline]
    fn lookup_index(&self, pos: IVec3) -> Option<usize> {
        self.lookup
            .get(&pos)
            .copied()
            .filter(|&i| self.cells.get(i).is_some_and(|c| c.pos() == pos))
    }

    /// Index of the cell at `pos` regardless of lookup staleness.
    #[inline]
    fn find_index(&self, pos: IVec3) -> Option<usize> {
        self.slots.get(&pos).copied()
    }

    fn reindex_slots(&mut self) {
        self.slots.clear();
        self.slots.reserve(self.cells.len());
        for (i, c) in self.cells.iter().enumerate() {
            self.slots.insert(c.pos(), i);
        }
    }

    /// Cell at `pos`, as far as the lookup knows.
    #[inline]
    pub fn get(&self, pos: IVec3) -> Option<&Cell> {
        self.lookup_index(pos).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn get_mut(&mut self, pos: IVec3) -> Option<&mut Cell> {
        self.lookup_index(pos).map(|i| &mut self.cells[i])
    }

    #[inline]
    pub fn contains(&self, pos: IVec3) -> bool {
        self.lookup_index(pos).is_some()
    }

    /// Cell containing a world-space point.
    #[inline]
    pub fn cell_at_point(&self, point: Vec3) -> Option<&Cell> {
        self.get(IVec3::round(point))
    }

    /// Inserts `cell`, replacing any cell already at its position.
    pub fn set(&mut self, cell: Cell) {
        match self.find_index(cell.pos()) {
            Some(i) => self.cells[i] = cell,
            None => {
                self.slots.insert(cell.pos(), self.cells.len());
                self.cells.push(cell);
                self.stale = true;
            }
        }
    }

    pub fn place_cell(&mut self, pos: IVec3, faces: [Option<TileId>; 6], rot: FaceRotations) {
        self.set(Cell::with_faces(pos, faces, rot));
    }

    /// Removes the cell at `pos`. Remaining cells keep their relative order.
    pub fn remove(&mut self, pos: IVec3) -> Option<Cell> {
        let i = self.slots.remove(&pos)?;
        self.stale = true;
        let removed = self.cells.remove(i);
        for c in &self.cells[i..] {
            if let Some(slot) = self.slots.get_mut(&c.pos()) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.lookup.clear();
        self.slots.clear();
        self.stale = false;
    }

    /// Sets one face of an existing cell; `false` if there is no cell at
    /// `pos` or `normal` is zero.
    pub fn paint_face(
        &mut self,
        pos: IVec3,
        normal: IVec3,
        surface: Option<TileId>,
        quarter_turns: i32,
    ) -> bool {
        let Some(face) = Face::from_grid_normal(normal) else {
            return false;
        };
        match self.find_index(pos) {
            Some(i) => {
                self.cells[i].paint(face, surface, quarter_turns);
                true
            }
            None => false,
        }
    }

    /// Tile on the surface hit at `point` with outward `normal`.
    ///
    /// The owning cell is the one half a cell behind the contact point. The
    /// face is picked by [`Face::from_contact_normal`], which tests x, then
    /// z, then y, so diagonal normals resolve to a side face.
    pub fn surface_at(&self, point: Vec3, normal: Vec3) -> Option<TileId> {
        let cell = self.cell_at_point(point - normal * 0.5)?;
        cell.surface(Face::from_contact_normal(normal))
    }

    /// Inclusive min/max over all cell positions.
    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        let first = self.cells.first()?.pos();
        Some(
            self.cells
                .iter()
                .fold((first, first), |(lo, hi), c| (lo.min(c.pos()), hi.max(c.pos()))),
        )
    }

    /// Places a copy of `faces`/`rot` at every position in the inclusive
    /// box spanned by `a` and `b` (corners in any order).
    pub fn fill_region(
        &mut self,
        a: IVec3,
        b: IVec3,
        faces: [Option<TileId>; 6],
        rot: FaceRotations,
    ) -> usize {
        let (lo, hi) = (a.min(b), a.max(b));
        let mut n = 0;
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                for x in lo.x..=hi.x {
                    self.place_cell(IVec3::new(x, y, z), faces, rot);
                    n += 1;
                }
            }
        }
        n
    }

    /// Removes every cell inside the inclusive box spanned by `a` and `b`.
    pub fn clear_region(&mut self, a: IVec3, b: IVec3) -> usize {
        let (lo, hi) = (a.min(b), a.max(b));
        let before = self.cells.len();
        self.cells.retain(|c| {
            let p = c.pos();
            !(p.x >= lo.x && p.x <= hi.x && p.y >= lo.y && p.y <= hi.y && p.z >= lo.z && p.z <= hi.z)
        });
        let removed = before - self.cells.len();
        if removed > 0 {
            self.reindex_slots();
            self.stale = true;
        }
        removed
    }

    /// Re-keys every cell. Used by the transforms.
    pub(crate) fn rekey(&mut self, mut f: impl FnMut(&mut Cell)) {
        for c in &mut self.cells {
            f(c);
        }
        self.reindex_slots();
        self.stale = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i32, y: i32, z: i32) -> Cell {
        Cell::uniform(IVec3::new(x, y, z), TileId(1))
    }

    #[test]
    fn lookup_goes_stale_until_rebuilt() {
        let mut g = VoxelGrid::new();
        assert!(g.get(IVec3::ZERO).is_none());
        g.set(cell(0, 0, 0));
        assert!(g.is_stale());
        assert!(g.get(IVec3::ZERO).is_none());
        g.rebuild_lookup();
        assert!(!g.is_stale());
        assert!(g.get(IVec3::ZERO).is_some());
        g.rebuild_lookup();
        assert_eq!(g.len(), 1);
        assert!(g.contains(IVec3::ZERO));
    }

    #[test]
    fn set_replaces_even_when_stale() {
        let mut g = VoxelGrid::new();
        g.set(cell(1, 2, 3));
        g.set(Cell::new(IVec3::new(1, 2, 3)));
        assert_eq!(g.len(), 1);
        g.rebuild_lookup();
        assert_eq!(g.get(IVec3::new(1, 2, 3)).unwrap().surface(Face::PosY), None);
    }

    #[test]
    fn stale_lookup_never_returns_a_different_cell() {
        let mut g = VoxelGrid::from_cells([cell(0, 0, 0), cell(1, 0, 0), cell(2, 0, 0)]);
        g.remove(IVec3::new(0, 0, 0));
        // Indices shifted; the old entry for (1,0,0) now points at (2,0,0).
        assert!(g.get(IVec3::new(1, 0, 0)).is_none());
        g.rebuild_lookup();
        assert_eq!(g.get(IVec3::new(1, 0, 0)).unwrap().pos(), IVec3::new(1, 0, 0));
    }

    #[test]
    fn paint_requires_existing_cell() {
        let mut g = VoxelGrid::from_cells([cell(0, 0, 0)]);
        assert!(!g.paint_face(IVec3::new(5, 0, 0), IVec3::UP, Some(TileId(2)), 1));
        assert!(!g.paint_face(IVec3::ZERO, IVec3::ZERO, Some(TileId(2)), 1));
        assert!(g.paint_face(IVec3::ZERO, IVec3::UP, Some(TileId(2)), 5));
        let c = g.get(IVec3::ZERO).unwrap();
        assert_eq!(c.surface(Face::PosY), Some(TileId(2)));
        assert_eq!(c.rotation(Face::PosY), 1);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn surface_at_resolves_cell_behind_contact() {
        let mut c = Cell::new(IVec3::new(2, 0, 0));
        c.paint(Face::PosX, Some(TileId(7)), 0);
        c.paint(Face::PosY, Some(TileId(8)), 0);
        let g = VoxelGrid::from_cells([c]);
        assert_eq!(
            g.surface_at(Vec3::new(2.5, 0.1, 0.2), Vec3::new(1.0, 0.0, 0.0)),
            Some(TileId(7))
        );
        assert_eq!(
            g.surface_at(Vec3::new(2.1, 0.5, 0.0), Vec3::new(0.0, 1.0, 0.0)),
            Some(TileId(8))
        );
        assert_eq!(g.surface_at(Vec3::new(9.5, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)), None);
    }

    #[test]
    fn regions_fill_and_clear_inclusive() {
        let mut g = VoxelGrid::new();
        let n = g.fill_region(IVec3::new(1, 1, 1), IVec3::ZERO, [Some(TileId(3)); 6], FaceRotations::NONE);
        assert_eq!(n, 8);
        assert_eq!(g.len(), 8);
        assert_eq!(g.bounds(), Some((IVec3::ZERO, IVec3::ONE)));
        let removed = g.clear_region(IVec3::ZERO, IVec3::new(1, 0, 1));
        assert_eq!(removed, 4);
        g.rebuild_lookup();
        assert!(!g.contains(IVec3::ZERO));
        assert!(g.contains(IVec3::ONE));
    }

    #[test]
    fn edits_between_rebuilds_keep_positions_unique() {
        let mut g = VoxelGrid::from_cells([cell(0, 0, 0), cell(1, 0, 0), cell(2, 0, 0)]);
        g.remove(IVec3::ZERO);
        g.set(Cell::new(IVec3::new(2, 0, 0)));
        g.clear_region(IVec3::new(1, 0, 0), IVec3::new(1, 0, 0));
        g.set(cell(1, 0, 0));
        assert!(g.paint_face(IVec3::new(2, 0, 0), IVec3::UP, Some(TileId(4)), 0));
        assert_eq!(g.len(), 2);
        g.rebuild_lookup();
        assert_eq!(g.get(IVec3::new(2, 0, 0)).unwrap().surface(Face::PosY), Some(TileId(4)));
        assert_eq!(g.get(IVec3::new(2, 0, 0)).unwrap().surface(Face::PosX), None);
        assert!(g.contains(IVec3::new(1, 0, 0)));
    }

    #[test]
    fn large_fill_stays_linear() {
        // 128x8x128 cells; a per-insert scan would make this take minutes.
        let mut g = VoxelGrid::new();
        let n = g.fill_region(IVec3::ZERO, IVec3::new(127, 7, 127), [Some(TileId(1)); 6], FaceRotations::NONE);
        assert_eq!(n, 128 * 8 * 128);
        assert_eq!(g.len(), n);
        let again = g.fill_region(IVec3::ZERO, IVec3::new(127, 0, 127), [None; 6], FaceRotations::NONE);
        assert_eq!(g.len(), n);
        assert_eq!(again, 128 * 128);
        g.rebuild_lookup();
        assert_eq!(g.get(IVec3::new(127, 0, 127)).unwrap().surface(Face::PosY), None);
        assert_eq!(g.get(IVec3::new(127, 1, 127)).unwrap().surface(Face::PosY), Some(TileId(1)));
    }

    #[test]
    fn empty_grid_has_no_bounds() {
        assert_eq!(VoxelGrid::new().bounds(), None);
    }
}
