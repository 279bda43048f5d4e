use image::RgbaImage;
use tilemap_atlas::{AtlasPacker, PackedAtlas};
use tilemap_geom::{IVec3, Vec3};
use tilemap_grid::{Cell, FaceRotations, TileId, VoxelGrid};
use tilemap_mesh::{BoxMerger, CellBox, MeshBuffers, MeshBuilder};

use crate::catalog::{CatalogError, TileCatalog, TileSurface};

/// Box collider proxy in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCollider {
    pub center: Vec3,
    pub size: Vec3,
}

impl From<CellBox> for BoxCollider {
    fn from(b: CellBox) -> Self {
        Self {
            center: b.center(),
            size: b.size(),
        }
    }
}

/// A grid with its tile catalog and the derived mesh, box and atlas state.
///
/// Edits only touch the grid. Nothing is rebuilt implicitly: callers run
/// [`Tilemap::rebuild_lookup`], [`Tilemap::rebuild_mesh`] and
/// [`Tilemap::merge_boxes`] after a batch of edits. Grid transforms are the
/// exception and rebuild the mesh themselves.
#[derive(Debug)]
pub struct Tilemap {
    grid: VoxelGrid,
    catalog: TileCatalog,
    atlas_size: (u32, u32),
    mesher: MeshBuilder,
    merger: BoxMerger,
    boxes: Vec<CellBox>,
    // Change tracking
    rev: u64,
    built_rev: u64,
}

impl Tilemap {
    pub fn new(catalog: TileCatalog) -> Self {
        Self {
            grid: VoxelGrid::new(),
            catalog,
            atlas_size: (0, 0),
            mesher: MeshBuilder::new(),
            merger: BoxMerger::new(),
            boxes: Vec::new(),
            rev: 0,
            built_rev: 0,
        }
    }

    #[inline]
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    #[inline]
    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    #[inline]
    pub fn atlas_size(&self) -> (u32, u32) {
        self.atlas_size
    }

    /// Mesh from the last rebuild.
    #[inline]
    pub fn mesh(&self) -> &MeshBuffers {
        self.mesher.buffers()
    }

    /// Boxes from the last merge.
    #[inline]
    pub fn boxes(&self) -> &[CellBox] {
        &self.boxes
    }

    #[inline]
    pub fn rev(&self) -> u64 {
        self.rev
    }

    #[inline]
    pub fn built_rev(&self) -> u64 {
        self.built_rev
    }

    /// True when the grid or atlas changed since the last mesh rebuild.
    #[inline]
    pub fn needs_rebuild(&self) -> bool {
        self.rev > self.built_rev
    }

    fn bump(&mut self) -> u64 {
        self.rev = self.rev.wrapping_add(1).max(1);
        self.rev
    }

    // --- Grid mutation ---

    pub fn place_cell(&mut self, pos: IVec3, faces: [Option<TileId>; 6], rot: FaceRotations) {
        self.grid.place_cell(pos, faces, rot);
        self.bump();
    }

    pub fn set_cell(&mut self, cell: Cell) {
        self.grid.set(cell);
        self.bump();
    }

    pub fn remove_cell(&mut self, pos: IVec3) -> Option<Cell> {
        let removed = self.grid.remove(pos);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    /// Sets the face of the cell at `pos` facing `normal`. No-op (returns
    /// `false`) when there is no such cell.
    pub fn paint_face(
        &mut self,
        pos: IVec3,
        normal: IVec3,
        surface: Option<TileId>,
        quarter_turns: i32,
    ) -> bool {
        let painted = self.grid.paint_face(pos, normal, surface, quarter_turns);
        if painted {
            self.bump();
        }
        painted
    }

    pub fn fill_region(&mut self, a: IVec3, b: IVec3, faces: [Option<TileId>; 6], rot: FaceRotations) -> usize {
        let n = self.grid.fill_region(a, b, faces, rot);
        if n > 0 {
            self.bump();
        }
        n
    }

    pub fn clear_region(&mut self, a: IVec3, b: IVec3) -> usize {
        let n = self.grid.clear_region(a, b);
        if n > 0 {
            self.bump();
        }
        n
    }

    /// Tile surface hit at `point` with outward `normal`.
    pub fn surface_at(&self, point: Vec3, normal: Vec3) -> Option<&TileSurface> {
        self.grid
            .surface_at(point, normal)
            .and_then(|id| self.catalog.get(id))
    }

    // --- Rebuild ---

    pub fn rebuild_lookup(&mut self) {
        self.grid.rebuild_lookup();
    }

    pub fn rebuild_mesh(&mut self) -> &MeshBuffers {
        self.built_rev = self.rev;
        self.mesher.build(&self.grid, &self.catalog, self.atlas_size)
    }

    pub fn merge_boxes(&mut self) -> &[CellBox] {
        self.merger.merge_grid(&self.grid, &mut self.boxes);
        &self.boxes
    }

    /// Colliders for the boxes of the last [`Tilemap::merge_boxes`].
    pub fn box_colliders(&self) -> Vec<BoxCollider> {
        self.boxes.iter().copied().map(BoxCollider::from).collect()
    }

    // --- Atlas ---

    /// Packs the catalog's tiles and adopts the new rects. An up-to-date mesh
    /// gets its UVs refreshed in place; otherwise it is left for the next
    /// rebuild.
    pub fn pack_tiles(&mut self, packer: &mut AtlasPacker, images: &[RgbaImage]) -> Result<PackedAtlas, CatalogError> {
        let was_current = !self.needs_rebuild();
        let packed = self.catalog.pack(packer, images);
        // Rects were cleared even if packing failed.
        self.bump();
        let atlas = packed?;
        self.atlas_size = (atlas.width(), atlas.height());
        if was_current && self.mesher.refresh_uvs(&self.grid, &self.catalog, self.atlas_size) {
            self.built_rev = self.rev;
        }
        Ok(atlas)
    }

    /// Loads each surface's image from disk, then packs as [`Tilemap::pack_tiles`].
    pub fn pack_from_disk(&mut self, packer: &mut AtlasPacker) -> Result<PackedAtlas, CatalogError> {
        let images = self.catalog.load_images()?;
        self.pack_tiles(packer, &images)
    }

    // --- Transforms; each ends with a mesh rebuild ---

    pub fn shift(&mut self, offset: IVec3) {
        self.grid.shift(offset);
        self.after_transform();
    }

    pub fn flip_x(&mut self) {
        self.grid.flip_x();
        self.after_transform();
    }

    pub fn flip_z(&mut self) {
        self.grid.flip_z();
        self.after_transform();
    }

    pub fn rotate_cw(&mut self) {
        self.grid.rotate_cw();
        self.after_transform();
    }

    pub fn rotate_ccw(&mut self) {
        self.grid.rotate_ccw();
        self.after_transform();
    }

    pub fn center_origin(&mut self) {
        self.grid.center_origin();
        self.after_transform();
    }

    pub fn bottom_center_origin(&mut self) {
        self.grid.bottom_center_origin();
        self.after_transform();
    }

    fn after_transform(&mut self) {
        self.bump();
        self.rebuild_mesh();
    }
}
