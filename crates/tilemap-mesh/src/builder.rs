use std::hash::BuildHasher;

use tilemap_atlas::AtlasRect;
use tilemap_geom::IVec3;
use tilemap_grid::{Cell, Face, TileId, VoxelGrid};

use crate::constants::WHITE;
use crate::face_quad::{EMIT_ORDER, face_corners};
use crate::mesh_build::MeshBuffers;

/// Source of atlas rectangles for tile ids.
pub trait TileRects {
    fn rect(&self, tile: TileId) -> Option<AtlasRect>;
}

impl<S: BuildHasher> TileRects for std::collections::HashMap<TileId, AtlasRect, S> {
    #[inline]
    fn rect(&self, tile: TileId) -> Option<AtlasRect> {
        self.get(&tile).copied()
    }
}

impl<S: BuildHasher> TileRects for hashbrown::HashMap<TileId, AtlasRect, S> {
    #[inline]
    fn rect(&self, tile: TileId) -> Option<AtlasRect> {
        self.get(&tile).copied()
    }
}

impl<T: TileRects + ?Sized> TileRects for &T {
    #[inline]
    fn rect(&self, tile: TileId) -> Option<AtlasRect> {
        (**self).rect(tile)
    }
}

/// Cyclic shift of the four corner UVs by `quarter_turns` (taken mod 4).
#[inline]
pub fn rotate_uvs(base: [(f32, f32); 4], quarter_turns: u8) -> [(f32, f32); 4] {
    let r = (quarter_turns % 4) as usize;
    std::array::from_fn(|j| base[(j + r) % 4])
}

/// Rebuilds render and collision meshes from a grid. Owns its output
/// buffers and reuses their allocations between rebuilds.
#[derive(Default, Debug)]
pub struct MeshBuilder {
    buffers: MeshBuffers,
    // (cell, face) of each render quad, in emission order
    emitted: Vec<(IVec3, Face)>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output of the last rebuild.
    #[inline]
    pub fn buffers(&self) -> &MeshBuffers {
        &self.buffers
    }

    /// Emits one quad per exposed face. A face is exposed when the lookup
    /// has no cell in its direction. Exposed faces always go to the
    /// collision mesh; they go to the render mesh only when textured.
    ///
    /// `atlas_size` normalizes rects into UV space. Tiles with no rect are
    /// drawn with a zero rect and reported once per call, as a warning only
    /// when `atlas_size` is non-zero.
    pub fn build<R: TileRects + ?Sized>(
        &mut self,
        grid: &VoxelGrid,
        rects: &R,
        atlas_size: (u32, u32),
    ) -> &MeshBuffers {
        self.buffers.clear_keep_capacity();
        self.emitted.clear();
        if grid.is_stale() {
            log::warn!("meshing a grid whose lookup is stale; culling may be wrong");
        }

        let mut missing = 0usize;
        for cell in grid.cells() {
            let center = cell.pos().as_vec3();
            for face in EMIT_ORDER {
                if !exposed(grid, cell.pos(), face) {
                    continue;
                }
                let corners = face_corners(face, center);
                if let Some(tile) = cell.surface(face) {
                    let uvs = face_uvs(cell, face, tile, rects, atlas_size, &mut missing);
                    self.buffers.render.add_quad(corners, uvs, WHITE);
                    self.emitted.push((cell.pos(), face));
                }
                self.buffers.collision.add_quad(corners);
            }
        }
        report_missing(missing, atlas_size);

        let render = &mut self.buffers.render;
        render.recalculate_normals();
        render.recalculate_bounds();
        render.recalculate_tangents();
        let collision = &mut self.buffers.collision;
        collision.recalculate_normals();
        collision.recalculate_bounds();

        log::debug!(
            "meshed {} cells: {} render quads, {} collision quads",
            grid.len(),
            self.buffers.render.quad_count(),
            self.buffers.collision.quad_count()
        );
        &self.buffers
    }

    /// Rewrites render UVs (and tangents) in place, for example after the
    /// atlas was repacked. Returns `false` without touching the buffers when
    /// the grid no longer produces the same render faces as the last build;
    /// the caller then needs a full [`MeshBuilder::build`].
    pub fn refresh_uvs<R: TileRects + ?Sized>(
        &mut self,
        grid: &VoxelGrid,
        rects: &R,
        atlas_size: (u32, u32),
    ) -> bool {
        let mut n = 0usize;
        let same_faces = textured_faces(grid).all(|(c, f)| {
            n += 1;
            self.emitted.get(n - 1) == Some(&(c.pos(), f))
        }) && n == self.emitted.len();
        if !same_faces {
            log::debug!(
                "uv refresh skipped: render faces changed since the last build ({} quads)",
                self.emitted.len()
            );
            return false;
        }

        let mut missing = 0usize;
        for (quad, (cell, face)) in textured_faces(grid).enumerate() {
            let Some(tile) = cell.surface(face) else {
                continue;
            };
            let uvs = face_uvs(cell, face, tile, rects, atlas_size, &mut missing);
            self.buffers.render.set_quad_uvs(quad, uvs);
        }
        report_missing(missing, atlas_size);
        self.buffers.render.recalculate_tangents();
        true
    }
}

/// Textured, exposed faces in emission order.
fn textured_faces(grid: &VoxelGrid) -> impl Iterator<Item = (&Cell, Face)> {
    grid.cells()
        .iter()
        .flat_map(|c| EMIT_ORDER.into_iter().map(move |f| (c, f)))
        .filter(move |&(c, f)| c.surface(f).is_some() && exposed(grid, c.pos(), f))
}

/// Before any atlas exists (size 0x0) every face lacks a rect.
fn report_missing(missing: usize, atlas_size: (u32, u32)) {
    if missing == 0 {
        return;
    }
    if atlas_size == (0, 0) {
        log::debug!("no atlas yet; {missing} face(s) use a zero rect");
    } else {
        log::warn!("{missing} face(s) reference tiles without an atlas rect");
    }
}

/// A face on the edge of the coordinate range has no neighbor and is exposed.
#[inline]
fn exposed(grid: &VoxelGrid, pos: IVec3, face: Face) -> bool {
    pos.checked_add(face.delta()).is_none_or(|n| !grid.contains(n))
}

fn face_uvs<R: TileRects + ?Sized>(
    cell: &Cell,
    face: Face,
    tile: TileId,
    rects: &R,
    (w, h): (u32, u32),
    missing: &mut usize,
) -> [(f32, f32); 4] {
    let rect = rects.rect(tile).unwrap_or_else(|| {
        *missing += 1;
        AtlasRect::default()
    });
    rotate_uvs(rect.uv_corners(w, h), cell.rotation(face))
}
