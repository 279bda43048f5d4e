//! Greedy merging of occupied cells into axis-aligned boxes, used as
//! collision proxies.

use hashbrown::HashSet;
use tilemap_geom::{IVec3, Vec3};
use tilemap_grid::VoxelGrid;

use crate::constants::{BITS_PER_WORD, SPARSE_VOLUME_RATIO, WORD_INDEX_MASK, WORD_INDEX_SHIFT};

/// Inclusive cell range `min..=max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellBox {
    pub min: IVec3,
    pub max: IVec3,
}

impl CellBox {
    #[inline]
    pub const fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Cells along each axis.
    #[inline]
    pub fn extent(&self) -> IVec3 {
        self.max + IVec3::ONE - self.min
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        let e = self.extent();
        e.x as usize * e.y as usize * e.z as usize
    }

    #[inline]
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    #[inline]
    pub fn overlaps(&self, other: &CellBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    /// World-space center, cells being unit cubes centered on their position.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.min.as_vec3().lerp(self.max.as_vec3(), 0.5)
    }

    /// World-space size.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.extent().as_vec3()
    }

    /// Cells in y, z, x order.
    pub fn cells(&self) -> impl Iterator<Item = IVec3> + '_ {
        (self.min.y..=self.max.y).flat_map(move |y| {
            (self.min.z..=self.max.z)
                .flat_map(move |z| (self.min.x..=self.max.x).map(move |x| IVec3::new(x, y, z)))
        })
    }
}

#[derive(Default, Debug)]
struct Bitset {
    data: Vec<u64>,
}

impl Bitset {
    fn reset(&mut self, nbits: usize) {
        self.data.clear();
        self.data.resize((nbits + WORD_INDEX_MASK) / BITS_PER_WORD, 0);
    }
    #[inline]
    fn set(&mut self, i: usize) {
        let w = i >> WORD_INDEX_SHIFT;
        let b = i & WORD_INDEX_MASK;
        self.data[w] |= 1u64 << b;
    }
    #[inline]
    fn get(&self, i: usize) -> bool {
        let w = i >> WORD_INDEX_SHIFT;
        let b = i & WORD_INDEX_MASK;
        ((self.data[w] >> b) & 1) != 0
    }
}

/// Sweeps a bounding volume (y outer, z middle, x inner) and grows a box
/// from each unclaimed occupied cell along +x, then +z, then +y. The result
/// covers the occupied set exactly with no two boxes sharing a cell; it is
/// not guaranteed to be the smallest such cover.
///
/// Scratch bitsets are kept between calls.
#[derive(Default, Debug)]
pub struct BoxMerger {
    occupied: Bitset,
    used: Bitset,
    dx: usize,
    dz: usize,
    // Sparse path
    order: Vec<IVec3>,
    free: HashSet<IVec3>,
}

impl BoxMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges the occupied cells inside `min..=max` into `out` (cleared
    /// first). `occupied` is asked once per cell of the volume. A volume
    /// whose cell count does not fit in `usize` is rejected with a warning
    /// and leaves `out` empty; use [`BoxMerger::merge_cells`] for those.
    pub fn merge(
        &mut self,
        min: IVec3,
        max: IVec3,
        mut occupied: impl FnMut(IVec3) -> bool,
        out: &mut Vec<CellBox>,
    ) {
        out.clear();
        if max.x < min.x || max.y < min.y || max.z < min.z {
            return;
        }
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as usize;
        let (dx, dy, dz) = (span(min.x, max.x), span(min.y, max.y), span(min.z, max.z));
        let Some(volume) = dx.checked_mul(dy).and_then(|v| v.checked_mul(dz)) else {
            log::warn!("box merge volume {}x{}x{} is too large", dx, dy, dz);
            return;
        };
        self.dx = dx;
        self.dz = dz;
        self.occupied.reset(volume);
        self.used.reset(volume);

        for y in 0..dy {
            for z in 0..dz {
                for x in 0..dx {
                    if occupied(min + local(x, y, z)) {
                        let i = self.index(x, y, z);
                        self.occupied.set(i);
                    }
                }
            }
        }

        for y in 0..dy {
            for z in 0..dz {
                for x in 0..dx {
                    if !self.free(x, y, z) {
                        continue;
                    }
                    let mut x1 = x;
                    while x1 + 1 < dx && self.free(x1 + 1, y, z) {
                        x1 += 1;
                    }
                    let mut z1 = z;
                    while z1 + 1 < dz && (x..=x1).all(|xx| self.free(xx, y, z1 + 1)) {
                        z1 += 1;
                    }
                    let mut y1 = y;
                    while y1 + 1 < dy
                        && (z..=z1).all(|zz| (x..=x1).all(|xx| self.free(xx, y1 + 1, zz)))
                    {
                        y1 += 1;
                    }
                    for yy in y..=y1 {
                        for zz in z..=z1 {
                            for xx in x..=x1 {
                                let i = self.index(xx, yy, zz);
                                self.used.set(i);
                            }
                        }
                    }
                    out.push(CellBox::new(min + local(x, y, z), min + local(x1, y1, z1)));
                }
            }
        }
        log::debug!("merged {}x{}x{} volume into {} boxes", dx, dy, dz, out.len());
    }

    /// Same sweep as [`BoxMerger::merge`] over an explicit cell list, so the
    /// cost follows the number of cells rather than their bounding volume.
    /// Duplicates are ignored. Produces the boxes `merge` would for the same
    /// occupied set.
    pub fn merge_cells(&mut self, cells: impl IntoIterator<Item = IVec3>, out: &mut Vec<CellBox>) {
        out.clear();
        self.order.clear();
        self.order.extend(cells);
        self.order.sort_unstable_by_key(|p| (p.y, p.z, p.x));
        self.order.dedup();
        self.free.clear();
        self.free.extend(self.order.iter().copied());

        for &p in &self.order {
            if !self.free.contains(&p) {
                continue;
            }
            let free = &self.free;
            let row_free = |y: i32, z: i32, x1: i32| (p.x..=x1).all(|x| free.contains(&IVec3::new(x, y, z)));
            let mut x1 = p.x;
            while x1 < i32::MAX && free.contains(&IVec3::new(x1 + 1, p.y, p.z)) {
                x1 += 1;
            }
            let mut z1 = p.z;
            while z1 < i32::MAX && row_free(p.y, z1 + 1, x1) {
                z1 += 1;
            }
            let mut y1 = p.y;
            while y1 < i32::MAX && (p.z..=z1).all(|z| row_free(y1 + 1, z, x1)) {
                y1 += 1;
            }
            let b = CellBox::new(p, IVec3::new(x1, y1, z1));
            for c in b.cells() {
                self.free.remove(&c);
            }
            out.push(b);
        }
        log::debug!("merged {} cells into {} boxes", self.order.len(), out.len());
    }

    /// Merges every cell of `grid`, using its lookup as the occupancy test.
    /// Grids that fill little of their bounding volume take the
    /// [`BoxMerger::merge_cells`] path.
    pub fn merge_grid(&mut self, grid: &VoxelGrid, out: &mut Vec<CellBox>) {
        if grid.is_stale() {
            log::warn!("merging boxes over a stale lookup");
        }
        let Some((lo, hi)) = grid.bounds() else {
            out.clear();
            return;
        };
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as u128;
        let volume = span(lo.x, hi.x) * span(lo.y, hi.y) * span(lo.z, hi.z);
        let dense_limit = grid
            .len()
            .saturating_mul(SPARSE_VOLUME_RATIO)
            .max(BITS_PER_WORD * BITS_PER_WORD);
        if volume <= dense_limit as u128 {
            self.merge(lo, hi, |p| grid.contains(p), out);
        } else {
            let cells = grid.cells().iter().map(|c| c.pos()).filter(|&p| grid.contains(p));
            self.merge_cells(cells, out);
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.dz + z) * self.dx + x
    }

    #[inline]
    fn free(&self, x: usize, y: usize, z: usize) -> bool {
        let i = self.index(x, y, z);
        self.occupied.get(i) && !self.used.get(i)
    }
}

#[inline]
fn local(x: usize, y: usize, z: usize) -> IVec3 {
    IVec3::new(x as i32, y as i32, z as i32)
}
