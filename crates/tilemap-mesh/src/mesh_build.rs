use tilemap_geom::{Aabb, Vec3};

use crate::face_quad::QUAD_INDICES;

/// Render mesh buffers. Positions, normals and UVs are flat `f32` arrays
/// (3, 3 and 2 floats per vertex), tangents are `xyzw` with `w` holding
/// the bitangent sign, colours are RGBA8.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub tan: Vec<f32>,
    pub idx: Vec<u32>,
    pub col: Vec<u8>,
    pub bounds: Option<Aabb>,
}

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse across rebuilds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.tan.clear();
        self.idx.clear();
        self.col.clear();
        self.bounds = None;
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        // 4 vertices per quad
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.tan.reserve(n_quads * 4 * 4);
        self.col.reserve(n_quads * 4 * 4);
        self.idx.reserve(n_quads * 6);
    }

    /// Appends a quad with explicit per-vertex UVs. Normals and tangents are
    /// filled in by the `recalculate_*` passes.
    pub fn add_quad(&mut self, corners: [Vec3; 4], uvs: [(f32, f32); 4], rgba: [u8; 4]) {
        let base = self.vertex_count() as u32;
        for (p, (u, v)) in corners.iter().zip(uvs) {
            self.pos.extend_from_slice(&[p.x, p.y, p.z]);
            self.uv.extend_from_slice(&[u, v]);
            self.col.extend_from_slice(&rgba);
        }
        self.idx.extend(QUAD_INDICES.iter().map(|&i| base + i));
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / QUAD_INDICES.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Returns a slice of interleaved vertex positions (x,y,z per vertex).
    pub fn positions(&self) -> &[f32] {
        &self.pos
    }
    /// Returns a slice of interleaved vertex normals (x,y,z per vertex).
    pub fn normals(&self) -> &[f32] {
        &self.norm
    }
    pub fn uvs(&self) -> &[f32] {
        &self.uv
    }
    pub fn tangents(&self) -> &[f32] {
        &self.tan
    }
    pub fn indices(&self) -> &[u32] {
        &self.idx
    }
    pub fn colors(&self) -> &[u8] {
        &self.col
    }

    /// UVs of the `quad`-th quad, in vertex order.
    pub fn quad_uvs(&self, quad: usize) -> Option<[(f32, f32); 4]> {
        let s = self.uv.get(quad * 8..quad * 8 + 8)?;
        Some([(s[0], s[1]), (s[2], s[3]), (s[4], s[5]), (s[6], s[7])])
    }

    pub(crate) fn set_quad_uvs(&mut self, quad: usize, uvs: [(f32, f32); 4]) {
        let s = &mut self.uv[quad * 8..quad * 8 + 8];
        for (dst, (u, v)) in s.chunks_exact_mut(2).zip(uvs) {
            dst[0] = u;
            dst[1] = v;
        }
    }

    pub fn recalculate_normals(&mut self) {
        accumulate_normals(&self.pos, &self.idx, &mut self.norm);
    }

    pub fn recalculate_bounds(&mut self) {
        self.bounds = bounds_of(&self.pos);
    }

    /// Per-vertex tangents from positions and UVs. Needs normals.
    pub fn recalculate_tangents(&mut self) {
        let n = self.vertex_count();
        let mut sdir = vec![Vec3::ZERO; n];
        let mut tdir = vec![Vec3::ZERO; n];
        for tri in self.idx.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (p0, p1, p2) = (vec3_at(&self.pos, i0), vec3_at(&self.pos, i1), vec3_at(&self.pos, i2));
            let (w0, w1, w2) = (uv_at(&self.uv, i0), uv_at(&self.uv, i1), uv_at(&self.uv, i2));
            let (e1, e2) = (p1 - p0, p2 - p0);
            let (s1, t1) = (w1.0 - w0.0, w1.1 - w0.1);
            let (s2, t2) = (w2.0 - w0.0, w2.1 - w0.1);
            let det = s1 * t2 - s2 * t1;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let sd = (e1 * t2 - e2 * t1) * r;
            let td = (e2 * s1 - e1 * s2) * r;
            for i in [i0, i1, i2] {
                sdir[i] += sd;
                tdir[i] += td;
            }
        }

        self.tan.clear();
        self.tan.reserve(n * 4);
        for i in 0..n {
            let nrm = vec3_at(&self.norm, i);
            // Gram-Schmidt against the normal
            let mut t = (sdir[i] - nrm * nrm.dot(sdir[i])).normalized();
            if t.length() == 0.0 {
                t = any_perpendicular(nrm);
            }
            let w = if nrm.cross(t).dot(tdir[i]) < 0.0 { -1.0 } else { 1.0 };
            self.tan.extend_from_slice(&[t.x, t.y, t.z, w]);
        }
    }
}

/// Collision mesh: geometry only.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct CollisionBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub idx: Vec<u32>,
    pub bounds: Option<Aabb>,
}

impl CollisionBuild {
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.idx.clear();
        self.bounds = None;
    }

    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.idx.reserve(n_quads * 6);
    }

    pub fn add_quad(&mut self, corners: [Vec3; 4]) {
        let base = self.vertex_count() as u32;
        for p in corners {
            self.pos.extend_from_slice(&[p.x, p.y, p.z]);
        }
        self.idx.extend(QUAD_INDICES.iter().map(|&i| base + i));
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / QUAD_INDICES.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.pos
    }
    pub fn indices(&self) -> &[u32] {
        &self.idx
    }

    pub fn recalculate_normals(&mut self) {
        accumulate_normals(&self.pos, &self.idx, &mut self.norm);
    }

    pub fn recalculate_bounds(&mut self) {
        self.bounds = bounds_of(&self.pos);
    }
}

/// The two outputs of one mesh rebuild.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuffers {
    pub render: MeshBuild,
    pub collision: CollisionBuild,
}

impl MeshBuffers {
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.render.clear_keep_capacity();
        self.collision.clear_keep_capacity();
    }
}

#[inline]
fn vec3_at(buf: &[f32], i: usize) -> Vec3 {
    Vec3::new(buf[i * 3], buf[i * 3 + 1], buf[i * 3 + 2])
}

#[inline]
fn uv_at(buf: &[f32], i: usize) -> (f32, f32) {
    (buf[i * 2], buf[i * 2 + 1])
}

// Area-weighted: the unnormalized triangle cross product is summed into
// each of its vertices.
fn accumulate_normals(pos: &[f32], idx: &[u32], out: &mut Vec<f32>) {
    out.clear();
    out.resize(pos.len(), 0.0);
    for tri in idx.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let a = vec3_at(pos, i0);
        let fnrm = (vec3_at(pos, i1) - a).cross(vec3_at(pos, i2) - a);
        for i in [i0, i1, i2] {
            out[i * 3] += fnrm.x;
            out[i * 3 + 1] += fnrm.y;
            out[i * 3 + 2] += fnrm.z;
        }
    }
    for n in out.chunks_exact_mut(3) {
        let v = Vec3::new(n[0], n[1], n[2]).normalized();
        n.copy_from_slice(&[v.x, v.y, v.z]);
    }
}

fn bounds_of(pos: &[f32]) -> Option<Aabb> {
    Aabb::from_points(pos.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2])))
}

fn any_perpendicular(n: Vec3) -> Vec3 {
    let axis = if n.x.abs() < 0.9 {
        Vec3::new(1.0, 0.0, 0.0)
    } else {
        Vec3::UP
    };
    let t = n.cross(axis).normalized();
    if t.length() == 0.0 { Vec3::new(1.0, 0.0, 0.0) } else { t }
}
