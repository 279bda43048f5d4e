use tilemap_geom::Vec3;
use tilemap_grid::Face;

/// Order in which a cell's faces are emitted.
pub const EMIT_ORDER: [Face; 6] = [
    Face::PosY,
    Face::NegY,
    Face::PosZ,
    Face::NegZ,
    Face::PosX,
    Face::NegX,
];

/// Two triangles per quad, relative to the quad's first vertex. With the
/// corner tables below, `cross(b - a, c - a)` points out of the cell.
pub const QUAD_INDICES: [u32; 6] = [2, 1, 0, 3, 2, 0];

const H: f32 = 0.5;

// Corner offsets from the cell center, per face, in vertex order.
const CORNERS: [[(f32, f32, f32); 4]; 6] = [
    // PosY
    [(-H, H, -H), (H, H, -H), (H, H, H), (-H, H, H)],
    // NegY
    [(-H, -H, H), (H, -H, H), (H, -H, -H), (-H, -H, -H)],
    // PosX
    [(H, -H, -H), (H, -H, H), (H, H, H), (H, H, -H)],
    // NegX
    [(-H, -H, H), (-H, -H, -H), (-H, H, -H), (-H, H, H)],
    // PosZ
    [(H, -H, H), (-H, -H, H), (-H, H, H), (H, H, H)],
    // NegZ
    [(-H, -H, -H), (H, -H, -H), (H, H, -H), (-H, H, -H)],
];

/// World-space corners of `face` on the unit cell centered at `center`.
#[inline]
pub fn face_corners(face: Face, center: Vec3) -> [Vec3; 4] {
    CORNERS[face.index()].map(|(x, y, z)| center + Vec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winding_faces_outward() {
        for face in Face::ALL {
            let c = face_corners(face, Vec3::ZERO);
            for tri in QUAD_INDICES.chunks(3) {
                let (a, b, d) = (c[tri[0] as usize], c[tri[1] as usize], c[tri[2] as usize]);
                let n = (b - a).cross(d - a).normalized();
                let expect = face.normal();
                assert!((n - expect).length() < 1e-6, "{face:?}: {n:?}");
            }
        }
    }

    #[test]
    fn corners_lie_on_the_face_plane() {
        for face in Face::ALL {
            let n = face.normal();
            for p in face_corners(face, Vec3::ZERO) {
                assert!((p.dot(n) - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn emit_order_covers_every_face_once() {
        let mut seen = [false; 6];
        for f in EMIT_ORDER {
            assert!(!seen[f.index()]);
            seen[f.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
