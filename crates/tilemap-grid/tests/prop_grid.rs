use std::collections::BTreeMap;

use proptest::prelude::*;
use tilemap_geom::IVec3;
use tilemap_grid::{Cell, Face, FaceRotations, TileId, VoxelGrid};

#[derive(Clone, Debug)]
enum Edit {
    Place(IVec3, u32),
    Remove(IVec3),
    Paint(IVec3, usize, u32, i32),
    Rebuild,
}

fn small_pos() -> impl Strategy<Value = IVec3> {
    (-3i32..=3, -3i32..=3, -3i32..=3).prop_map(|(x, y, z)| IVec3::new(x, y, z))
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (small_pos(), 0u32..4).prop_map(|(p, t)| Edit::Place(p, t)),
        small_pos().prop_map(Edit::Remove),
        (small_pos(), 0usize..6, 0u32..4, -8i32..8).prop_map(|(p, f, t, r)| Edit::Paint(p, f, t, r)),
        Just(Edit::Rebuild),
    ]
}

// Reference model: a plain ordered map of position -> cell.
fn apply(grid: &mut VoxelGrid, model: &mut BTreeMap<IVec3, Cell>, e: &Edit) {
    match *e {
        Edit::Place(p, t) => {
            let c = Cell::uniform(p, TileId(t));
            grid.set(c);
            model.insert(p, c);
        }
        Edit::Remove(p) => {
            assert_eq!(grid.remove(p).map(|c| c.pos()), model.remove(&p).map(|c| c.pos()));
        }
        Edit::Paint(p, f, t, r) => {
            let face = Face::ALL[f];
            let painted = grid.paint_face(p, face.delta(), Some(TileId(t)), r);
            assert_eq!(painted, model.contains_key(&p));
            if let Some(c) = model.get_mut(&p) {
                c.paint(face, Some(TileId(t)), r);
            }
        }
        Edit::Rebuild => grid.rebuild_lookup(),
    }
}

proptest! {
    // After any edit batch and a rebuild, the lookup agrees with the collection.
    #[test]
    fn lookup_matches_model_after_rebuild(edits in prop::collection::vec(edit(), 0..64)) {
        let mut grid = VoxelGrid::new();
        let mut model = BTreeMap::new();
        for e in &edits {
            apply(&mut grid, &mut model, e);
        }
        grid.rebuild_lookup();
        prop_assert_eq!(grid.len(), model.len());
        for x in -3..=3 { for y in -3..=3 { for z in -3..=3 {
            let p = IVec3::new(x, y, z);
            prop_assert_eq!(grid.get(p).copied(), model.get(&p).copied());
        }}}
    }

    // Transforms re-key without losing or merging cells.
    #[test]
    fn transforms_preserve_cell_count(
        points in prop::collection::btree_set(small_pos(), 0..40),
        ops in prop::collection::vec(0u8..6, 0..8),
    ) {
        let mut grid = VoxelGrid::from_cells(points.iter().map(|&p| Cell::new(p)));
        for op in ops {
            match op {
                0 => grid.shift(IVec3::new(1, -2, 3)),
                1 => grid.flip_x(),
                2 => grid.flip_z(),
                3 => grid.rotate_cw(),
                4 => grid.rotate_ccw(),
                _ => grid.center_origin(),
            }
        }
        prop_assert!(!grid.is_stale());
        prop_assert_eq!(grid.len(), points.len());
        for c in grid.cells() {
            prop_assert!(grid.contains(c.pos()));
        }
    }

    // Rotating a face by k and then by (4 - k) mod 4 restores it.
    #[test]
    fn rotation_roundtrip(start in 0i32..4, k in 0i32..4, f in 0usize..6) {
        let face = Face::ALL[f];
        let mut r = FaceRotations::NONE.with(face, start);
        r.set(face, r.get(face) as i32 + k);
        r.set(face, r.get(face) as i32 + (4 - k) % 4);
        prop_assert_eq!(r.get(face) as i32, start);
    }
}
