use image::{Rgba, RgbaImage};
use proptest::prelude::*;
use tilemap_atlas::{AtlasError, AtlasPacker, AtlasRect, PackConfig};

fn tile_sizes() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..=24, 1u32..=24), 0..40)
}

fn images(sizes: &[(u32, u32)]) -> Vec<RgbaImage> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| RgbaImage::from_pixel(w, h, Rgba([i as u8, 0, 0, 255])))
        .collect()
}

// Interior grown by the one-pixel border on every side.
fn footprint(r: &AtlasRect) -> AtlasRect {
    AtlasRect::new(r.x - 1, r.y - 1, r.width + 2, r.height + 2)
}

proptest! {
    #[test]
    fn rects_are_disjoint_and_inside(sizes in tile_sizes(), start in 1u32..=64) {
        let cfg = PackConfig { start_width: start, start_height: start, max_size: 4096 };
        let tiles = images(&sizes);
        let out = AtlasPacker::new(cfg).pack(&tiles).unwrap();
        prop_assert_eq!(out.rects.len(), sizes.len());
        for (r, &(w, h)) in out.rects.iter().zip(&sizes) {
            prop_assert_eq!((r.width, r.height), (w, h));
            prop_assert!(r.x >= 1 && r.y >= 1);
            prop_assert!(footprint(r).fits_within(out.width(), out.height()));
        }
        for i in 0..out.rects.len() {
            for j in (i + 1)..out.rects.len() {
                prop_assert!(!footprint(&out.rects[i]).overlaps(&footprint(&out.rects[j])));
            }
        }
    }

    #[test]
    fn interior_pixels_match_source(sizes in prop::collection::vec((1u32..=8, 1u32..=8), 1..12)) {
        let tiles = images(&sizes);
        let out = AtlasPacker::new(PackConfig { start_width: 8, start_height: 8, max_size: 512 })
            .pack(&tiles)
            .unwrap();
        for (i, r) in out.rects.iter().enumerate() {
            for y in r.y..r.y_max() {
                for x in r.x..r.x_max() {
                    prop_assert_eq!(out.image.get_pixel(x, y).0[0], i as u8);
                }
            }
        }
    }

    // Either the pack succeeds inside the ceiling or it reports the ceiling.
    #[test]
    fn growth_terminates(sizes in tile_sizes(), max_pow in 3u32..=9) {
        let max = 1u32 << max_pow;
        let cfg = PackConfig { start_width: 8, start_height: 8, max_size: max };
        match AtlasPacker::new(cfg).pack(&images(&sizes)) {
            Ok(out) => prop_assert!(out.width() <= max && out.height() <= max),
            Err(AtlasError::CapacityExceeded { max: m, .. }) => prop_assert_eq!(m, max),
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }
}

#[test]
fn three_tiles_force_growth_from_sixteen() {
    let sizes = [(10, 10), (20, 5), (5, 30)];
    let cfg = PackConfig { start_width: 16, start_height: 16, max_size: 4096 };
    let out = AtlasPacker::new(cfg).pack(&images(&sizes)).unwrap();
    assert!(out.width() > 16 || out.height() > 16);
    assert_eq!(out.rects.len(), 3);
    for r in &out.rects {
        assert!(r.fits_within(out.width(), out.height()));
    }
    assert!(!out.rects[0].overlaps(&out.rects[1]));
    assert!(!out.rects[0].overlaps(&out.rects[2]));
    assert!(!out.rects[1].overlaps(&out.rects[2]));
}
