use image::{ImageFormat, Rgba, RgbaImage};
use tilemap_atlas::{AtlasError, AtlasPacker, PackConfig, load_tile_image};

fn checker(w: u32, h: u32, a: [u8; 4], b: [u8; 4]) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| if (x + y) % 2 == 0 { Rgba(a) } else { Rgba(b) })
}

#[test]
fn packed_atlas_survives_png_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let sources = [
        checker(5, 3, [255, 0, 0, 255], [0, 0, 255, 255]),
        checker(4, 6, [0, 255, 0, 255], [10, 20, 30, 128]),
    ];
    let mut tiles = Vec::new();
    for (i, img) in sources.iter().enumerate() {
        let path = dir.path().join(format!("tile{i}.png"));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        tiles.push(load_tile_image(&path).unwrap());
    }
    assert_eq!(tiles[0], sources[0]);
    assert_eq!(tiles[1], sources[1]);

    let mut packer = AtlasPacker::new(PackConfig {
        start_width: 8,
        start_height: 8,
        max_size: 64,
    });
    let atlas = packer.pack(&tiles).unwrap();
    let out = dir.path().join("atlas.png");
    atlas.save_png(&out).unwrap();

    let reloaded = load_tile_image(&out).unwrap();
    assert_eq!(reloaded.dimensions(), (atlas.width(), atlas.height()));
    assert_eq!(reloaded, atlas.image);
    for (rect, src) in atlas.rects.iter().zip(&sources) {
        assert_eq!((rect.width, rect.height), src.dimensions());
        for (x, y, px) in src.enumerate_pixels() {
            assert_eq!(reloaded.get_pixel(rect.x + x, rect.y + y), px);
        }
    }
}

#[test]
fn missing_tile_image_is_an_image_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_tile_image(dir.path().join("nope.png")).unwrap_err();
    assert!(matches!(err, AtlasError::Image(_)));
}
