use std::borrow::Borrow;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use serde::Deserialize;

use crate::rect::AtlasRect;

/// Pixels of duplicated edge around every packed tile.
const BORDER: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub start_width: u32,
    pub start_height: u32,
    /// Hard ceiling on either atlas dimension.
    pub max_size: u32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            start_width: 256,
            start_height: 256,
            max_size: 8192,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("atlas needs to grow to {width}x{height}, beyond the {max} pixel limit")]
    CapacityExceeded { width: u32, height: u32, max: u32 },
    #[error("tile {index} has a zero-sized image")]
    EmptyTile { index: usize },
    #[error("invalid pack config: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Output of one packing run. `rects[i]` is the interior (border excluded)
/// of the i-th input tile.
#[derive(Clone, Debug)]
pub struct PackedAtlas {
    pub image: RgbaImage,
    pub rects: Vec<AtlasRect>,
}

impl PackedAtlas {
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), AtlasError> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

pub fn load_tile_image(path: impl AsRef<Path>) -> Result<RgbaImage, AtlasError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Packs tiles left to right in rows, in input order. When a layout does
/// not fit, the atlas doubles in width, then in height, alternating, until
/// it fits or crosses `max_size`.
pub struct AtlasPacker {
    config: PackConfig,
    // Footprint origins of the last successful layout; reused across calls.
    placements: Vec<(u32, u32)>,
}

impl AtlasPacker {
    pub fn new(config: PackConfig) -> Self {
        Self {
            config,
            placements: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn pack<T: Borrow<RgbaImage>>(&mut self, tiles: &[T]) -> Result<PackedAtlas, AtlasError> {
        if tiles.is_empty() {
            return Ok(PackedAtlas {
                image: RgbaImage::new(0, 0),
                rects: Vec::new(),
            });
        }
        let cfg = self.config;
        if cfg.start_width == 0 || cfg.start_height == 0 {
            return Err(AtlasError::InvalidConfig("start size must be non-zero"));
        }
        if cfg.start_width > cfg.max_size || cfg.start_height > cfg.max_size {
            return Err(AtlasError::InvalidConfig("start size exceeds max_size"));
        }

        let mut sizes = Vec::with_capacity(tiles.len());
        for (index, t) in tiles.iter().enumerate() {
            let img = t.borrow();
            if img.width() == 0 || img.height() == 0 {
                return Err(AtlasError::EmptyTile { index });
            }
            sizes.push((img.width(), img.height()));
        }

        let (mut w, mut h) = (cfg.start_width, cfg.start_height);
        let mut grow_width = true;
        let mut attempts = 1u32;
        while !self.layout(&sizes, w, h) {
            let (nw, nh) = if grow_width {
                (w.saturating_mul(2), h)
            } else {
                (w, h.saturating_mul(2))
            };
            if nw > cfg.max_size || nh > cfg.max_size {
                return Err(AtlasError::CapacityExceeded {
                    width: nw,
                    height: nh,
                    max: cfg.max_size,
                });
            }
            (w, h) = (nw, nh);
            grow_width = !grow_width;
            attempts += 1;
        }
        log::debug!(
            "packed {} tiles into {}x{} after {} attempt(s)",
            tiles.len(),
            w,
            h,
            attempts
        );

        let mut image = RgbaImage::new(w, h);
        let mut rects = Vec::with_capacity(tiles.len());
        for (t, &(px, py)) in tiles.iter().zip(&self.placements) {
            let src = t.borrow();
            blit_with_border(&mut image, src, px, py);
            rects.push(AtlasRect::new(
                px + BORDER,
                py + BORDER,
                src.width(),
                src.height(),
            ));
        }
        Ok(PackedAtlas { image, rects })
    }

    /// Tries to lay out bordered footprints in a `w`x`h` atlas, filling
    /// `self.placements` on success.
    fn layout(&mut self, sizes: &[(u32, u32)], w: u32, h: u32) -> bool {
        self.placements.clear();
        let (mut x, mut y, mut row_h) = (0u32, 0u32, 0u32);
        for &(tw, th) in sizes {
            let fw = tw + 2 * BORDER;
            let fh = th + 2 * BORDER;
            if x > 0 && x + fw > w {
                y += row_h;
                x = 0;
                row_h = 0;
            }
            if x + fw > w || y + fh > h {
                return false;
            }
            self.placements.push((x, y));
            x += fw;
            row_h = row_h.max(fh);
        }
        true
    }
}

/// Copies `src` into `dst` with its top-left interior pixel at
/// `(x + BORDER, y + BORDER)`, filling the border ring from the nearest
/// edge pixel.
fn blit_with_border(dst: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    let (sw, sh) = src.dimensions();
    for yy in 0..sh + 2 * BORDER {
        let sy = yy.saturating_sub(BORDER).min(sh - 1);
        for xx in 0..sw + 2 * BORDER {
            let sx = xx.saturating_sub(BORDER).min(sw - 1);
            dst.put_pixel(x + xx, y + yy, *src.get_pixel(sx, sy));
        }
    }
}
