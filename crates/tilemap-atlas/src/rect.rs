use serde::{Deserialize, Serialize};

/// Pixel rectangle inside an atlas, `x`/`y` measured from the top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn x_max(&self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub fn y_max(&self) -> u32 {
        self.y + self.height
    }

    #[inline]
    pub fn overlaps(&self, other: &AtlasRect) -> bool {
        self.x < other.x_max()
            && other.x < self.x_max()
            && self.y < other.y_max()
            && other.y < self.y_max()
    }

    #[inline]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x_max() <= width && self.y_max() <= height
    }

    /// Corners normalized by the atlas size, in the order
    /// (min,min), (max,min), (max,max), (min,max).
    pub fn uv_corners(&self, atlas_width: u32, atlas_height: u32) -> [(f32, f32); 4] {
        let w = atlas_width.max(1) as f32;
        let h = atlas_height.max(1) as f32;
        let (u0, v0) = (self.x as f32 / w, self.y as f32 / h);
        let (u1, v1) = (self.x_max() as f32 / w, self.y_max() as f32 / h);
        [(u0, v0), (u1, v0), (u1, v1), (u0, v1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = AtlasRect::new(0, 0, 4, 4);
        assert!(!a.overlaps(&AtlasRect::new(4, 0, 4, 4)));
        assert!(!a.overlaps(&AtlasRect::new(0, 4, 4, 4)));
        assert!(a.overlaps(&AtlasRect::new(3, 3, 4, 4)));
    }

    #[test]
    fn uv_corners_normalize() {
        let r = AtlasRect::new(8, 4, 8, 4);
        let uv = r.uv_corners(32, 16);
        assert_eq!(uv, [(0.25, 0.25), (0.5, 0.25), (0.5, 0.5), (0.25, 0.5)]);
    }

    #[test]
    fn uv_corners_survive_empty_atlas() {
        let uv = AtlasRect::default().uv_corners(0, 0);
        assert!(uv.iter().all(|&(u, v)| u == 0.0 && v == 0.0));
    }
}
