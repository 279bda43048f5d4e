use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use image::RgbaImage;
use serde::Deserialize;
use tilemap_atlas::{AtlasError, AtlasPacker, AtlasRect, PackedAtlas, load_tile_image};
use tilemap_grid::TileId;
use tilemap_mesh::TileRects;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tile catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("tile id {id} is claimed by both `{first}` and `{second}`")]
    DuplicateId { id: u32, first: String, second: String },
    #[error("tile `{0}` is already registered")]
    DuplicateName(String),
    #[error("tile `{name}`: {source}")]
    TileImage {
        name: String,
        #[source]
        source: AtlasError,
    },
    #[error("expected {expected} tile images, got {got}")]
    ImageCount { expected: usize, got: usize },
    #[error(transparent)]
    Atlas(#[from] AtlasError),
}

/// A named tile image and, once packed, where it sits in the atlas.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSurface {
    pub id: TileId,
    pub name: String,
    pub image_path: PathBuf,
    pub rect: Option<AtlasRect>,
}

/// Tile surfaces ordered by id.
#[derive(Default, Clone, Debug)]
pub struct TileCatalog {
    surfaces: Vec<TileSurface>,
    by_name: HashMap<String, TileId>,
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `[tiles]` table. Entries are either `name = "path.png"` or
    /// `name = { path = "path.png", id = 3 }`. Explicit ids are kept; the
    /// rest are numbered after the largest explicit id in name order.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CatalogError> {
        let cfg: CatalogConfig = toml::from_str(toml_str)?;

        let mut explicit: BTreeMap<u32, (String, PathBuf)> = BTreeMap::new();
        let mut implicit = Vec::new();
        // BTreeMap iterates names in sorted order, so numbering is stable.
        for (name, entry) in cfg.tiles {
            let (path, id) = match entry {
                TileEntry::Path(p) => (p, None),
                TileEntry::Detail { path, id } => (path, id),
            };
            match id {
                Some(id) => {
                    if let Some((first, _)) = explicit.get(&id) {
                        return Err(CatalogError::DuplicateId {
                            id,
                            first: first.clone(),
                            second: name,
                        });
                    }
                    explicit.insert(id, (name, path));
                }
                None => implicit.push((name, path)),
            }
        }

        let first_free = explicit.keys().next_back().map_or(0, |&m| m + 1);
        let mut catalog = TileCatalog::new();
        for (id, (name, path)) in explicit {
            catalog.insert(TileId(id), name, path)?;
        }
        for (id, (name, path)) in (first_free..).zip(implicit) {
            catalog.insert(TileId(id), name, path)?;
        }
        log::debug!("tile catalog: {} surfaces", catalog.len());
        Ok(catalog)
    }

    /// Loads a catalog file; relative image paths resolve against its folder.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut catalog = Self::from_toml_str(&s)?;
        if let Some(dir) = path.parent() {
            for surface in &mut catalog.surfaces {
                if surface.image_path.is_relative() {
                    surface.image_path = dir.join(&surface.image_path);
                }
            }
        }
        Ok(catalog)
    }

    /// Adds a surface under the next free id.
    pub fn add(&mut self, name: impl Into<String>, image_path: impl Into<PathBuf>) -> Result<TileId, CatalogError> {
        let id = TileId(self.surfaces.last().map_or(0, |s| s.id.0 + 1));
        self.insert(id, name.into(), image_path.into())?;
        Ok(id)
    }

    fn insert(&mut self, id: TileId, name: String, image_path: PathBuf) -> Result<(), CatalogError> {
        if self.by_name.contains_key(&name) {
            return Err(CatalogError::DuplicateName(name));
        }
        let at = match self.surfaces.binary_search_by_key(&id, |s| s.id) {
            Ok(i) => {
                return Err(CatalogError::DuplicateId {
                    id: id.0,
                    first: self.surfaces[i].name.clone(),
                    second: name,
                });
            }
            Err(i) => i,
        };
        self.by_name.insert(name.clone(), id);
        self.surfaces.insert(
            at,
            TileSurface {
                id,
                name,
                image_path,
                rect: None,
            },
        );
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn surfaces(&self) -> &[TileSurface] {
        &self.surfaces
    }

    pub fn get(&self, id: TileId) -> Option<&TileSurface> {
        self.surfaces
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.surfaces[i])
    }

    pub fn id_of(&self, name: &str) -> Option<TileId> {
        self.by_name.get(name).copied()
    }

    /// Reads every surface's image, in id order.
    pub fn load_images(&self) -> Result<Vec<RgbaImage>, CatalogError> {
        self.surfaces
            .iter()
            .map(|s| {
                load_tile_image(&s.image_path).map_err(|source| CatalogError::TileImage {
                    name: s.name.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Packs `images` (one per surface, in id order) and records each
    /// surface's rect. Rects are cleared first, so after a failed pack no
    /// surface has one.
    pub fn pack(&mut self, packer: &mut AtlasPacker, images: &[RgbaImage]) -> Result<PackedAtlas, CatalogError> {
        for s in &mut self.surfaces {
            s.rect = None;
        }
        if images.len() != self.surfaces.len() {
            return Err(CatalogError::ImageCount {
                expected: self.surfaces.len(),
                got: images.len(),
            });
        }
        let atlas = packer.pack(images)?;
        for (s, rect) in self.surfaces.iter_mut().zip(&atlas.rects) {
            s.rect = Some(*rect);
        }
        log::info!(
            "packed {} tiles into a {}x{} atlas",
            atlas.rects.len(),
            atlas.width(),
            atlas.height()
        );
        Ok(atlas)
    }
}

impl TileRects for TileCatalog {
    #[inline]
    fn rect(&self, tile: TileId) -> Option<AtlasRect> {
        self.get(tile).and_then(|s| s.rect)
    }
}

// --- Config ---

#[derive(Deserialize)]
struct CatalogConfig {
    #[serde(default)]
    tiles: BTreeMap<String, TileEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TileEntry {
    // Simple: grass = "tiles/grass.png"
    Path(PathBuf),
    // Detailed: grass = { path = "tiles/grass.png", id = 4 }
    Detail { path: PathBuf, id: Option<u32> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tilemap_atlas::PackConfig;

    const CATALOG: &str = r#"
[tiles]
stone = "stone.png"
grass = { path = "grass.png", id = 4 }
dirt = "dirt.png"
water = { path = "water.png", id = 1 }
"#;

    #[test]
    fn ids_are_explicit_then_sorted_after_max() {
        let c = TileCatalog::from_toml_str(CATALOG).unwrap();
        let ids: Vec<(u32, &str)> = c.surfaces().iter().map(|s| (s.id.0, s.name.as_str())).collect();
        assert_eq!(ids, vec![(1, "water"), (4, "grass"), (5, "dirt"), (6, "stone")]);
        assert_eq!(c.id_of("dirt"), Some(TileId(5)));
        assert_eq!(c.get(TileId(4)).unwrap().image_path, PathBuf::from("grass.png"));
        assert!(c.get(TileId(2)).is_none());
    }

    #[test]
    fn duplicate_explicit_ids_are_rejected() {
        let err = TileCatalog::from_toml_str(
            "[tiles]\na = { path = \"a.png\", id = 2 }\nb = { path = \"b.png\", id = 2 }\n",
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { id: 2, .. }));
    }

    #[test]
    fn empty_catalog_parses() {
        assert!(TileCatalog::from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn add_appends_after_last_id() {
        let mut c = TileCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(c.add("sand", "sand.png").unwrap(), TileId(7));
        assert!(matches!(c.add("sand", "x.png"), Err(CatalogError::DuplicateName(_))));
    }

    #[test]
    fn pack_assigns_rects_in_id_order() {
        let mut c = TileCatalog::new();
        c.add("a", "a.png").unwrap();
        c.add("b", "b.png").unwrap();
        let images = vec![
            RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])),
            RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255])),
        ];
        let mut packer = AtlasPacker::new(PackConfig {
            start_width: 16,
            start_height: 16,
            max_size: 64,
        });
        let atlas = c.pack(&mut packer, &images).unwrap();
        assert_eq!(c.rect(TileId(0)), Some(AtlasRect::new(1, 1, 4, 4)));
        assert_eq!(c.rect(TileId(1)), Some(AtlasRect::new(7, 1, 2, 2)));
        assert_eq!(atlas.rects.len(), 2);

        let err = c.pack(&mut packer, &images[..1]).unwrap_err();
        assert!(matches!(err, CatalogError::ImageCount { expected: 2, got: 1 }));
        assert_eq!(c.rect(TileId(0)), None);
    }
}
