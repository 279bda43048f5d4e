//! Scene files: the cells and filled regions that make up one tilemap.
//!
//! ```toml
//! [[fills]]
//! min = [0, 0, 0]
//! max = [7, 0, 7]
//! all = "dirt"
//! top = "grass"
//!
//! [[cells]]
//! pos = [3, 1, 3]
//! all = "stone"
//! rot = 1
//! rot_top = 2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tilemap_edit::{TileCatalog, Tilemap};
use tilemap_geom::IVec3;
use tilemap_grid::{Face, FaceRotations, TileId};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown tile `{0}`")]
    UnknownTile(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub fills: Vec<FillSpec>,
    pub cells: Vec<CellSpec>,
}

#[derive(Debug, Deserialize)]
pub struct CellSpec {
    pub pos: IVec3,
    #[serde(flatten)]
    pub faces: FaceSpec,
}

#[derive(Debug, Deserialize)]
pub struct FillSpec {
    pub min: IVec3,
    pub max: IVec3,
    #[serde(flatten)]
    pub faces: FaceSpec,
}

/// Tile names and quarter turns per face. `all`/`rot` apply to every face
/// that has no value of its own.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FaceSpec {
    pub all: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub right: Option<String>,
    pub left: Option<String>,
    pub front: Option<String>,
    pub back: Option<String>,
    pub rot: i32,
    pub rot_top: Option<i32>,
    pub rot_bottom: Option<i32>,
    pub rot_right: Option<i32>,
    pub rot_left: Option<i32>,
    pub rot_front: Option<i32>,
    pub rot_back: Option<i32>,
}

impl FaceSpec {
    fn for_face(&self, face: Face) -> (Option<&String>, Option<i32>) {
        let (name, rot) = match face {
            Face::PosY => (&self.top, self.rot_top),
            Face::NegY => (&self.bottom, self.rot_bottom),
            Face::PosX => (&self.right, self.rot_right),
            Face::NegX => (&self.left, self.rot_left),
            Face::PosZ => (&self.front, self.rot_front),
            Face::NegZ => (&self.back, self.rot_back),
        };
        (name.as_ref().or(self.all.as_ref()), rot)
    }

    /// Face tiles and rotations, with names looked up in `catalog`.
    pub fn resolve(&self, catalog: &TileCatalog) -> Result<([Option<TileId>; 6], FaceRotations), SceneError> {
        let mut faces = [None; 6];
        let mut rot = FaceRotations::NONE;
        for face in Face::ALL {
            let (name, turns) = self.for_face(face);
            if let Some(name) = name {
                let id = catalog
                    .id_of(name)
                    .ok_or_else(|| SceneError::UnknownTile(name.clone()))?;
                faces[face.index()] = Some(id);
            }
            rot.set(face, turns.unwrap_or(self.rot));
        }
        Ok((faces, rot))
    }
}

impl Scene {
    pub fn from_toml_str(s: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s)
    }

    /// Places fills, then single cells (which replace filled cells), then
    /// rebuilds the lookup. Returns the number of cells in the grid.
    pub fn apply(&self, map: &mut Tilemap) -> Result<usize, SceneError> {
        for fill in &self.fills {
            let (faces, rot) = fill.faces.resolve(map.catalog())?;
            map.fill_region(fill.min, fill.max, faces, rot);
        }
        for cell in &self.cells {
            let (faces, rot) = cell.faces.resolve(map.catalog())?;
            map.place_cell(cell.pos, faces, rot);
        }
        map.rebuild_lookup();
        log::debug!(
            "scene applied: {} fills, {} cells, {} grid cells",
            self.fills.len(),
            self.cells.len(),
            map.grid().len()
        );
        Ok(map.grid().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TileCatalog {
        TileCatalog::from_toml_str("[tiles]\ndirt = \"dirt.png\"\ngrass = \"grass.png\"\nstone = \"stone.png\"\n")
            .unwrap()
    }

    const SCENE: &str = r#"
[[fills]]
min = [0, 0, 0]
max = [2, 0, 1]
all = "dirt"
top = "grass"

[[cells]]
pos = [1, 0, 1]
all = "stone"
rot = 1
rot_top = -1

[[cells]]
pos = [0, 1, 0]
front = "grass"
"#;

    #[test]
    fn apply_builds_grid() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        let mut map = Tilemap::new(catalog());
        assert_eq!(scene.apply(&mut map).unwrap(), 7);
        assert!(!map.grid().is_stale());

        let c = map.catalog();
        let (dirt, grass, stone) = (c.id_of("dirt"), c.id_of("grass"), c.id_of("stone"));
        let filled = map.grid().get(IVec3::new(2, 0, 0)).unwrap();
        assert_eq!(filled.surface(Face::PosY), grass);
        assert_eq!(filled.surface(Face::NegX), dirt);

        let replaced = map.grid().get(IVec3::new(1, 0, 1)).unwrap();
        assert_eq!(replaced.surface(Face::PosY), stone);
        assert_eq!(replaced.rotation(Face::PosY), 3);
        assert_eq!(replaced.rotation(Face::NegZ), 1);

        let sparse = map.grid().get(IVec3::new(0, 1, 0)).unwrap();
        assert_eq!(sparse.surface(Face::PosZ), grass);
        assert_eq!(sparse.surface(Face::PosY), None);
    }

    #[test]
    fn unknown_tile_is_an_error() {
        let scene = Scene::from_toml_str("[[cells]]\npos = [0, 0, 0]\nall = \"lava\"\n").unwrap();
        let err = scene.apply(&mut Tilemap::new(catalog())).unwrap_err();
        assert!(matches!(err, SceneError::UnknownTile(ref n) if n == "lava"));
    }

    #[test]
    fn empty_scene_is_valid() {
        let scene = Scene::from_toml_str("").unwrap();
        assert_eq!(scene.apply(&mut Tilemap::new(catalog())).unwrap(), 0);
    }
}
