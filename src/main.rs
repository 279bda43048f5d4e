mod config;
mod scene;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use tilemap_atlas::AtlasPacker;
use tilemap_edit::{TileCatalog, Tilemap};
use tilemap_geom::IVec3;

use crate::config::AppConfig;
use crate::scene::Scene;

#[derive(Parser, Debug)]
#[command(name = "tilemap3d", about = "Sparse voxel tilemap: atlas packing, meshing and box colliders")]
struct Cli {
    /// TOML file with an `[atlas]` section
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack every tile of a catalog into one atlas PNG
    Pack {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Mesh a scene and report the render and collision buffers
    Build {
        #[command(flatten)]
        input: SceneArgs,
        /// Also write the packed atlas here
        #[arg(long)]
        atlas_out: Option<PathBuf>,
    },
    /// Merge a scene's cells into box colliders and print them
    Boxes {
        #[command(flatten)]
        input: SceneArgs,
    },
}

#[derive(Args, Debug)]
struct SceneArgs {
    #[arg(long)]
    catalog: PathBuf,
    #[arg(long)]
    scene: PathBuf,
    #[command(flatten)]
    transform: TransformArgs,
}

#[derive(Args, Debug, Default)]
struct TransformArgs {
    /// Offset every cell, as `x,y,z`
    #[arg(long, value_parser = parse_ivec3, allow_hyphen_values = true)]
    shift: Option<IVec3>,
    #[arg(long)]
    flip_x: bool,
    #[arg(long)]
    flip_z: bool,
    /// Quarter turn about +Y
    #[arg(long, value_enum)]
    rotate: Option<Rotation>,
    /// Move the bounding-box center to the origin
    #[arg(long, conflicts_with = "bottom_center")]
    center: bool,
    /// Center on x/z and rest the lowest layer on y = 0
    #[arg(long)]
    bottom_center: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Rotation {
    Cw,
    Ccw,
}

fn parse_ivec3(s: &str) -> Result<IVec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z, got `{s}`"));
    };
    let num = |v: &str| v.parse::<i32>().map_err(|e| format!("`{v}`: {e}"));
    Ok(IVec3::new(num(*x)?, num(*y)?, num(*z)?))
}

impl TransformArgs {
    /// Applied in flag order: shift, flips, rotation, then centering.
    fn apply(&self, map: &mut Tilemap) {
        if let Some(offset) = self.shift {
            map.shift(offset);
        }
        if self.flip_x {
            map.flip_x();
        }
        if self.flip_z {
            map.flip_z();
        }
        match self.rotate {
            Some(Rotation::Cw) => map.rotate_cw(),
            Some(Rotation::Ccw) => map.rotate_ccw(),
            None => {}
        }
        if self.center {
            map.center_origin();
        } else if self.bottom_center {
            map.bottom_center_origin();
        }
    }
}

/// Catalog plus scene, without the transform flags applied.
fn load_map(input: &SceneArgs) -> Result<Tilemap, Box<dyn Error>> {
    let catalog = TileCatalog::from_path(&input.catalog)?;
    let scene = Scene::from_path(&input.scene)?;
    let mut map = Tilemap::new(catalog);
    let n = scene.apply(&mut map)?;
    log::info!("loaded {} cells from {}", n, input.scene.display());
    Ok(map)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let cfg = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Pack { catalog, out } => {
            let mut catalog = TileCatalog::from_path(&catalog)?;
            let images = catalog.load_images()?;
            let atlas = catalog.pack(&mut AtlasPacker::new(cfg.atlas), &images)?;
            atlas.save_png(&out)?;
            log::info!("wrote {}", out.display());
            for s in catalog.surfaces() {
                if let Some(r) = s.rect {
                    println!("{:>4} {:<24} {} {} {} {}", s.id.0, s.name, r.x, r.y, r.width, r.height);
                }
            }
        }
        Command::Build { input, atlas_out } => {
            let mut map = load_map(&input)?;
            // Pack first so the rebuild after each transform has rects.
            let atlas = map.pack_from_disk(&mut AtlasPacker::new(cfg.atlas))?;
            input.transform.apply(&mut map);
            if let Some(path) = atlas_out {
                atlas.save_png(&path)?;
                log::info!("wrote {}", path.display());
            }
            if map.needs_rebuild() {
                map.rebuild_mesh();
            }
            let mesh = map.mesh();
            println!(
                "render: {} quads, {} vertices, {} triangles",
                mesh.render.quad_count(),
                mesh.render.vertex_count(),
                mesh.render.idx.len() / 3
            );
            println!(
                "collision: {} quads, {} vertices, {} triangles",
                mesh.collision.quad_count(),
                mesh.collision.vertex_count(),
                mesh.collision.idx.len() / 3
            );
            match mesh.render.bounds.or(mesh.collision.bounds) {
                Some(b) => println!(
                    "bounds: ({}, {}, {}) .. ({}, {}, {})",
                    b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z
                ),
                None => println!("bounds: empty"),
            }
        }
        Command::Boxes { input } => {
            let mut map = load_map(&input)?;
            input.transform.apply(&mut map);
            let n = map.merge_boxes().len();
            log::info!("{} cells merged into {} boxes", map.grid().len(), n);
            for c in map.box_colliders() {
                println!(
                    "center ({}, {}, {}) size ({}, {}, {})",
                    c.center.x, c.center.y, c.center.z, c.size.x, c.size.y, c.size.z
                );
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
