use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Mat4;
use tessera_assets::{
    AssetSerializer, AssetStore, TileAtlasSource, TileMapData, TileMapSerializer, TileSet,
    TileSetSerializer, TileSource,
};
use tessera_author::{MAX_HALF_EXTENT, TileMapEditor, Tool};
use tessera_common::{AssetHandle, EntityId};
use tessera_render::{
    GraphicsApi, OrthographicCamera, RecordingBackend, RendererConfig, RendererContext,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera-cli", about = "CLI tool for tessera tile assets")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Renderer configuration (YAML); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, renderer limits and graphics APIs
    Info,
    /// Create or inspect tile set files
    #[command(subcommand)]
    Tileset(TilesetCommand),
    /// Create, inspect or edit tile map files
    #[command(subcommand)]
    Tilemap(TilemapCommand),
    /// Draw a tile map through the headless renderer and report batch statistics
    RenderStats {
        map: PathBuf,
        /// Tile set used to resolve tile ids
        #[arg(long)]
        tileset: Option<PathBuf>,
        /// Palette atlas layout to register for atlas sources
        #[arg(long, default_value = "4")]
        palette_columns: u32,
        #[arg(long, default_value = "4")]
        palette_rows: u32,
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TilesetCommand {
    /// Create a tile set over a generated palette atlas, one tile per cell
    New {
        path: PathBuf,
        #[arg(long, default_value = "4")]
        columns: u32,
        #[arg(long, default_value = "4")]
        rows: u32,
        #[arg(long, default_value = "16")]
        tile_size: u32,
    },
    /// List atlas sources and tile definitions
    Inspect { path: PathBuf },
}

#[derive(Subcommand)]
enum TilemapCommand {
    /// Create an empty tile map
    New {
        path: PathBuf,
        #[arg(long, default_value = "8")]
        half_width: u32,
        #[arg(long, default_value = "8")]
        half_height: u32,
        #[arg(long, default_value = "1.0")]
        cell_size: f32,
        /// Tile set file whose handle the map references
        #[arg(long)]
        tileset: Option<PathBuf>,
    },
    /// Print dimensions, occupancy and optionally the grid
    Inspect {
        path: PathBuf,
        /// Print the grid, top row first
        #[arg(long)]
        grid: bool,
    },
    /// Change half-extents, keeping the center cell
    Resize {
        path: PathBuf,
        #[arg(long)]
        half_width: u32,
        #[arg(long)]
        half_height: u32,
    },
    /// Write one tile (0 erases)
    Paint {
        path: PathBuf,
        x: i32,
        y: i32,
        tile: u16,
    },
    /// Flood-fill the region around a cell
    Fill {
        path: PathBuf,
        x: i32,
        y: i32,
        tile: u16,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => RendererConfig::load(path)
            .with_context(|| format!("loading renderer config {}", path.display()))?,
        None => RendererConfig::default(),
    };

    match cli.command {
        Commands::Info => info(&config),
        Commands::Tileset(cmd) => tileset(cmd),
        Commands::Tilemap(cmd) => tilemap(cmd),
        Commands::RenderStats {
            map,
            tileset,
            palette_columns,
            palette_rows,
            json,
        } => render_stats(
            &config,
            &map,
            tileset.as_deref(),
            (palette_columns, palette_rows),
            json,
        ),
    }
}

fn info(config: &RendererConfig) -> anyhow::Result<()> {
    println!("tessera-cli v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "renderer: max_quads={} (vertices={}, indices={}), texture_slots={}, max_instances={}, line_width={}",
        config.max_quads,
        config.max_vertices(),
        config.max_indices(),
        config.max_texture_slots,
        config.max_instances,
        config.line_width,
    );
    for api in [
        GraphicsApi::Headless,
        GraphicsApi::Wgpu,
        GraphicsApi::Vulkan,
        GraphicsApi::DirectX12,
        GraphicsApi::Metal,
    ] {
        let status = if api.is_implemented() {
            "available"
        } else {
            "not implemented"
        };
        println!("api {api}: {status}");
    }
    Ok(())
}

fn tileset(cmd: TilesetCommand) -> anyhow::Result<()> {
    match cmd {
        TilesetCommand::New {
            path,
            columns,
            rows,
            tile_size,
        } => {
            let mut store = AssetStore::new();
            let atlas = store.register_palette_atlas(columns, rows, tile_size);
            let mut set = TileSet::new(AssetHandle::new());
            let index = set.add_atlas_source(TileAtlasSource::new(atlas, tile_size));
            let handle = store.insert_tile_set(set);
            store.resolve_tile_set_textures(handle);

            let set = store
                .tile_set_mut(handle)
                .context("tile set vanished from store")?;
            let ids = set.add_atlas_grid(index)?;
            store.save_tile_set_as(handle, &path)?;
            println!(
                "Created tile set {handle} with {} tiles at {}",
                ids.len(),
                path.display()
            );
        }
        TilesetCommand::Inspect { path } => {
            let set = TileSetSerializer::try_deserialize(&path)
                .with_context(|| format!("reading tile set {}", path.display()))?;
            println!("Tile set {}", set.handle);
            for (i, source) in set.atlas_sources().iter().enumerate() {
                println!(
                    "  atlas {i}: texture={} tile_size={}",
                    source.texture_handle, source.tile_size
                );
            }
            for def in set.sorted_tile_defs() {
                let source = match def.source {
                    TileSource::Atlas {
                        source_index,
                        coords,
                    } => format!("atlas {source_index} ({}, {})", coords.x, coords.y),
                    TileSource::Individual { texture_handle } => {
                        format!("texture {texture_handle}")
                    }
                };
                println!(
                    "  tile {:>4}: {source} tint={:?} collidable={}",
                    def.id,
                    def.tint.to_array(),
                    def.collidable
                );
            }
            match set.next_tile_id() {
                Some(id) => println!("next tile id: {id}"),
                None => println!("next tile id: exhausted"),
            }
        }
    }
    Ok(())
}

fn load_map(path: &Path) -> anyhow::Result<TileMapData> {
    TileMapSerializer::try_deserialize(path)
        .with_context(|| format!("reading tile map {}", path.display()))
}

fn save_map(path: &Path, map: &TileMapData) -> anyhow::Result<()> {
    TileMapSerializer::serialize(path, map)
        .with_context(|| format!("writing tile map {}", path.display()))
}

/// Run an edit through the editor so file edits follow the same rules as
/// interactive ones.
fn edit_map(
    path: &Path,
    edit: impl FnOnce(&mut TileMapEditor) -> anyhow::Result<()>,
) -> anyhow::Result<TileMapData> {
    let mut editor = TileMapEditor::new(glam::Vec2::new(800.0, 600.0));
    editor.open(load_map(path)?);
    edit(&mut editor)?;
    let map = editor.close().context("editor lost the map")?;
    save_map(path, &map)?;
    Ok(map)
}

fn tilemap(cmd: TilemapCommand) -> anyhow::Result<()> {
    match cmd {
        TilemapCommand::New {
            path,
            half_width,
            half_height,
            cell_size,
            tileset,
        } => {
            let mut map = TileMapData::new(
                half_width.min(MAX_HALF_EXTENT),
                half_height.min(MAX_HALF_EXTENT),
            );
            map.handle = AssetHandle::new();
            map.set_cell_size(cell_size);
            if let Some(tileset) = tileset {
                let set = TileSetSerializer::try_deserialize(&tileset)
                    .with_context(|| format!("reading tile set {}", tileset.display()))?;
                map.tile_set_handle = set.handle;
            }
            save_map(&path, &map)?;
            println!(
                "Created {}x{} tile map {} at {}",
                map.width(),
                map.height(),
                map.handle,
                path.display()
            );
        }
        TilemapCommand::Inspect { path, grid } => {
            let map = load_map(&path)?;
            let stats = map.fill_stats();
            println!("Tile map {}", map.handle);
            println!("  tile set: {}", map.tile_set_handle);
            println!(
                "  size: {}x{} (half {}x{}), cell size {}",
                map.width(),
                map.height(),
                map.half_width(),
                map.half_height(),
                map.cell_size()
            );
            println!(
                "  tiles: {} total, {} filled, {} empty",
                stats.total, stats.filled, stats.empty
            );
            if grid {
                for y in (0..map.height() as i32).rev() {
                    let row: Vec<String> = (0..map.width() as i32)
                        .map(|x| match map.get_tile(x, y) {
                            0 => "   .".to_string(),
                            id => format!("{id:>4}"),
                        })
                        .collect();
                    println!("{}", row.concat());
                }
            }
        }
        TilemapCommand::Resize {
            path,
            half_width,
            half_height,
        } => {
            let map = edit_map(&path, |editor| {
                editor.resize(half_width, half_height)?;
                Ok(())
            })?;
            println!("Resized to {}x{}", map.width(), map.height());
        }
        TilemapCommand::Paint { path, x, y, tile } => {
            let mut changed = 0;
            edit_map(&path, |editor| {
                if tile == 0 {
                    editor.set_tool(Tool::Eraser);
                } else {
                    editor.select_tile(tile);
                }
                changed = editor.apply_tool(x, y)?;
                Ok(())
            })?;
            println!("{changed} cell(s) changed");
        }
        TilemapCommand::Fill { path, x, y, tile } => {
            let mut changed = 0;
            edit_map(&path, |editor| {
                changed = editor.flood_fill(x, y, tile)?;
                Ok(())
            })?;
            println!("{changed} cell(s) filled");
        }
    }
    Ok(())
}

fn render_stats(
    config: &RendererConfig,
    map_path: &Path,
    tileset_path: Option<&Path>,
    palette: (u32, u32),
    json: bool,
) -> anyhow::Result<()> {
    let mut store = AssetStore::new();
    let map_handle = store.import_tile_map(map_path)?;

    let mut missing = 0;
    if let Some(path) = tileset_path {
        let set = TileSetSerializer::try_deserialize(path)
            .with_context(|| format!("reading tile set {}", path.display()))?;
        for source in set.atlas_sources() {
            store.register_palette_atlas(palette.0, palette.1, source.tile_size);
        }
        let set_handle = store.insert_tile_set(set);
        missing = store.resolve_tile_set_textures(set_handle);
    }

    let (map, set) = store
        .tile_map_with_set(map_handle)
        .context("tile map vanished from store")?;
    if tileset_path.is_some() && set.is_none() {
        tracing::warn!(
            map = %map.tile_set_handle,
            "tile set does not match the map's tile set handle"
        );
    }

    let mut ctx = RendererContext::new(RecordingBackend::new(), *config)?;
    let camera = OrthographicCamera::new(map.height() as f32 * map.cell_size(), 1.0);
    let origin = Mat4::from_translation(map.grid_origin().extend(0.0));
    let mut scene = ctx.begin_2d(&camera);
    scene.draw_tilemap(origin, map, set, EntityId::NONE);
    scene.end_scene();

    let stats = ctx.stats_2d();
    let textures: usize = ctx
        .backend()
        .commands()
        .iter()
        .map(|c| match c {
            tessera_render::DrawCommand::Quads { textures, .. } => textures.len(),
            _ => 0,
        })
        .max()
        .unwrap_or(0);

    if json {
        let report = serde_json::json!({
            "map": map_path.display().to_string(),
            "width": map.width(),
            "height": map.height(),
            "stats": stats,
            "total_vertex_count": stats.total_vertex_count(),
            "total_index_count": stats.total_index_count(),
            "max_textures_per_batch": textures,
            "unresolved_textures": missing,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Rendered {} ({}x{})", map_path.display(), map.width(), map.height());
        println!(
            "  draw calls: {}, quads: {}, vertices: {}, indices: {}",
            stats.draw_calls,
            stats.quad_count,
            stats.total_vertex_count(),
            stats.total_index_count()
        );
        println!("  max textures per batch: {textures}, unresolved textures: {missing}");
    }
    Ok(())
}
