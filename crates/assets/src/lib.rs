//! Tile assets: tile sets, tile map data, their YAML file format and the
//! asset store that owns them.
//!
//! The renderer and the editor only borrow assets; the store owns them and
//! resolves handles to runtime textures.

mod error;
mod palette;
mod serializer;
mod store;
mod tilemap;
mod tileset;

pub use error::AssetError;
pub use palette::palette_atlas;
pub use serializer::{AssetSerializer, TileMapSerializer, TileSetSerializer};
pub use store::{AssetStore, TextureAsset};
pub use tilemap::{FillStats, MAX_DIMENSION, MAX_HALF_EXTENT, TileMapData};
pub use tileset::{DEFAULT_TILE_SIZE, FULL_UV, TileAtlasSource, TileDef, TileSet, TileSource};
