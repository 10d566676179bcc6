//! YAML asset files for tile sets and tile maps.
//!
//! Every file starts with an `AssetType` tag; a missing or mismatched tag
//! rejects the whole file before any field is read.

use std::path::Path;

use glam::{IVec2, Vec4};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tessera_common::AssetHandle;

use crate::{
    AssetError, MAX_DIMENSION, TileAtlasSource, TileDef, TileMapData, TileSet, TileSource,
};

/// Reads and writes one asset kind as a tagged YAML document.
pub trait AssetSerializer {
    type Asset;

    /// Value of the `AssetType` key.
    const ASSET_TYPE: &'static str;

    fn to_yaml(asset: &Self::Asset) -> Result<String, AssetError>;

    /// Build the asset from a document whose tag has already been checked.
    fn from_document(document: Value) -> Result<Self::Asset, AssetError>;

    fn from_yaml(text: &str) -> Result<Self::Asset, AssetError> {
        let document: Value = serde_yaml::from_str(text)?;
        let found = document
            .get("AssetType")
            .and_then(Value::as_str)
            .map(str::to_owned);
        if found.as_deref() != Some(Self::ASSET_TYPE) {
            return Err(AssetError::WrongAssetType {
                expected: Self::ASSET_TYPE,
                found,
            });
        }
        Self::from_document(document)
    }

    fn serialize(path: impl AsRef<Path>, asset: &Self::Asset) -> Result<(), AssetError> {
        let path = path.as_ref();
        let text = Self::to_yaml(asset)?;
        // A failed write leaves any existing file intact.
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, text).map_err(|e| AssetError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| AssetError::io(path, e))?;
        tracing::debug!(path = %path.display(), kind = Self::ASSET_TYPE, "asset written");
        Ok(())
    }

    fn try_deserialize(path: impl AsRef<Path>) -> Result<Self::Asset, AssetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        Self::from_yaml(&text)
    }

    /// Load an asset, logging and returning `None` on any failure.
    fn deserialize(path: impl AsRef<Path>) -> Option<Self::Asset> {
        let path = path.as_ref();
        match Self::try_deserialize(path) {
            Ok(asset) => Some(asset),
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    kind = Self::ASSET_TYPE,
                    "failed to load asset: {e}"
                );
                None
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TileSetDocument {
    asset_type: String,
    #[serde(default)]
    handle: u64,
    #[serde(default)]
    atlas_sources: Vec<AtlasSourceEntry>,
    #[serde(default)]
    tile_defs: Vec<TileDefEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AtlasSourceEntry {
    texture_handle: u64,
    tile_size: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TileDefEntry {
    #[serde(rename = "ID")]
    id: i64,
    source_type: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    atlas_source_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    atlas_coords_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    atlas_coords_y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    texture_handle: Option<u64>,
    #[serde(default)]
    tint: Option<Vec<f32>>,
    #[serde(default)]
    collidable: bool,
}

impl TileDefEntry {
    fn from_def(def: &TileDef) -> Self {
        let mut entry = Self {
            id: i64::from(def.id),
            source_type: def.source.type_tag(),
            atlas_source_index: None,
            atlas_coords_x: None,
            atlas_coords_y: None,
            texture_handle: None,
            tint: Some(def.tint.to_array().to_vec()),
            collidable: def.collidable,
        };
        match def.source {
            TileSource::Atlas {
                source_index,
                coords,
            } => {
                entry.atlas_source_index = Some(source_index);
                entry.atlas_coords_x = Some(coords.x);
                entry.atlas_coords_y = Some(coords.y);
            }
            TileSource::Individual { texture_handle } => {
                entry.texture_handle = Some(texture_handle.0);
            }
        }
        entry
    }

    fn into_def(self) -> Result<TileDef, AssetError> {
        let id = u16::try_from(self.id)
            .map_err(|_| AssetError::Malformed(format!("tile id {} out of range", self.id)))?;
        let source = match self.source_type {
            0 => {
                let missing =
                    |field: &str| AssetError::Malformed(format!("atlas tile {id} has no {field}"));
                TileSource::Atlas {
                    source_index: self
                        .atlas_source_index
                        .ok_or_else(|| missing("AtlasSourceIndex"))?,
                    coords: IVec2::new(
                        self.atlas_coords_x.ok_or_else(|| missing("AtlasCoordsX"))?,
                        self.atlas_coords_y.ok_or_else(|| missing("AtlasCoordsY"))?,
                    ),
                }
            }
            1 => TileSource::Individual {
                texture_handle: AssetHandle(self.texture_handle.unwrap_or(0)),
            },
            other => return Err(AssetError::UnknownSourceType(other)),
        };
        // A tint is only honored with exactly four components.
        let tint = match self.tint.as_deref() {
            Some(&[r, g, b, a]) => Vec4::new(r, g, b, a),
            _ => Vec4::ONE,
        };
        Ok(TileDef {
            id,
            source,
            tint,
            collidable: self.collidable,
            cached_texture: None,
        })
    }
}

/// YAML format for [`TileSet`].
pub struct TileSetSerializer;

impl AssetSerializer for TileSetSerializer {
    type Asset = TileSet;
    const ASSET_TYPE: &'static str = "TileSet";

    fn to_yaml(set: &TileSet) -> Result<String, AssetError> {
        let document = TileSetDocument {
            asset_type: Self::ASSET_TYPE.into(),
            handle: set.handle.0,
            atlas_sources: set
                .atlas_sources()
                .iter()
                .map(|s| AtlasSourceEntry {
                    texture_handle: s.texture_handle.0,
                    tile_size: s.tile_size,
                })
                .collect(),
            tile_defs: set
                .sorted_tile_defs()
                .into_iter()
                .map(TileDefEntry::from_def)
                .collect(),
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    fn from_document(document: Value) -> Result<TileSet, AssetError> {
        let document: TileSetDocument = serde_yaml::from_value(document)?;
        let mut set = TileSet::new(AssetHandle(document.handle));
        for source in document.atlas_sources {
            set.add_atlas_source(TileAtlasSource::new(
                AssetHandle(source.texture_handle),
                source.tile_size,
            ));
        }
        for entry in document.tile_defs {
            let def = entry.into_def()?;
            if let Err(e) = set.add_tile_def(def) {
                tracing::warn!("skipping tile definition: {e}");
            }
        }
        Ok(set)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TileMapDocument {
    asset_type: String,
    #[serde(default)]
    handle: u64,
    #[serde(default)]
    tile_set_handle: u64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
    #[serde(default)]
    tiles: Vec<i64>,
}

fn default_cell_size() -> f32 {
    1.0
}

/// YAML format for [`TileMapData`].
pub struct TileMapSerializer;

impl AssetSerializer for TileMapSerializer {
    type Asset = TileMapData;
    const ASSET_TYPE: &'static str = "TileMap";

    fn to_yaml(map: &TileMapData) -> Result<String, AssetError> {
        let document = TileMapDocument {
            asset_type: Self::ASSET_TYPE.into(),
            handle: map.handle.0,
            tile_set_handle: map.tile_set_handle.0,
            width: map.width(),
            height: map.height(),
            cell_size: map.cell_size(),
            tiles: map.tiles().iter().map(|&t| i64::from(t)).collect(),
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    fn from_document(document: Value) -> Result<TileMapData, AssetError> {
        let document: TileMapDocument = serde_yaml::from_value(document)?;
        if document.width > MAX_DIMENSION || document.height > MAX_DIMENSION {
            return Err(AssetError::Malformed(format!(
                "map size {}x{} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}",
                document.width, document.height
            )));
        }
        let expected = document.width as usize * document.height as usize;
        if document.tiles.len() != expected {
            tracing::warn!(
                expected,
                found = document.tiles.len(),
                "tile count does not match map size"
            );
        }
        let tiles: Vec<u16> = document
            .tiles
            .iter()
            .map(|&t| u16::try_from(t).unwrap_or(0))
            .collect();

        let mut map = TileMapData::from_grid(document.width, document.height, &tiles);
        map.handle = AssetHandle(document.handle);
        map.tile_set_handle = AssetHandle(document.tile_set_handle);
        map.set_cell_size(document.cell_size);
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> TileSet {
        let mut set = TileSet::new(AssetHandle(42));
        set.add_atlas_source(TileAtlasSource::new(AssetHandle(100), 32));
        set.add_tile_def(
            TileDef::atlas(1, 0, IVec2::new(2, 3))
                .with_tint(Vec4::new(1.0, 0.5, 0.25, 1.0))
                .with_collidable(true),
        )
        .unwrap();
        set.add_tile_def(TileDef::individual(7, AssetHandle(200)))
            .unwrap();
        set
    }

    #[test]
    fn tile_set_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let set = sample_set();
        TileSetSerializer::serialize(tmp.path(), &set).unwrap();

        let loaded = TileSetSerializer::deserialize(tmp.path()).unwrap();
        assert_eq!(loaded, set);
    }

    #[test]
    fn tile_set_file_layout() {
        let text = TileSetSerializer::to_yaml(&sample_set()).unwrap();
        assert!(text.contains("AssetType: TileSet"));
        assert!(text.contains("AtlasSources:"));
        assert!(text.contains("TileSize: 32"));
        assert!(text.contains("ID: 1"));
        assert!(text.contains("AtlasCoordsY: 3"));
        assert!(text.contains("TextureHandle: 200"));
        assert!(text.contains("Collidable: true"));
    }

    #[test]
    fn wrong_asset_type_is_rejected() {
        let text = "AssetType: TileMap\nHandle: 1\n";
        let err = TileSetSerializer::from_yaml(text).unwrap_err();
        assert!(matches!(err, AssetError::WrongAssetType { .. }));

        let err = TileSetSerializer::from_yaml("Handle: 1\n").unwrap_err();
        assert!(matches!(
            err,
            AssetError::WrongAssetType { found: None, .. }
        ));
    }

    #[test]
    fn missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TileSetSerializer::deserialize(dir.path().join("nope.tileset")).is_none());
        assert!(TileMapSerializer::deserialize(dir.path().join("nope.tilemap")).is_none());
    }

    #[test]
    fn bad_tint_falls_back_to_white() {
        let text = "\
AssetType: TileSet
Handle: 1
TileDefs:
  - ID: 3
    SourceType: 1
    TextureHandle: 9
    Tint: [0.5, 0.5]
";
        let set = TileSetSerializer::from_yaml(text).unwrap();
        assert_eq!(set.tile_def(3).unwrap().tint, Vec4::ONE);
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let text = "\
AssetType: TileSet
TileDefs:
  - ID: 3
    SourceType: 4
";
        let err = TileSetSerializer::from_yaml(text).unwrap_err();
        assert!(matches!(err, AssetError::UnknownSourceType(4)));
    }

    #[test]
    fn tile_map_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut map = TileMapData::new(2, 1);
        map.handle = AssetHandle(5);
        map.tile_set_handle = AssetHandle(42);
        map.set_cell_size(0.5);
        map.set_tile(0, 0, 1);
        map.set_tile(4, 2, 300);

        TileMapSerializer::serialize(tmp.path(), &map).unwrap();
        let loaded = TileMapSerializer::deserialize(tmp.path()).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn tile_map_with_short_tile_list_loads() {
        let text = "\
AssetType: TileMap
Handle: 1
TileSetHandle: 2
Width: 3
Height: 3
CellSize: 2.0
Tiles: [1, 2, 3]
";
        let map = TileMapSerializer::from_yaml(text).unwrap();
        assert_eq!((map.width(), map.height()), (3, 3));
        assert_eq!(map.cell_size(), 2.0);
        assert_eq!(map.get_tile(2, 0), 3);
        assert_eq!(map.fill_stats().filled, 3);
    }

    #[test]
    fn serialize_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.tilemap.yaml");
        let mut map = TileMapData::new(1, 1);
        TileMapSerializer::serialize(&path, &map).unwrap();

        map.set_tile(1, 1, 9);
        TileMapSerializer::serialize(&path, &map).unwrap();

        let loaded = TileMapSerializer::try_deserialize(&path).unwrap();
        assert_eq!(loaded.get_tile(1, 1), 9);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn oversized_tile_map_is_rejected() {
        let text = "\
AssetType: TileMap
Handle: 1
TileSetHandle: 2
Width: 4294967295
Height: 4294967295
CellSize: 1.0
Tiles: []
";
        let err = TileMapSerializer::from_yaml(text).unwrap_err();
        assert!(matches!(err, AssetError::Malformed(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.tilemap.yaml");
        std::fs::write(&path, text).unwrap();
        assert!(TileMapSerializer::deserialize(&path).is_none());
    }

    #[test]
    fn largest_tile_map_loads() {
        let text = format!(
            "AssetType: TileMap\nHandle: 1\nTileSetHandle: 0\nWidth: {MAX_DIMENSION}\nHeight: 1\nCellSize: 1.0\nTiles: [4]\n"
        );
        let map = TileMapSerializer::from_yaml(&text).unwrap();
        assert_eq!(map.width(), MAX_DIMENSION);
        assert_eq!(map.get_tile(0, 0), 4);
    }
}
