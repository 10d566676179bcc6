use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tessera_common::{AssetHandle, Texture, TextureId};

use crate::serializer::{AssetSerializer, TileMapSerializer, TileSetSerializer};
use crate::{AssetError, TileMapData, TileSet, TileSource};

/// RGBA8 texture registered with the store.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub texture: Texture,
    pub pixels: Vec<u8>,
}

/// Owns tile sets, tile maps and texture metadata, keyed by handle.
///
/// File-backed assets remember their source path so they can be saved in
/// place. The registry (handles and paths, no pixel data) can be persisted
/// to a YAML manifest.
#[derive(Debug, Default)]
pub struct AssetStore {
    textures: BTreeMap<AssetHandle, TextureAsset>,
    tile_sets: BTreeMap<AssetHandle, TileSet>,
    tile_maps: BTreeMap<AssetHandle, TileMapData>,
    sources: BTreeMap<AssetHandle, PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegistryManifest {
    #[serde(default)]
    tile_sets: Vec<RegistryEntry>,
    #[serde(default)]
    tile_maps: Vec<RegistryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RegistryEntry {
    handle: u64,
    path: PathBuf,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register RGBA8 pixels and return their content-addressed handle.
    ///
    /// Identical pixel data always maps to the same handle and texture id.
    pub fn register_texture(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> AssetHandle {
        let hash = content_hash(width, height, &pixels);
        let handle = AssetHandle(hash);
        self.textures.entry(handle).or_insert_with(|| {
            tracing::debug!(%handle, width, height, "texture registered");
            TextureAsset {
                texture: Texture::new(TextureId(hash), width, height),
                pixels,
            }
        });
        handle
    }

    /// Register a [`palette_atlas`](crate::palette_atlas) and return its
    /// handle. The same arguments always give the same handle.
    pub fn register_palette_atlas(&mut self, columns: u32, rows: u32, tile_size: u32) -> AssetHandle {
        let (width, height, pixels) = crate::palette_atlas(columns, rows, tile_size);
        self.register_texture(width, height, pixels)
    }

    pub fn texture(&self, handle: AssetHandle) -> Option<Texture> {
        self.textures.get(&handle).map(|t| t.texture)
    }

    pub fn texture_asset(&self, handle: AssetHandle) -> Option<&TextureAsset> {
        self.textures.get(&handle)
    }

    pub fn textures(&self) -> impl Iterator<Item = &TextureAsset> {
        self.textures.values()
    }

    /// Insert a tile set, assigning a fresh handle if it has none.
    pub fn insert_tile_set(&mut self, mut set: TileSet) -> AssetHandle {
        if set.handle.is_null() {
            set.handle = AssetHandle::new();
        }
        let handle = set.handle;
        self.tile_sets.insert(handle, set);
        handle
    }

    pub fn tile_set(&self, handle: AssetHandle) -> Option<&TileSet> {
        self.tile_sets.get(&handle)
    }

    pub fn tile_set_mut(&mut self, handle: AssetHandle) -> Option<&mut TileSet> {
        self.tile_sets.get_mut(&handle)
    }

    /// Insert a tile map, assigning a fresh handle if it has none.
    pub fn insert_tile_map(&mut self, mut map: TileMapData) -> AssetHandle {
        if map.handle.is_null() {
            map.handle = AssetHandle::new();
        }
        let handle = map.handle;
        self.tile_maps.insert(handle, map);
        handle
    }

    pub fn tile_map(&self, handle: AssetHandle) -> Option<&TileMapData> {
        self.tile_maps.get(&handle)
    }

    pub fn tile_map_mut(&mut self, handle: AssetHandle) -> Option<&mut TileMapData> {
        self.tile_maps.get_mut(&handle)
    }

    /// The map together with the tile set it references, if loaded.
    pub fn tile_map_with_set(&self, handle: AssetHandle) -> Option<(&TileMapData, Option<&TileSet>)> {
        let map = self.tile_maps.get(&handle)?;
        Some((map, self.tile_sets.get(&map.tile_set_handle)))
    }

    pub fn source_path(&self, handle: AssetHandle) -> Option<&Path> {
        self.sources.get(&handle).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.textures.len() + self.tile_sets.len() + self.tile_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a tile set file and resolve its textures against the store.
    pub fn import_tile_set(&mut self, path: impl AsRef<Path>) -> Result<AssetHandle, AssetError> {
        let path = path.as_ref();
        let set = TileSetSerializer::try_deserialize(path)?;
        let handle = self.insert_tile_set(set);
        self.sources.insert(handle, path.to_path_buf());
        self.resolve_tile_set_textures(handle);
        tracing::info!(%handle, path = %path.display(), "tile set imported");
        Ok(handle)
    }

    pub fn import_tile_map(&mut self, path: impl AsRef<Path>) -> Result<AssetHandle, AssetError> {
        let path = path.as_ref();
        let map = TileMapSerializer::try_deserialize(path)?;
        let handle = self.insert_tile_map(map);
        self.sources.insert(handle, path.to_path_buf());
        tracing::info!(%handle, path = %path.display(), "tile map imported");
        Ok(handle)
    }

    /// Write a tile map back to the file it was imported from.
    pub fn save_tile_map(&self, handle: AssetHandle) -> Result<(), AssetError> {
        let path = self
            .sources
            .get(&handle)
            .ok_or(AssetError::NoSourcePath(handle))?;
        let map = self.tile_maps.get(&handle).ok_or(AssetError::NotFound(handle))?;
        TileMapSerializer::serialize(path, map)
    }

    /// Write a tile map to `path` and make that its source path.
    pub fn save_tile_map_as(
        &mut self,
        handle: AssetHandle,
        path: impl AsRef<Path>,
    ) -> Result<(), AssetError> {
        let path = path.as_ref();
        let map = self.tile_maps.get(&handle).ok_or(AssetError::NotFound(handle))?;
        TileMapSerializer::serialize(path, map)?;
        self.sources.insert(handle, path.to_path_buf());
        Ok(())
    }

    /// Write a tile set to `path` and make that its source path.
    pub fn save_tile_set_as(
        &mut self,
        handle: AssetHandle,
        path: impl AsRef<Path>,
    ) -> Result<(), AssetError> {
        let path = path.as_ref();
        let set = self.tile_sets.get(&handle).ok_or(AssetError::NotFound(handle))?;
        TileSetSerializer::serialize(path, set)?;
        self.sources.insert(handle, path.to_path_buf());
        Ok(())
    }

    /// Fill the runtime texture caches of a tile set from registered
    /// textures. Returns how many references could not be resolved; each
    /// miss is logged and later renders as a white fallback quad.
    pub fn resolve_tile_set_textures(&mut self, handle: AssetHandle) -> usize {
        let Some(set) = self.tile_sets.get_mut(&handle) else {
            return 0;
        };
        let textures = &self.textures;
        let lookup = |h: AssetHandle| textures.get(&h).map(|t| t.texture);

        let mut missing = 0;
        for (index, source) in set.atlas_sources_mut().iter_mut().enumerate() {
            source.cached_texture = lookup(source.texture_handle);
            if source.cached_texture.is_none() {
                tracing::warn!(
                    tile_set = %handle,
                    index,
                    texture = %source.texture_handle,
                    "atlas texture not found"
                );
                missing += 1;
            }
        }
        for def in set.tile_defs_mut() {
            if let TileSource::Individual { texture_handle } = def.source {
                def.cached_texture = lookup(texture_handle);
                if def.cached_texture.is_none() {
                    tracing::warn!(
                        tile_set = %handle,
                        tile = def.id,
                        texture = %texture_handle,
                        "tile texture not found"
                    );
                    missing += 1;
                }
            }
        }
        missing
    }

    /// Save the registry of file-backed tile assets as a YAML manifest.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let entries = |handles: Vec<AssetHandle>| -> Vec<RegistryEntry> {
            handles
                .into_iter()
                .filter_map(|h| {
                    self.sources.get(&h).map(|p| RegistryEntry {
                        handle: h.0,
                        path: p.clone(),
                    })
                })
                .collect()
        };
        let manifest = RegistryManifest {
            tile_sets: entries(self.tile_sets.keys().copied().collect()),
            tile_maps: entries(self.tile_maps.keys().copied().collect()),
        };
        let file = std::fs::File::create(path).map_err(|e| AssetError::io(path, e))?;
        serde_yaml::to_writer(file, &manifest)?;
        Ok(())
    }

    /// Rebuild a store by importing every asset listed in a manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| AssetError::io(path, e))?;
        let manifest: RegistryManifest = serde_yaml::from_reader(file)?;

        let mut store = Self::new();
        for entry in manifest.tile_sets {
            store.import_tile_set(&entry.path)?;
        }
        for entry in manifest.tile_maps {
            store.import_tile_map(&entry.path)?;
        }
        Ok(store)
    }
}

fn content_hash(width: u32, height: u32, pixels: &[u8]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(pixels);
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    // Zero is reserved for the null handle and the white texture.
    u64::from_le_bytes(bytes).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TileAtlasSource, TileDef};
    use glam::IVec2;

    #[test]
    fn texture_registration_dedups_by_content() {
        let mut store = AssetStore::new();
        let a = store.register_texture(2, 1, vec![255; 8]);
        let b = store.register_texture(2, 1, vec![255; 8]);
        let c = store.register_texture(2, 1, vec![0; 8]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
        assert_eq!(store.texture(a).unwrap().width, 2);
    }

    #[test]
    fn insert_assigns_handles() {
        let mut store = AssetStore::new();
        let set = store.insert_tile_set(TileSet::default());
        let map = store.insert_tile_map(TileMapData::new(1, 1));
        assert!(!set.is_null());
        assert!(!map.is_null());
        assert_eq!(store.tile_map(map).unwrap().handle, map);
    }

    #[test]
    fn resolve_reports_missing_textures() {
        let mut store = AssetStore::new();
        let atlas = store.register_texture(32, 32, vec![7; 32 * 32 * 4]);

        let mut set = TileSet::default();
        set.add_atlas_source(TileAtlasSource::new(atlas, 16));
        set.add_atlas_source(TileAtlasSource::new(AssetHandle(99), 16));
        set.add_tile_def(TileDef::atlas(1, 0, IVec2::ZERO)).unwrap();
        set.add_tile_def(TileDef::individual(2, AssetHandle(98)))
            .unwrap();
        let handle = store.insert_tile_set(set);

        assert_eq!(store.resolve_tile_set_textures(handle), 2);
        let set = store.tile_set(handle).unwrap();
        assert!(set.atlas_sources()[0].cached_texture.is_some());
        assert!(set.atlas_sources()[1].cached_texture.is_none());
    }

    #[test]
    fn save_tile_map_requires_source_path() {
        let mut store = AssetStore::new();
        let handle = store.insert_tile_map(TileMapData::new(1, 1));
        assert!(matches!(
            store.save_tile_map(handle),
            Err(AssetError::NoSourcePath(_))
        ));
    }

    #[test]
    fn registry_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new();

        let set = store.insert_tile_set(TileSet::default());
        store
            .save_tile_set_as(set, dir.path().join("terrain.tileset"))
            .unwrap();

        let mut map = TileMapData::new(2, 2);
        map.tile_set_handle = set;
        map.set_tile(2, 2, 1);
        let map = store.insert_tile_map(map);
        store
            .save_tile_map_as(map, dir.path().join("level.tilemap"))
            .unwrap();

        store.tile_map_mut(map).unwrap().set_tile(0, 0, 1);
        store.save_tile_map(map).unwrap();

        let manifest = dir.path().join("assets.yaml");
        store.save(&manifest).unwrap();

        let loaded = AssetStore::load(&manifest).unwrap();
        let (loaded_map, loaded_set) = loaded.tile_map_with_set(map).unwrap();
        assert!(loaded_set.is_some());
        assert_eq!(loaded_map.fill_stats().filled, 2);
    }
}
