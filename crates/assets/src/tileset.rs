use std::collections::HashMap;

use glam::{IVec2, Vec2, Vec4};
use tessera_common::{AssetHandle, Texture};

use crate::AssetError;

/// Default edge length in pixels of one atlas cell.
pub const DEFAULT_TILE_SIZE: u32 = 16;

/// Full-texture UV corners, counter-clockwise from bottom-left.
pub const FULL_UV: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// An atlas texture sliced into square cells of `tile_size` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TileAtlasSource {
    pub texture_handle: AssetHandle,
    pub tile_size: u32,
    /// Runtime texture resolved from `texture_handle`. Never serialized.
    pub cached_texture: Option<Texture>,
}

impl TileAtlasSource {
    pub fn new(texture_handle: AssetHandle, tile_size: u32) -> Self {
        Self {
            texture_handle,
            tile_size,
            cached_texture: None,
        }
    }

    /// UV corners of the atlas cell at `coords` (column, row), or `None`
    /// when the atlas texture has not been resolved.
    ///
    /// A tile size of zero falls back to [`DEFAULT_TILE_SIZE`].
    pub fn uv_rect(&self, coords: IVec2) -> Option<[Vec2; 4]> {
        let texture = self.cached_texture?;
        if texture.width == 0 || texture.height == 0 {
            return None;
        }
        let ts = if self.tile_size == 0 {
            DEFAULT_TILE_SIZE
        } else {
            self.tile_size
        } as f32;
        let u = ts / texture.width as f32;
        let v = ts / texture.height as f32;

        let u0 = coords.x as f32 * u;
        let u1 = (coords.x + 1) as f32 * u;
        let v0 = coords.y as f32 * v;
        let v1 = (coords.y + 1) as f32 * v;
        Some([
            Vec2::new(u0, v0),
            Vec2::new(u1, v0),
            Vec2::new(u1, v1),
            Vec2::new(u0, v1),
        ])
    }

    /// Number of (columns, rows) the resolved atlas holds.
    pub fn grid_size(&self) -> Option<(u32, u32)> {
        let texture = self.cached_texture?;
        let ts = self.tile_size.max(1);
        Some(((texture.width / ts).max(1), (texture.height / ts).max(1)))
    }
}

impl Default for TileAtlasSource {
    fn default() -> Self {
        Self::new(AssetHandle::NULL, DEFAULT_TILE_SIZE)
    }
}

/// Where a tile's pixels come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileSource {
    /// A cell of `TileSet::atlas_sources()[source_index]` at (column, row).
    Atlas { source_index: u32, coords: IVec2 },
    /// A standalone texture covering the whole tile.
    Individual { texture_handle: AssetHandle },
}

impl TileSource {
    /// Numeric tag used by the asset file format.
    pub fn type_tag(&self) -> i64 {
        match self {
            Self::Atlas { .. } => 0,
            Self::Individual { .. } => 1,
        }
    }
}

/// Definition of one tile id.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDef {
    pub id: u16,
    pub source: TileSource,
    pub tint: Vec4,
    pub collidable: bool,
    /// Runtime texture for `TileSource::Individual`. Never serialized.
    pub cached_texture: Option<Texture>,
}

impl TileDef {
    pub fn atlas(id: u16, source_index: u32, coords: IVec2) -> Self {
        Self {
            id,
            source: TileSource::Atlas {
                source_index,
                coords,
            },
            tint: Vec4::ONE,
            collidable: false,
            cached_texture: None,
        }
    }

    pub fn individual(id: u16, texture_handle: AssetHandle) -> Self {
        Self {
            id,
            source: TileSource::Individual { texture_handle },
            tint: Vec4::ONE,
            collidable: false,
            cached_texture: None,
        }
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }
}

/// A palette of tile definitions plus the atlas textures they slice.
///
/// Tile id 0 is reserved for "empty" and can never be defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileSet {
    pub handle: AssetHandle,
    atlas_sources: Vec<TileAtlasSource>,
    tile_defs: HashMap<u16, TileDef>,
}

impl TileSet {
    pub fn new(handle: AssetHandle) -> Self {
        Self {
            handle,
            ..Self::default()
        }
    }

    /// Append an atlas source and return its index.
    pub fn add_atlas_source(&mut self, source: TileAtlasSource) -> u32 {
        self.atlas_sources.push(source);
        (self.atlas_sources.len() - 1) as u32
    }

    pub fn atlas_sources(&self) -> &[TileAtlasSource] {
        &self.atlas_sources
    }

    pub fn atlas_sources_mut(&mut self) -> &mut [TileAtlasSource] {
        &mut self.atlas_sources
    }

    pub fn atlas_source(&self, index: u32) -> Option<&TileAtlasSource> {
        self.atlas_sources.get(index as usize)
    }

    /// Insert or replace the definition for `def.id`.
    pub fn add_tile_def(&mut self, def: TileDef) -> Result<(), AssetError> {
        if def.id == 0 {
            return Err(AssetError::ReservedTileId);
        }
        self.tile_defs.insert(def.id, def);
        Ok(())
    }

    pub fn remove_tile_def(&mut self, id: u16) -> Option<TileDef> {
        self.tile_defs.remove(&id)
    }

    /// Definition for `id`. Id 0 and unknown ids resolve to `None`.
    pub fn tile_def(&self, id: u16) -> Option<&TileDef> {
        self.tile_defs.get(&id)
    }

    pub fn tile_defs(&self) -> impl Iterator<Item = &TileDef> {
        self.tile_defs.values()
    }

    pub fn tile_defs_mut(&mut self) -> impl Iterator<Item = &mut TileDef> {
        self.tile_defs.values_mut()
    }

    /// Definitions ordered by id.
    pub fn sorted_tile_defs(&self) -> Vec<&TileDef> {
        let mut defs: Vec<&TileDef> = self.tile_defs.values().collect();
        defs.sort_by_key(|d| d.id);
        defs
    }

    pub fn tile_count(&self) -> usize {
        self.tile_defs.len()
    }

    /// One past the largest defined id, or `None` once `u16::MAX` is taken.
    pub fn next_tile_id(&self) -> Option<u16> {
        let max = self.tile_defs.keys().copied().max().unwrap_or(0);
        max.checked_add(1)
    }

    /// Define one atlas tile per cell of atlas `source_index`, row-major,
    /// starting at [`next_tile_id`](Self::next_tile_id). Returns the ids.
    pub fn add_atlas_grid(&mut self, source_index: u32) -> Result<Vec<u16>, AssetError> {
        let Some((cols, rows)) = self.atlas_source(source_index).and_then(|s| s.grid_size())
        else {
            return Ok(Vec::new());
        };
        let mut ids = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let id = self.next_tile_id().ok_or(AssetError::TileIdsExhausted)?;
                self.add_tile_def(TileDef::atlas(
                    id,
                    source_index,
                    IVec2::new(col as i32, row as i32),
                ))?;
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// UV corners for a tile: the atlas cell for atlas tiles, the full
    /// texture for individual tiles.
    pub fn uv_rect(&self, def: &TileDef) -> Option<[Vec2; 4]> {
        match def.source {
            TileSource::Atlas {
                source_index,
                coords,
            } => self.atlas_source(source_index)?.uv_rect(coords),
            TileSource::Individual { .. } => Some(FULL_UV),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::TextureId;

    fn atlas(width: u32, height: u32, tile_size: u32) -> TileAtlasSource {
        TileAtlasSource {
            texture_handle: AssetHandle(7),
            tile_size,
            cached_texture: Some(Texture::new(TextureId(7), width, height)),
        }
    }

    #[test]
    fn zero_id_is_rejected() {
        let mut set = TileSet::new(AssetHandle::new());
        let err = set.add_tile_def(TileDef::atlas(0, 0, IVec2::ZERO));
        assert!(matches!(err, Err(AssetError::ReservedTileId)));
        assert_eq!(set.tile_count(), 0);
    }

    #[test]
    fn lookup_of_zero_and_unknown_is_none() {
        let mut set = TileSet::default();
        set.add_tile_def(TileDef::atlas(3, 0, IVec2::ZERO)).unwrap();
        assert!(set.tile_def(0).is_none());
        assert!(set.tile_def(4).is_none());
        assert_eq!(set.tile_def(3).unwrap().id, 3);
    }

    #[test]
    fn next_tile_id_is_max_plus_one() {
        let mut set = TileSet::default();
        assert_eq!(set.next_tile_id(), Some(1));
        set.add_tile_def(TileDef::atlas(2, 0, IVec2::ZERO)).unwrap();
        set.add_tile_def(TileDef::atlas(9, 0, IVec2::ZERO)).unwrap();
        assert_eq!(set.next_tile_id(), Some(10));

        set.add_tile_def(TileDef::atlas(u16::MAX, 0, IVec2::ZERO))
            .unwrap();
        assert_eq!(set.next_tile_id(), None);
    }

    #[test]
    fn atlas_uv_rect() {
        let source = atlas(64, 32, 16);
        let uv = source.uv_rect(IVec2::new(1, 1)).unwrap();
        assert_eq!(uv[0], Vec2::new(0.25, 0.5));
        assert_eq!(uv[1], Vec2::new(0.5, 0.5));
        assert_eq!(uv[2], Vec2::new(0.5, 1.0));
        assert_eq!(uv[3], Vec2::new(0.25, 1.0));
    }

    #[test]
    fn zero_tile_size_falls_back_to_sixteen() {
        let source = atlas(32, 32, 0);
        let uv = source.uv_rect(IVec2::ZERO).unwrap();
        assert_eq!(uv[2], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn unresolved_atlas_has_no_uvs() {
        let source = TileAtlasSource::new(AssetHandle(1), 16);
        assert!(source.uv_rect(IVec2::ZERO).is_none());
    }

    #[test]
    fn individual_tiles_use_full_uv() {
        let set = TileSet::default();
        let def = TileDef::individual(1, AssetHandle(5));
        assert_eq!(set.uv_rect(&def), Some(FULL_UV));
    }

    #[test]
    fn atlas_grid_defines_one_tile_per_cell() {
        let mut set = TileSet::default();
        let index = set.add_atlas_source(atlas(48, 32, 16));
        let ids = set.add_atlas_grid(index).unwrap();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        match set.tile_def(5).unwrap().source {
            TileSource::Atlas { coords, .. } => assert_eq!(coords, IVec2::new(1, 1)),
            other => panic!("unexpected source {other:?}"),
        }
    }
}
