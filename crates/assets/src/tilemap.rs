use glam::{IVec2, Vec2};
use tessera_common::AssetHandle;

/// Dense tile grid addressed by half-extents.
///
/// The grid is always `2 * half + 1` cells wide and tall, so there is a
/// true center cell at `(half_width, half_height)`. Resizing keeps the
/// center cell fixed and preserves every tile that still fits.
///
/// Cells are stored row-major; id 0 means "empty".
#[derive(Debug, Clone, PartialEq)]
pub struct TileMapData {
    pub handle: AssetHandle,
    /// Weak reference to the tile set that defines this map's ids.
    pub tile_set_handle: AssetHandle,
    half_width: u32,
    half_height: u32,
    cell_size: f32,
    tiles: Vec<u16>,
}

/// Largest half-extent a map may have on either axis.
pub const MAX_HALF_EXTENT: u32 = 512;

/// Largest full width or height, `2 * MAX_HALF_EXTENT + 1`.
pub const MAX_DIMENSION: u32 = 2 * MAX_HALF_EXTENT + 1;

/// Occupancy counts for a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillStats {
    pub total: usize,
    pub filled: usize,
    pub empty: usize,
}

impl TileMapData {
    pub fn new(half_width: u32, half_height: u32) -> Self {
        let width = (2 * half_width + 1) as usize;
        let height = (2 * half_height + 1) as usize;
        Self {
            handle: AssetHandle::NULL,
            tile_set_handle: AssetHandle::NULL,
            half_width,
            half_height,
            cell_size: 1.0,
            tiles: vec![0; width * height],
        }
    }

    /// Build a map from a row-major grid of arbitrary `width x height`.
    ///
    /// Even dimensions round up to the next odd size; the source grid is
    /// placed so its `(width / 2, height / 2)` cell becomes the center.
    /// Missing cells are empty, surplus entries in `tiles` are ignored.
    pub fn from_grid(width: u32, height: u32, tiles: &[u16]) -> Self {
        let mut map = Self::new(width / 2, height / 2);
        for y in 0..height {
            for x in 0..width {
                let Some(&id) = tiles.get((x + y * width) as usize) else {
                    return map;
                };
                if id != 0 {
                    map.set_tile(x as i32, y as i32, id);
                }
            }
        }
        map
    }

    pub fn half_width(&self) -> u32 {
        self.half_width
    }

    pub fn half_height(&self) -> u32 {
        self.half_height
    }

    pub fn width(&self) -> u32 {
        2 * self.half_width + 1
    }

    pub fn height(&self) -> u32 {
        2 * self.half_height + 1
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
    }

    pub fn tiles(&self) -> &[u16] {
        &self.tiles
    }

    /// Grid coordinates of the center cell.
    pub fn center(&self) -> IVec2 {
        IVec2::new(self.half_width as i32, self.half_height as i32)
    }

    /// Change the half-extents, keeping the center cell in place.
    ///
    /// Shrinking drops tiles that fall outside the new bounds.
    pub fn resize(&mut self, half_width: u32, half_height: u32) {
        if half_width == self.half_width && half_height == self.half_height {
            return;
        }

        let old_width = self.width() as i32;
        let old_height = self.height() as i32;
        let dx = half_width as i32 - self.half_width as i32;
        let dy = half_height as i32 - self.half_height as i32;

        let mut resized = Self::new(half_width, half_height);
        for y in 0..old_height {
            for x in 0..old_width {
                let id = self.tiles[(x + y * old_width) as usize];
                if id != 0 {
                    resized.set_tile(x + dx, y + dy, id);
                }
            }
        }

        tracing::debug!(
            from = ?(self.half_width, self.half_height),
            to = ?(half_width, half_height),
            "tile map resized"
        );
        self.half_width = half_width;
        self.half_height = half_height;
        self.tiles = resized.tiles;
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some((x + y * self.width()) as usize)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Tile id at `(x, y)`, or 0 outside the grid.
    pub fn get_tile(&self, x: i32, y: i32) -> u16 {
        self.index(x, y).map_or(0, |i| self.tiles[i])
    }

    /// Write `id` at `(x, y)` and return the previous id.
    /// Out-of-range writes are ignored and return `None`.
    pub fn set_tile(&mut self, x: i32, y: i32, id: u16) -> Option<u16> {
        let i = self.index(x, y)?;
        Some(std::mem::replace(&mut self.tiles[i], id))
    }

    pub fn clear(&mut self) {
        self.tiles.fill(0);
    }

    /// World-space position of the grid's lower-left corner when the map is
    /// centered on the origin.
    pub fn grid_origin(&self) -> Vec2 {
        -Vec2::new(self.width() as f32, self.height() as f32) * self.cell_size * 0.5
    }

    /// Grid cell containing a world-space point, for a map centered on the
    /// origin. The result may lie outside the grid.
    pub fn world_to_tile(&self, world: Vec2) -> IVec2 {
        let local = (world - self.grid_origin()) / self.cell_size;
        local.floor().as_ivec2()
    }

    /// World-space center of cell `(x, y)` for a map centered on the origin.
    pub fn tile_center(&self, x: i32, y: i32) -> Vec2 {
        self.grid_origin() + (Vec2::new(x as f32, y as f32) + 0.5) * self.cell_size
    }

    pub fn fill_stats(&self) -> FillStats {
        let filled = self.tiles.iter().filter(|&&id| id != 0).count();
        FillStats {
            total: self.tiles.len(),
            filled,
            empty: self.tiles.len() - filled,
        }
    }
}

impl Default for TileMapData {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_are_odd() {
        let map = TileMapData::new(2, 3);
        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 7);
        assert_eq!(map.tiles().len(), 35);
        assert_eq!(map.center(), IVec2::new(2, 3));
    }

    #[test]
    fn out_of_range_access_is_ignored() {
        let mut map = TileMapData::new(1, 1);
        assert_eq!(map.set_tile(-1, 0, 4), None);
        assert_eq!(map.set_tile(3, 0, 4), None);
        assert_eq!(map.get_tile(0, 3), 0);
        assert_eq!(map.get_tile(-5, -5), 0);
        assert_eq!(map.fill_stats().filled, 0);
    }

    #[test]
    fn set_tile_returns_previous() {
        let mut map = TileMapData::new(1, 1);
        assert_eq!(map.set_tile(1, 1, 4), Some(0));
        assert_eq!(map.set_tile(1, 1, 6), Some(4));
        assert_eq!(map.get_tile(1, 1), 6);
    }

    #[test]
    fn resize_round_trip_keeps_center() {
        let mut map = TileMapData::new(2, 2);
        map.set_tile(2, 2, 5);

        map.resize(5, 5);
        assert_eq!(map.width(), 11);
        assert_eq!(map.get_tile(5, 5), 5);

        map.resize(2, 2);
        assert_eq!(map.get_tile(2, 2), 5);
        assert_eq!(map.fill_stats().filled, 1);
    }

    #[test]
    fn shrinking_drops_outer_tiles() {
        let mut map = TileMapData::new(2, 2);
        map.set_tile(0, 0, 1);
        map.set_tile(3, 2, 2);
        map.resize(1, 1);
        assert_eq!(map.get_tile(2, 1), 2);
        assert_eq!(map.fill_stats().filled, 1);
    }

    #[test]
    fn resize_to_same_extents_is_noop() {
        let mut map = TileMapData::new(1, 1);
        map.set_tile(0, 0, 3);
        let before = map.clone();
        map.resize(1, 1);
        assert_eq!(map, before);
    }

    #[test]
    fn from_grid_centers_even_sizes() {
        // 4x2 grid; cell (2, 1) becomes the center of a 5x3 map.
        let tiles = [0, 0, 0, 0, 0, 0, 9, 0];
        let map = TileMapData::from_grid(4, 2, &tiles);
        assert_eq!((map.width(), map.height()), (5, 3));
        assert_eq!(map.get_tile(2, 1), 9);
    }

    #[test]
    fn from_grid_tolerates_short_tile_lists() {
        let map = TileMapData::from_grid(3, 3, &[1, 2]);
        assert_eq!(map.get_tile(0, 0), 1);
        assert_eq!(map.get_tile(1, 0), 2);
        assert_eq!(map.fill_stats().filled, 2);
    }

    #[test]
    fn world_to_tile_on_centered_grid() {
        let map = TileMapData::new(3, 3);
        assert_eq!(map.grid_origin(), Vec2::new(-3.5, -3.5));
        assert_eq!(map.world_to_tile(Vec2::ZERO), IVec2::new(3, 3));
        assert_eq!(map.world_to_tile(Vec2::new(-3.6, 0.0)), IVec2::new(-1, 3));
        assert_eq!(map.tile_center(3, 3), Vec2::ZERO);
    }
}
