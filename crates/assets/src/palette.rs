//! Procedural atlas of solid color swatches, used when no artwork is
//! available. The output is deterministic, so its content hash (and thus its
//! handle) is stable across runs.

/// RGBA8 pixels of a `columns x rows` atlas of `tile_size` swatches, each
/// with a one-pixel darker rim. Returns `(width, height, pixels)`.
pub fn palette_atlas(columns: u32, rows: u32, tile_size: u32) -> (u32, u32, Vec<u8>) {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let tile_size = tile_size.max(2);
    let width = columns * tile_size;
    let height = rows * tile_size;
    let count = columns * rows;

    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let (cx, cy) = (x / tile_size, y / tile_size);
            let index = cx + cy * columns;
            let [r, g, b] = swatch(index as f32 / count as f32);

            let (lx, ly) = (x % tile_size, y % tile_size);
            let rim = lx == 0 || ly == 0 || lx == tile_size - 1 || ly == tile_size - 1;
            let shade = if rim { 0.6 } else { 1.0 };
            pixels.extend_from_slice(&[
                (r * shade * 255.0) as u8,
                (g * shade * 255.0) as u8,
                (b * shade * 255.0) as u8,
                255,
            ]);
        }
    }
    (width, height, pixels)
}

/// Fully saturated hue at `t` in [0, 1), slightly desaturated.
fn swatch(t: f32) -> [f32; 3] {
    let h = t * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let [r, g, b] = match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    };
    [0.25 + r * 0.7, 0.25 + g * 0.7, 0.25 + b * 0.7]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_dimensions() {
        let (w, h, pixels) = palette_atlas(4, 2, 16);
        assert_eq!((w, h), (64, 32));
        assert_eq!(pixels.len(), 64 * 32 * 4);
    }

    #[test]
    fn swatches_differ() {
        let (w, _, pixels) = palette_atlas(2, 1, 4);
        let center = |cx: u32| {
            let i = ((2 * w + cx * 4 + 2) * 4) as usize;
            pixels[i..i + 4].to_vec()
        };
        assert_ne!(center(0), center(1));
    }

    #[test]
    fn deterministic() {
        assert_eq!(palette_atlas(3, 3, 8), palette_atlas(3, 3, 8));
    }
}
