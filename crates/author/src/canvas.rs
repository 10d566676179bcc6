use glam::{Mat4, Vec2};
use tessera_assets::TileMapData;
use tessera_render::OrthographicCamera;

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 100.0;

/// Orthographic view onto the editing canvas.
///
/// `zoom` is the visible height in world units. Screen coordinates are
/// pixels from the canvas' top-left corner, y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasCamera {
    pub position: Vec2,
    pub zoom: f32,
    pub canvas_size: Vec2,
}

impl CanvasCamera {
    pub fn new(canvas_size: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 10.0,
            canvas_size,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.canvas_size.y > 0.0 {
            self.canvas_size.x / self.canvas_size.y
        } else {
            1.0
        }
    }

    pub fn set_canvas_size(&mut self, size: Vec2) {
        self.canvas_size = size;
    }

    /// Whether a screen point lies on the canvas.
    pub fn contains(&self, screen: Vec2) -> bool {
        screen.x >= 0.0
            && screen.y >= 0.0
            && screen.x < self.canvas_size.x
            && screen.y < self.canvas_size.y
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let size = self.canvas_size.max(Vec2::ONE);
        let ndc = Vec2::new(screen.x / size.x * 2.0 - 1.0, 1.0 - screen.y / size.y * 2.0);
        let half = self.zoom * 0.5;
        Vec2::new(ndc.x * half * self.aspect(), ndc.y * half) + self.position
    }

    /// Drag the view by a pixel delta; the content follows the cursor.
    pub fn pan(&mut self, delta_px: Vec2) {
        let size = self.canvas_size.max(Vec2::ONE);
        self.position.x -= delta_px.x * self.zoom * self.aspect() / size.x;
        self.position.y += delta_px.y * self.zoom / size.y;
    }

    /// Zoom by mouse wheel notches; positive zooms in.
    pub fn zoom_by(&mut self, wheel: f32) {
        self.zoom = (self.zoom - wheel * self.zoom * 0.1).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Center on the origin with the whole map in view.
    pub fn frame(&mut self, map: &TileMapData) {
        let extent = map.width().max(map.height()) as f32 * map.cell_size();
        self.position = Vec2::ZERO;
        self.zoom = (extent * 0.7).max(2.0).min(MAX_ZOOM);
    }

    pub fn projection(&self) -> OrthographicCamera {
        OrthographicCamera::new(self.zoom, self.aspect())
    }

    /// Camera placement for `begin_2d_with_transform`.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(self.position.extend(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_render::Camera;

    #[test]
    fn center_click_maps_to_origin() {
        let camera = CanvasCamera::new(Vec2::new(800.0, 600.0));
        let world = camera.screen_to_world(Vec2::new(400.0, 300.0));
        assert!(world.length() < 1e-6);

        let map = TileMapData::new(3, 3);
        assert_eq!(map.world_to_tile(world), glam::IVec2::new(3, 3));
    }

    #[test]
    fn corners_follow_aspect_and_zoom() {
        let mut camera = CanvasCamera::new(Vec2::new(800.0, 600.0));
        camera.position = Vec2::new(1.0, 2.0);
        let top_left = camera.screen_to_world(Vec2::ZERO);
        let aspect = 800.0 / 600.0;
        assert!((top_left.x - (1.0 - 5.0 * aspect)).abs() < 1e-5);
        assert!((top_left.y - 7.0).abs() < 1e-5);
    }

    #[test]
    fn screen_to_world_agrees_with_projection() {
        let mut camera = CanvasCamera::new(Vec2::new(640.0, 480.0));
        camera.position = Vec2::new(-3.0, 4.0);
        camera.zoom = 12.0;
        let world = camera.screen_to_world(Vec2::new(100.0, 50.0));

        let vp = camera.projection().projection() * camera.transform().inverse();
        let ndc = vp.project_point3(world.extend(0.0));
        assert!((ndc.x - (100.0 / 640.0 * 2.0 - 1.0)).abs() < 1e-5);
        assert!((ndc.y - (1.0 - 50.0 / 480.0 * 2.0)).abs() < 1e-5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = CanvasCamera::new(Vec2::new(800.0, 600.0));
        for _ in 0..100 {
            camera.zoom_by(5.0);
        }
        assert_eq!(camera.zoom, MIN_ZOOM);
        for _ in 0..200 {
            camera.zoom_by(-5.0);
        }
        assert_eq!(camera.zoom, MAX_ZOOM);
    }

    #[test]
    fn pan_moves_against_drag() {
        let mut camera = CanvasCamera::new(Vec2::new(800.0, 800.0));
        camera.pan(Vec2::new(80.0, 80.0));
        assert!((camera.position.x + 1.0).abs() < 1e-5);
        assert!((camera.position.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn frame_fits_map() {
        let mut camera = CanvasCamera::new(Vec2::new(800.0, 600.0));
        camera.position = Vec2::ONE;
        camera.frame(&TileMapData::new(5, 2));
        assert_eq!(camera.position, Vec2::ZERO);
        assert!((camera.zoom - 11.0 * 0.7).abs() < 1e-5);

        camera.frame(&TileMapData::new(0, 0));
        assert_eq!(camera.zoom, 2.0);
    }
}
