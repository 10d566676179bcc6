use std::collections::VecDeque;

use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};
use tessera_assets::{FillStats, TileMapData, TileSet};
use tessera_common::EntityId;
use tessera_render::{RenderBackend, Scene2D};

use crate::canvas::CanvasCamera;
use crate::history::{EditCommand, History, TileChange};

pub use tessera_assets::MAX_HALF_EXTENT;
pub const MIN_CELL_SIZE: f32 = 0.1;
pub const MAX_CELL_SIZE: f32 = 10.0;

const EMPTY_CELL_COLOR: Vec4 = Vec4::new(0.2, 0.2, 0.2, 0.5);
const GRID_COLOR: Vec4 = Vec4::new(0.4, 0.4, 0.4, 0.6);
const BORDER_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.2, 0.8);
const CROSSHAIR_COLOR: Vec4 = Vec4::new(0.5, 0.5, 0.5, 0.3);
const HOVER_COLOR: Vec4 = Vec4::new(0.3, 0.8, 1.0, 0.4);
const HOVER_ERASE_COLOR: Vec4 = Vec4::new(1.0, 0.3, 0.3, 0.4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Fill,
}

impl Tool {
    pub const ALL: [Self; 3] = [Self::Brush, Self::Eraser, Self::Fill];

    pub fn label(self) -> &'static str {
        match self {
            Self::Brush => "Brush",
            Self::Eraser => "Eraser",
            Self::Fill => "Fill",
        }
    }
}

/// Pointer state for one frame over the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasInput {
    /// Cursor in canvas pixels, `None` when the cursor is off the canvas.
    pub cursor: Option<Vec2>,
    /// Left button: apply the current tool.
    pub primary: bool,
    /// Right button: erase regardless of tool.
    pub secondary: bool,
    /// Middle-button drag since the last frame, in pixels.
    pub pan_delta: Vec2,
    /// Wheel notches since the last frame.
    pub wheel: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no tile map is open")]
    NoMapOpen,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Interactive tile map editing: tools, canvas camera, hover tracking and
/// undo/redo. The editor owns the map while it is open.
///
/// Cell coordinates are map-local (`0..width`, `0..height`); the canvas
/// shows the map centered on the world origin.
#[derive(Debug)]
pub struct TileMapEditor {
    map: Option<TileMapData>,
    tool: Tool,
    selected_tile: u16,
    camera: CanvasCamera,
    hovered: Option<IVec2>,
    history: History,
    /// Changes of the stroke in progress; committed on button release.
    stroke: Vec<TileChange>,
    primary_was_down: bool,
    dirty: bool,
}

impl TileMapEditor {
    pub fn new(canvas_size: Vec2) -> Self {
        Self {
            map: None,
            tool: Tool::Brush,
            selected_tile: 1,
            camera: CanvasCamera::new(canvas_size),
            hovered: None,
            history: History::new(),
            stroke: Vec::new(),
            primary_was_down: false,
            dirty: false,
        }
    }

    /// Open `map` for editing and frame it. Returns the previously open map.
    pub fn open(&mut self, map: TileMapData) -> Option<TileMapData> {
        self.camera.frame(&map);
        tracing::info!(
            width = map.width(),
            height = map.height(),
            handle = %map.handle,
            "tile map opened"
        );
        self.reset_session();
        self.map.replace(map)
    }

    pub fn close(&mut self) -> Option<TileMapData> {
        self.reset_session();
        self.map.take()
    }

    fn reset_session(&mut self) {
        self.history.clear();
        self.stroke.clear();
        self.hovered = None;
        self.primary_was_down = false;
        self.dirty = false;
    }

    pub fn map(&self) -> Option<&TileMapData> {
        self.map.as_ref()
    }

    /// Unsaved edits since the map was opened or last marked saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn selected_tile(&self) -> u16 {
        self.selected_tile
    }

    /// Pick a palette tile. Picking while erasing switches back to the brush.
    pub fn select_tile(&mut self, id: u16) {
        self.selected_tile = id;
        if self.tool == Tool::Eraser {
            self.tool = Tool::Brush;
        }
    }

    pub fn camera(&self) -> &CanvasCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CanvasCamera {
        &mut self.camera
    }

    pub fn hovered_tile(&self) -> Option<IVec2> {
        self.hovered
    }

    pub fn fill_stats(&self) -> Option<FillStats> {
        self.map.as_ref().map(TileMapData::fill_stats)
    }

    /// Apply the current tool at a cell as one undoable edit. Returns the
    /// number of cells changed; cells outside the map change nothing.
    pub fn apply_tool(&mut self, x: i32, y: i32) -> Result<usize, EditError> {
        self.finish_stroke();
        let map = self.map.as_mut().ok_or(EditError::NoMapOpen)?;
        let changes = match self.tool {
            Tool::Brush => paint(map, x, y, self.selected_tile).into_iter().collect(),
            Tool::Eraser => paint(map, x, y, 0).into_iter().collect(),
            Tool::Fill => flood_fill(map, x, y, self.selected_tile),
        };
        Ok(self.commit(changes))
    }

    /// Flood-fill the 4-connected region around `(x, y)` with `replacement`.
    pub fn flood_fill(&mut self, x: i32, y: i32, replacement: u16) -> Result<usize, EditError> {
        self.finish_stroke();
        let map = self.map.as_mut().ok_or(EditError::NoMapOpen)?;
        let changes = flood_fill(map, x, y, replacement);
        Ok(self.commit(changes))
    }

    /// Commit a stroke still in progress, so other edits and history moves
    /// never interleave with its uncommitted changes.
    fn finish_stroke(&mut self) {
        let stroke = std::mem::take(&mut self.stroke);
        self.commit(stroke);
    }

    fn commit(&mut self, changes: Vec<TileChange>) -> usize {
        let count = changes.len();
        if count > 0 {
            self.history.push(EditCommand::SetTiles(changes));
            self.dirty = true;
        }
        count
    }

    /// Process one frame of pointer input: zoom, pan, hover and tool use.
    ///
    /// Brush and eraser strokes paint continuously while a button is held
    /// and become one undo step on release. Fill fires once per press.
    pub fn handle_input(&mut self, input: &CanvasInput) {
        if input.wheel != 0.0 {
            self.camera.zoom_by(input.wheel);
        }
        if input.pan_delta != Vec2::ZERO {
            self.camera.pan(input.pan_delta);
        }

        let Some(map) = self.map.as_mut() else {
            self.hovered = None;
            return;
        };

        self.hovered = input
            .cursor
            .filter(|&p| self.camera.contains(p))
            .map(|p| map.world_to_tile(self.camera.screen_to_world(p)))
            .filter(|c| map.contains(c.x, c.y));

        let pressed = input.primary && !self.primary_was_down;
        self.primary_was_down = input.primary;

        if let Some(cell) = self.hovered {
            if input.secondary {
                self.stroke.extend(paint(map, cell.x, cell.y, 0));
            } else if input.primary {
                match self.tool {
                    Tool::Brush => self
                        .stroke
                        .extend(paint(map, cell.x, cell.y, self.selected_tile)),
                    Tool::Eraser => self.stroke.extend(paint(map, cell.x, cell.y, 0)),
                    Tool::Fill if pressed => {
                        let changes = flood_fill(map, cell.x, cell.y, self.selected_tile);
                        self.stroke.extend(changes);
                    }
                    Tool::Fill => {}
                }
            }
        }

        if !input.primary && !input.secondary {
            self.finish_stroke();
        }
    }

    /// Change the half-extents, keeping the center cell. Values are clamped
    /// to `0..=MAX_HALF_EXTENT`.
    pub fn resize(&mut self, half_width: u32, half_height: u32) -> Result<(), EditError> {
        self.finish_stroke();
        let map = self.map.as_mut().ok_or(EditError::NoMapOpen)?;
        let to = (
            half_width.min(MAX_HALF_EXTENT),
            half_height.min(MAX_HALF_EXTENT),
        );
        let from = (map.half_width(), map.half_height());
        if from == to {
            return Ok(());
        }
        let before = map.tiles().to_vec();
        map.resize(to.0, to.1);
        let after = map.tiles().to_vec();
        self.history.push(EditCommand::Resize {
            from,
            to,
            before,
            after,
        });
        self.hovered = None;
        self.dirty = true;
        Ok(())
    }

    /// Clamped to `MIN_CELL_SIZE..=MAX_CELL_SIZE`.
    pub fn set_cell_size(&mut self, cell_size: f32) -> Result<(), EditError> {
        self.finish_stroke();
        let map = self.map.as_mut().ok_or(EditError::NoMapOpen)?;
        let new = cell_size.clamp(MIN_CELL_SIZE, MAX_CELL_SIZE);
        let old = map.cell_size();
        if old == new {
            return Ok(());
        }
        map.set_cell_size(new);
        self.history.push(EditCommand::CellSize { old, new });
        self.dirty = true;
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), EditError> {
        self.finish_stroke();
        let map = self.map.as_mut().ok_or(EditError::NoMapOpen)?;
        if !self.history.undo(map) {
            return Err(EditError::NothingToUndo);
        }
        self.hovered = None;
        self.dirty = true;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EditError> {
        self.finish_stroke();
        let map = self.map.as_mut().ok_or(EditError::NoMapOpen)?;
        if !self.history.redo(map) {
            return Err(EditError::NothingToRedo);
        }
        self.hovered = None;
        self.dirty = true;
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Draw the open map into a scene begun with the canvas camera: empty
    /// cell backdrops, tiles, grid lines, border, origin crosshair and the
    /// hover highlight.
    pub fn render_canvas<B: RenderBackend>(
        &self,
        scene: &mut Scene2D<'_, B>,
        tile_set: Option<&TileSet>,
    ) {
        let Some(map) = self.map.as_ref() else {
            return;
        };
        let cell = map.cell_size();
        let (width, height) = (map.width() as i32, map.height() as i32);
        let origin = map.grid_origin();
        let size = Vec2::new(width as f32, height as f32) * cell;

        for y in 0..height {
            for x in 0..width {
                if map.get_tile(x, y) == 0 {
                    let center = map.tile_center(x, y);
                    scene.draw_quad(center.extend(0.0), Vec2::splat(cell * 0.98), EMPTY_CELL_COLOR);
                }
            }
        }

        scene.draw_tilemap(
            Mat4::from_translation(origin.extend(0.0)),
            map,
            tile_set,
            EntityId::NONE,
        );

        for x in 0..=width {
            let gx = origin.x + x as f32 * cell;
            scene.draw_line(
                Vec3::new(gx, origin.y, 0.01),
                Vec3::new(gx, origin.y + size.y, 0.01),
                GRID_COLOR,
                EntityId::NONE,
            );
        }
        for y in 0..=height {
            let gy = origin.y + y as f32 * cell;
            scene.draw_line(
                Vec3::new(origin.x, gy, 0.01),
                Vec3::new(origin.x + size.x, gy, 0.01),
                GRID_COLOR,
                EntityId::NONE,
            );
        }

        scene.draw_rect(Vec3::new(0.0, 0.0, 0.02), size, BORDER_COLOR, EntityId::NONE);

        let extent = size.max_element() * 0.1;
        scene.draw_line(
            Vec3::new(-extent, 0.0, 0.02),
            Vec3::new(extent, 0.0, 0.02),
            CROSSHAIR_COLOR,
            EntityId::NONE,
        );
        scene.draw_line(
            Vec3::new(0.0, -extent, 0.02),
            Vec3::new(0.0, extent, 0.02),
            CROSSHAIR_COLOR,
            EntityId::NONE,
        );

        if let Some(cell_pos) = self.hovered {
            let color = if self.tool == Tool::Eraser {
                HOVER_ERASE_COLOR
            } else {
                HOVER_COLOR
            };
            let center = map.tile_center(cell_pos.x, cell_pos.y);
            scene.draw_quad(center.extend(0.05), Vec2::splat(cell), color);
        }
    }
}

fn paint(map: &mut TileMapData, x: i32, y: i32, id: u16) -> Option<TileChange> {
    if map.get_tile(x, y) == id {
        return None;
    }
    let old = map.set_tile(x, y, id)?;
    Some(TileChange { x, y, old, new: id })
}

/// Breadth-first fill over cells equal to the start cell's id, capped at
/// the map's cell count.
fn flood_fill(map: &mut TileMapData, x: i32, y: i32, replacement: u16) -> Vec<TileChange> {
    if !map.contains(x, y) {
        return Vec::new();
    }
    let target = map.get_tile(x, y);
    if target == replacement {
        tracing::debug!(x, y, target, "fill skipped: target equals replacement");
        return Vec::new();
    }

    let limit = (map.width() * map.height()) as usize;
    let mut changes = Vec::new();
    let mut queue = VecDeque::new();

    map.set_tile(x, y, replacement);
    changes.push(TileChange {
        x,
        y,
        old: target,
        new: replacement,
    });
    queue.push_back(IVec2::new(x, y));

    while let Some(cell) = queue.pop_front() {
        for step in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
            let n = cell + step;
            if changes.len() >= limit {
                break;
            }
            if map.contains(n.x, n.y) && map.get_tile(n.x, n.y) == target {
                map.set_tile(n.x, n.y, replacement);
                changes.push(TileChange {
                    x: n.x,
                    y: n.y,
                    old: target,
                    new: replacement,
                });
                queue.push_back(n);
            }
        }
    }

    tracing::debug!(x, y, filled = changes.len(), "flood fill");
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_render::{
        DrawCommand, OrthographicCamera, RecordingBackend, Renderer2D, RendererConfig,
    };

    fn editor_with(map: TileMapData) -> TileMapEditor {
        let mut editor = TileMapEditor::new(Vec2::new(800.0, 600.0));
        editor.open(map);
        editor
    }

    fn filled(width: u32, height: u32, id: u16) -> TileMapData {
        TileMapData::from_grid(width, height, &vec![id; (width * height) as usize])
    }

    #[test]
    fn fill_covers_whole_uniform_region() {
        // from_grid rounds 10 up to 11; fill the 10x10 block that was loaded.
        let mut editor = editor_with(filled(10, 10, 1));
        let count = editor.flood_fill(0, 0, 2).unwrap();
        assert_eq!(count, 100);

        let map = editor.map().unwrap();
        assert_eq!(map.tiles().iter().filter(|&&id| id == 2).count(), 100);
        assert_eq!(map.tiles().iter().filter(|&&id| id == 1).count(), 0);
    }

    #[test]
    fn fill_with_same_id_is_skipped() {
        let mut editor = editor_with(filled(10, 10, 1));
        assert_eq!(editor.flood_fill(3, 3, 1).unwrap(), 0);
        assert!(!editor.can_undo());
    }

    #[test]
    fn fill_stops_at_other_ids() {
        let mut map = TileMapData::new(2, 2);
        for y in 0..5 {
            map.set_tile(2, y, 7);
        }
        let mut editor = editor_with(map);
        assert_eq!(editor.flood_fill(0, 0, 3).unwrap(), 10);
        assert_eq!(editor.map().unwrap().get_tile(4, 4), 0);
    }

    #[test]
    fn fill_undo_restores_region() {
        let mut editor = editor_with(TileMapData::new(2, 2));
        editor.set_tool(Tool::Fill);
        editor.select_tile(5);
        assert_eq!(editor.apply_tool(1, 1).unwrap(), 25);

        editor.undo().unwrap();
        assert_eq!(editor.fill_stats().unwrap().filled, 0);
        editor.redo().unwrap();
        assert_eq!(editor.fill_stats().unwrap().filled, 25);
    }

    #[test]
    fn tools_without_map_error() {
        let mut editor = TileMapEditor::new(Vec2::new(100.0, 100.0));
        assert!(matches!(editor.apply_tool(0, 0), Err(EditError::NoMapOpen)));
        assert!(matches!(editor.resize(1, 1), Err(EditError::NoMapOpen)));
        assert!(editor.fill_stats().is_none());
    }

    #[test]
    fn palette_pick_leaves_eraser() {
        let mut editor = TileMapEditor::new(Vec2::new(100.0, 100.0));
        editor.set_tool(Tool::Eraser);
        editor.select_tile(4);
        assert_eq!(editor.tool(), Tool::Brush);

        editor.set_tool(Tool::Fill);
        editor.select_tile(2);
        assert_eq!(editor.tool(), Tool::Fill);
    }

    #[test]
    fn center_click_hovers_center_cell() {
        let mut editor = TileMapEditor::new(Vec2::new(800.0, 600.0));
        editor.open(TileMapData::new(3, 3));
        editor.camera_mut().zoom = 10.0;

        editor.handle_input(&CanvasInput {
            cursor: Some(Vec2::new(400.0, 300.0)),
            ..CanvasInput::default()
        });
        assert_eq!(editor.hovered_tile(), Some(IVec2::new(3, 3)));
    }

    #[test]
    fn stroke_is_one_undo_step() {
        let mut editor = editor_with(TileMapData::new(3, 3));
        editor.select_tile(2);
        let camera = *editor.camera();

        // Screen position of each cell center along the middle row.
        let map = editor.map().unwrap().clone();
        let to_screen = |cell: IVec2| {
            let world = map.tile_center(cell.x, cell.y) - camera.position;
            let half = camera.zoom * 0.5;
            let ndc = Vec2::new(world.x / (half * camera.aspect()), world.y / half);
            Vec2::new((ndc.x + 1.0) * 0.5 * 800.0, (1.0 - ndc.y) * 0.5 * 600.0)
        };

        for x in 0..4 {
            editor.handle_input(&CanvasInput {
                cursor: Some(to_screen(IVec2::new(x, 3))),
                primary: true,
                ..CanvasInput::default()
            });
        }
        assert!(!editor.can_undo());
        editor.handle_input(&CanvasInput::default());

        assert_eq!(editor.fill_stats().unwrap().filled, 4);
        editor.undo().unwrap();
        assert_eq!(editor.fill_stats().unwrap().filled, 0);
        assert!(matches!(editor.undo(), Err(EditError::NothingToUndo)));
    }

    #[test]
    fn undo_during_held_stroke_commits_stroke_first() {
        let mut editor = editor_with(TileMapData::new(0, 0));
        editor.select_tile(5);
        editor.apply_tool(0, 0).unwrap();

        editor.select_tile(2);
        let held = CanvasInput {
            cursor: Some(Vec2::new(400.0, 300.0)),
            primary: true,
            ..CanvasInput::default()
        };
        editor.handle_input(&held);
        assert_eq!(editor.map().unwrap().get_tile(0, 0), 2);

        editor.undo().unwrap();
        assert_eq!(editor.map().unwrap().get_tile(0, 0), 5);
        editor.handle_input(&CanvasInput::default());
        assert_eq!(editor.map().unwrap().get_tile(0, 0), 5);

        editor.undo().unwrap();
        assert_eq!(editor.map().unwrap().get_tile(0, 0), 0);
        assert!(!editor.can_undo());

        editor.redo().unwrap();
        editor.redo().unwrap();
        assert_eq!(editor.map().unwrap().get_tile(0, 0), 2);
    }

    #[test]
    fn history_moves_clear_hover() {
        let mut editor = editor_with(TileMapData::new(2, 2));
        editor.resize(0, 0).unwrap();
        let hover = CanvasInput {
            cursor: Some(Vec2::new(400.0, 300.0)),
            ..CanvasInput::default()
        };
        editor.handle_input(&hover);
        assert_eq!(editor.hovered_tile(), Some(IVec2::ZERO));

        editor.undo().unwrap();
        assert_eq!(editor.hovered_tile(), None);

        editor.handle_input(&hover);
        assert!(editor.hovered_tile().is_some());
        editor.redo().unwrap();
        assert_eq!(editor.hovered_tile(), None);
    }

    #[test]
    fn right_button_erases() {
        let mut map = TileMapData::new(0, 0);
        map.set_tile(0, 0, 6);
        let mut editor = editor_with(map);

        editor.handle_input(&CanvasInput {
            cursor: Some(Vec2::new(400.0, 300.0)),
            secondary: true,
            ..CanvasInput::default()
        });
        editor.handle_input(&CanvasInput::default());
        assert_eq!(editor.map().unwrap().get_tile(0, 0), 0);
        assert!(editor.is_dirty());
    }

    #[test]
    fn wheel_and_pan_move_camera() {
        let mut editor = TileMapEditor::new(Vec2::new(800.0, 800.0));
        editor.handle_input(&CanvasInput {
            wheel: 1.0,
            pan_delta: Vec2::new(80.0, 0.0),
            ..CanvasInput::default()
        });
        assert!((editor.camera().zoom - 9.0).abs() < 1e-5);
        assert!((editor.camera().position.x + 0.9).abs() < 1e-5);
    }

    #[test]
    fn resize_is_clamped_and_undoable() {
        let mut map = TileMapData::new(2, 2);
        map.set_tile(0, 0, 1);
        let mut editor = editor_with(map);

        editor.resize(1000, 1).unwrap();
        let resized = editor.map().unwrap();
        assert_eq!((resized.half_width(), resized.half_height()), (MAX_HALF_EXTENT, 1));

        editor.undo().unwrap();
        let restored = editor.map().unwrap();
        assert_eq!((restored.half_width(), restored.half_height()), (2, 2));
        assert_eq!(restored.get_tile(0, 0), 1);
    }

    #[test]
    fn cell_size_is_clamped() {
        let mut editor = editor_with(TileMapData::new(1, 1));
        editor.set_cell_size(50.0).unwrap();
        assert_eq!(editor.map().unwrap().cell_size(), MAX_CELL_SIZE);
        editor.set_cell_size(0.0).unwrap();
        assert_eq!(editor.map().unwrap().cell_size(), MIN_CELL_SIZE);
        editor.undo().unwrap();
        assert_eq!(editor.map().unwrap().cell_size(), MAX_CELL_SIZE);
    }

    #[test]
    fn canvas_draws_backdrops_tiles_and_lines() {
        let mut map = TileMapData::new(1, 1);
        map.set_tile(1, 1, 3);
        let editor = editor_with(map);

        let mut renderer = Renderer2D::new(&RendererConfig::default());
        let mut backend = RecordingBackend::new();
        let camera = OrthographicCamera::new(editor.camera().zoom, editor.camera().aspect());
        let mut scene =
            renderer.begin_scene_with_transform(&mut backend, &camera, editor.camera().transform());
        editor.render_canvas(&mut scene, None);
        scene.end_scene();

        let stats = renderer.stats();
        // 8 backdrops + 1 tile, no hover.
        assert_eq!(stats.quad_count, 9);
        // 4 + 4 grid lines, 4 border edges, 2 crosshair arms.
        assert_eq!(stats.line_count, 14);

        // The tile at the center cell straddles the origin.
        let tile = backend.quad_vertices().nth(8 * 4).unwrap();
        assert_eq!(tile.position, [-0.5, -0.5, 0.0]);
        assert!(matches!(backend.commands()[1], DrawCommand::Lines { .. }));
    }
}
