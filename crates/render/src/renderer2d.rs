use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use serde::Serialize;
use tessera_assets::{FULL_UV, TileDef, TileMapData, TileSet, TileSource};
use tessera_common::{EntityId, Texture};

use crate::arena::VertexArena;
use crate::backend::RenderBackend;
use crate::camera::Camera;
use crate::config::RendererConfig;
use crate::primitives::{QUAD_POSITIONS, QUAD_TEX_COORDS};
use crate::texture_slots::TextureSlots;
use crate::vertex::{CircleVertex, LineVertex, QuadVertex};

/// Flat-colored or textured quad description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub color: Vec4,
    pub texture: Option<Texture>,
    pub tiling_factor: f32,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: None,
            tiling_factor: 1.0,
        }
    }
}

/// Counters accumulated across scenes until [`Renderer2D::reset_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats2D {
    pub draw_calls: u32,
    pub quad_count: u32,
    pub circle_count: u32,
    pub line_count: u32,
}

impl Stats2D {
    pub fn total_vertex_count(&self) -> u32 {
        (self.quad_count + self.circle_count) * 4 + self.line_count * 2
    }

    pub fn total_index_count(&self) -> u32 {
        (self.quad_count + self.circle_count) * 6
    }
}

/// Batch state for quads, circles and lines.
///
/// Arenas are allocated once from the [`RendererConfig`]. Drawing happens
/// through a [`Scene2D`] obtained from [`begin_scene`](Self::begin_scene).
#[derive(Debug)]
pub struct Renderer2D {
    config: RendererConfig,
    quads: VertexArena<QuadVertex>,
    quad_index_count: u32,
    circles: VertexArena<CircleVertex>,
    circle_index_count: u32,
    lines: VertexArena<LineVertex>,
    slots: TextureSlots,
    line_width: f32,
    /// Bumped every time a batch starts; slot indices resolved in an older
    /// generation are invalid.
    batch_generation: u64,
    stats: Stats2D,
}

impl Renderer2D {
    pub fn new(config: &RendererConfig) -> Self {
        let max_vertices = config.max_vertices() as usize;
        Self {
            config: *config,
            quads: VertexArena::with_capacity(max_vertices),
            quad_index_count: 0,
            circles: VertexArena::with_capacity(max_vertices),
            circle_index_count: 0,
            lines: VertexArena::with_capacity(max_vertices),
            slots: TextureSlots::new(config.max_texture_slots as usize),
            line_width: config.line_width,
            batch_generation: 0,
            stats: Stats2D::default(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn stats(&self) -> Stats2D {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = Stats2D::default();
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    /// Start a scene using the camera's own view-projection.
    pub fn begin_scene<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        camera: &dyn Camera,
    ) -> Scene2D<'a, B> {
        self.begin(backend, camera.view_projection())
    }

    /// Start a scene with the camera placed by `transform`
    /// (view-projection = projection * transform⁻¹).
    pub fn begin_scene_with_transform<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        camera: &dyn Camera,
        transform: Mat4,
    ) -> Scene2D<'a, B> {
        self.begin(backend, camera.projection() * transform.inverse())
    }

    fn begin<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        view_projection: Mat4,
    ) -> Scene2D<'a, B> {
        backend.set_view_projection(view_projection);
        self.start_batch();
        Scene2D {
            renderer: self,
            backend,
            ended: false,
        }
    }

    fn start_batch(&mut self) {
        self.quads.clear();
        self.quad_index_count = 0;
        self.circles.clear();
        self.circle_index_count = 0;
        self.lines.clear();
        self.slots.reset();
        self.batch_generation += 1;
    }
}

/// An open 2D scene. Draw calls accumulate into the current batch; a batch
/// is flushed to the backend when it would overflow, when the texture slot
/// table is full, and at [`end_scene`](Self::end_scene).
///
/// Dropping a scene without calling `end_scene` still flushes it.
pub struct Scene2D<'a, B: RenderBackend> {
    renderer: &'a mut Renderer2D,
    backend: &'a mut B,
    ended: bool,
}

/// Atlas slot indices resolved in one batch generation.
struct AtlasSlotCache {
    generation: u64,
    slots: Vec<Option<f32>>,
}

impl AtlasSlotCache {
    fn sync(&mut self, generation: u64) {
        if self.generation != generation {
            self.slots.fill(None);
            self.generation = generation;
        }
    }
}

impl<B: RenderBackend> Scene2D<'_, B> {
    pub fn backend(&self) -> &B {
        self.backend
    }

    pub fn stats(&self) -> Stats2D {
        self.renderer.stats
    }

    /// Whether `vertex_count` more quad vertices or `index_count` more quad
    /// indices would exceed the quad batch.
    pub fn needs_new_batch(&self, vertex_count: u32, index_count: u32) -> bool {
        let r = &*self.renderer;
        !r.quads.fits(vertex_count as usize)
            || r.quad_index_count + index_count > r.config.max_indices()
    }

    /// Flush everything accumulated and start an empty batch.
    pub fn next_batch(&mut self) {
        self.flush();
        self.renderer.start_batch();
    }

    /// Issue one draw per non-empty primitive kind: quads, circles, lines.
    pub fn flush(&mut self) {
        let r = &mut *self.renderer;
        let _span = tracing::trace_span!("flush_2d", quads = r.quad_index_count / 6).entered();

        if r.quad_index_count > 0 {
            self.backend
                .draw_quads(r.quads.as_slice(), r.quad_index_count, r.slots.as_slice());
            r.stats.draw_calls += 1;
        }
        if r.circle_index_count > 0 {
            self.backend
                .draw_circles(r.circles.as_slice(), r.circle_index_count);
            r.stats.draw_calls += 1;
        }
        if !r.lines.is_empty() {
            self.backend.draw_lines(r.lines.as_slice(), r.line_width);
            r.stats.draw_calls += 1;
        }
    }

    pub fn end_scene(mut self) {
        self.flush();
        self.ended = true;
    }

    /// Slot for `texture` in the current batch, starting a new batch first
    /// when the slot table is full.
    fn texture_slot(&mut self, texture: Texture) -> f32 {
        if let Some(slot) = self.renderer.slots.find(texture.id) {
            return slot as f32;
        }
        if self.renderer.slots.is_full() {
            self.next_batch();
        }
        self.renderer.slots.push(texture).map_or(0.0, |slot| slot as f32)
    }

    fn push_quad(
        &mut self,
        corners: [Vec3; 4],
        color: Vec4,
        tex_coords: &[Vec2; 4],
        tex_index: f32,
        tiling_factor: f32,
        entity: EntityId,
    ) {
        let vertices: [QuadVertex; 4] = std::array::from_fn(|i| {
            QuadVertex::new(
                corners[i],
                color,
                tex_coords[i],
                tex_index,
                tiling_factor,
                entity,
            )
        });
        let r = &mut *self.renderer;
        let pushed = r.quads.extend(&vertices);
        debug_assert!(pushed, "quad emitted without a capacity check");
        r.quad_index_count += 6;
        r.stats.quad_count += 1;
    }

    pub fn draw_quad(&mut self, position: Vec3, size: Vec2, color: Vec4) {
        let transform = Mat4::from_translation(position) * Mat4::from_scale(size.extend(1.0));
        self.draw_quad_transform(transform, color, EntityId::NONE);
    }

    pub fn draw_rotated_quad(
        &mut self,
        position: Vec3,
        size: Vec2,
        rotation_degrees: f32,
        color: Vec4,
    ) {
        let transform = Mat4::from_scale_rotation_translation(
            size.extend(1.0),
            Quat::from_rotation_z(rotation_degrees.to_radians()),
            position,
        );
        self.draw_quad_transform(transform, color, EntityId::NONE);
    }

    pub fn draw_quad_transform(&mut self, transform: Mat4, color: Vec4, entity: EntityId) {
        if self.needs_new_batch(4, 6) {
            self.next_batch();
        }
        self.push_quad(
            transform_corners(transform),
            color,
            &QUAD_TEX_COORDS,
            0.0,
            1.0,
            entity,
        );
    }

    pub fn draw_textured_quad(
        &mut self,
        transform: Mat4,
        texture: Texture,
        tiling_factor: f32,
        tint: Vec4,
        entity: EntityId,
    ) {
        if self.needs_new_batch(4, 6) {
            self.next_batch();
        }
        let tex_index = self.texture_slot(texture);
        self.push_quad(
            transform_corners(transform),
            tint,
            &QUAD_TEX_COORDS,
            tex_index,
            tiling_factor,
            entity,
        );
    }

    /// Quad sampling an explicit UV rectangle, e.g. one atlas cell.
    /// Without a texture the quad is drawn with the white texture.
    pub fn draw_quad_uv(
        &mut self,
        transform: Mat4,
        texture: Option<Texture>,
        tex_coords: [Vec2; 4],
        tint: Vec4,
        entity: EntityId,
    ) {
        if self.needs_new_batch(4, 6) {
            self.next_batch();
        }
        let tex_index = texture.map_or(0.0, |t| self.texture_slot(t));
        self.push_quad(
            transform_corners(transform),
            tint,
            &tex_coords,
            tex_index,
            1.0,
            entity,
        );
    }

    pub fn draw_sprite(&mut self, transform: Mat4, sprite: &Sprite, entity: EntityId) {
        match sprite.texture {
            Some(texture) => self.draw_textured_quad(
                transform,
                texture,
                sprite.tiling_factor,
                sprite.color,
                entity,
            ),
            None => self.draw_quad_transform(transform, sprite.color, entity),
        }
    }

    /// Ring or disc on the unit quad. `thickness` 1 fills the disc; `fade`
    /// softens the edge.
    pub fn draw_circle(
        &mut self,
        transform: Mat4,
        color: Vec4,
        thickness: f32,
        fade: f32,
        entity: EntityId,
    ) {
        if !self.renderer.circles.fits(4)
            || self.renderer.circle_index_count + 6 > self.renderer.config.max_indices()
        {
            self.next_batch();
        }
        let vertices: [CircleVertex; 4] = std::array::from_fn(|i| CircleVertex {
            world_position: (transform * QUAD_POSITIONS[i]).truncate().to_array(),
            local_position: (QUAD_POSITIONS[i].truncate() * 2.0).to_array(),
            color: color.to_array(),
            thickness,
            fade,
            entity_id: entity.0,
        });
        let r = &mut *self.renderer;
        let pushed = r.circles.extend(&vertices);
        debug_assert!(pushed, "circle emitted without a capacity check");
        r.circle_index_count += 6;
        r.stats.circle_count += 1;
    }

    pub fn draw_line(&mut self, p0: Vec3, p1: Vec3, color: Vec4, entity: EntityId) {
        if !self.renderer.lines.fits(2) {
            self.next_batch();
        }
        let vertex = |p: Vec3| LineVertex {
            position: p.to_array(),
            color: color.to_array(),
            entity_id: entity.0,
        };
        let r = &mut *self.renderer;
        let pushed = r.lines.extend(&[vertex(p0), vertex(p1)]);
        debug_assert!(pushed, "line emitted without a capacity check");
        r.stats.line_count += 1;
    }

    /// Axis-aligned outline centered on `position`.
    pub fn draw_rect(&mut self, position: Vec3, size: Vec2, color: Vec4, entity: EntityId) {
        let half = size * 0.5;
        let p0 = position + Vec3::new(-half.x, -half.y, 0.0);
        let p1 = position + Vec3::new(half.x, -half.y, 0.0);
        let p2 = position + Vec3::new(half.x, half.y, 0.0);
        let p3 = position + Vec3::new(-half.x, half.y, 0.0);
        self.draw_line(p0, p1, color, entity);
        self.draw_line(p1, p2, color, entity);
        self.draw_line(p2, p3, color, entity);
        self.draw_line(p3, p0, color, entity);
    }

    /// Outline of the transformed unit quad.
    pub fn draw_rect_transform(&mut self, transform: Mat4, color: Vec4, entity: EntityId) {
        let c = transform_corners(transform);
        for i in 0..4 {
            self.draw_line(c[i], c[(i + 1) % 4], color, entity);
        }
    }

    /// Draw every non-empty cell of `map` as a quad.
    ///
    /// Cell `(x, y)` covers `[x, x + 1] * cell_size` by `[y, y + 1] * cell_size`
    /// in map space, mapped through `transform`. Tiles whose definition or
    /// texture cannot be resolved are drawn as white quads (tinted by their
    /// definition when one exists).
    pub fn draw_tilemap(
        &mut self,
        transform: Mat4,
        map: &TileMapData,
        tile_set: Option<&TileSet>,
        entity: EntityId,
    ) {
        let (width, height) = (map.width() as i32, map.height() as i32);
        let cell = map.cell_size();
        let _span = tracing::debug_span!("draw_tilemap", width, height).entered();

        let mut atlas_slots = AtlasSlotCache {
            generation: self.renderer.batch_generation,
            slots: vec![None; tile_set.map_or(0, |s| s.atlas_sources().len())],
        };
        let mut fallbacks = 0usize;

        for y in 0..height {
            for x in 0..width {
                let id = map.get_tile(x, y);
                if id == 0 {
                    continue;
                }
                if self.needs_new_batch(4, 6) {
                    self.next_batch();
                }
                atlas_slots.sync(self.renderer.batch_generation);

                let def = tile_set.and_then(|set| set.tile_def(id).map(|def| (set, def)));
                let (tex_index, tex_coords, tint) = match def {
                    Some((set, def)) => match self.resolve_tile(set, def, &mut atlas_slots) {
                        Some((tex_index, tex_coords)) => (tex_index, tex_coords, def.tint),
                        None => {
                            fallbacks += 1;
                            (0.0, FULL_UV, def.tint)
                        }
                    },
                    None => {
                        if tile_set.is_some() {
                            fallbacks += 1;
                        }
                        (0.0, FULL_UV, Vec4::ONE)
                    }
                };

                let px = x as f32 * cell;
                let py = y as f32 * cell;
                let corners = [
                    Vec3::new(px, py, 0.0),
                    Vec3::new(px + cell, py, 0.0),
                    Vec3::new(px + cell, py + cell, 0.0),
                    Vec3::new(px, py + cell, 0.0),
                ]
                .map(|p| transform.transform_point3(p));
                self.push_quad(corners, tint, &tex_coords, tex_index, 1.0, entity);
            }
        }

        if fallbacks > 0 {
            tracing::warn!(fallbacks, "tiles drawn untextured: missing definition or texture");
        } else if tile_set.is_none() && map.fill_stats().filled > 0 {
            tracing::debug!("tile map drawn without a tile set");
        }
    }

    /// Texture slot and UVs for a defined tile, or `None` when its texture
    /// is not resolved.
    fn resolve_tile(
        &mut self,
        set: &TileSet,
        def: &TileDef,
        atlas_slots: &mut AtlasSlotCache,
    ) -> Option<(f32, [Vec2; 4])> {
        match def.source {
            TileSource::Atlas {
                source_index,
                coords,
            } => {
                let source = set.atlas_source(source_index)?;
                let texture = source.cached_texture?;
                let tex_coords = source.uv_rect(coords)?;
                let cached = atlas_slots.slots[source_index as usize];
                let tex_index = match cached {
                    Some(slot) => slot,
                    None => {
                        let slot = self.texture_slot(texture);
                        atlas_slots.sync(self.renderer.batch_generation);
                        atlas_slots.slots[source_index as usize] = Some(slot);
                        slot
                    }
                };
                Some((tex_index, tex_coords))
            }
            TileSource::Individual { .. } => {
                let texture = def.cached_texture?;
                Some((self.texture_slot(texture), FULL_UV))
            }
        }
    }
}

impl<B: RenderBackend> Drop for Scene2D<'_, B> {
    fn drop(&mut self) {
        if !self.ended {
            self.flush();
        }
    }
}

fn transform_corners(transform: Mat4) -> [Vec3; 4] {
    QUAD_POSITIONS.map(|p| (transform * p).truncate())
}
