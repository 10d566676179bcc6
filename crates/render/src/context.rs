use glam::Mat4;

use crate::backend::{GraphicsApi, RenderBackend};
use crate::camera::Camera;
use crate::config::{ConfigError, RendererConfig};
use crate::renderer2d::{Renderer2D, Scene2D, Stats2D};
use crate::renderer3d::{Renderer3D, Scene3D, Stats3D};

/// Owns a backend and both batch schedulers.
///
/// One context per window or offscreen target. Scenes borrow the context
/// mutably, so at most one scene is open at a time.
pub struct RendererContext<B: RenderBackend> {
    backend: B,
    renderer_2d: Renderer2D,
    renderer_3d: Renderer3D,
}

impl<B: RenderBackend> RendererContext<B> {
    pub fn new(backend: B, config: RendererConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            api = %backend.api(),
            max_quads = config.max_quads,
            max_texture_slots = config.max_texture_slots,
            max_instances = config.max_instances,
            "renderer initialized"
        );
        Ok(Self {
            renderer_2d: Renderer2D::new(&config),
            renderer_3d: Renderer3D::new(&config),
            backend,
        })
    }

    pub fn api(&self) -> GraphicsApi {
        self.backend.api()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn renderer_2d_mut(&mut self) -> &mut Renderer2D {
        &mut self.renderer_2d
    }

    pub fn begin_2d(&mut self, camera: &dyn Camera) -> Scene2D<'_, B> {
        self.renderer_2d.begin_scene(&mut self.backend, camera)
    }

    pub fn begin_2d_with_transform(
        &mut self,
        camera: &dyn Camera,
        transform: Mat4,
    ) -> Scene2D<'_, B> {
        self.renderer_2d
            .begin_scene_with_transform(&mut self.backend, camera, transform)
    }

    pub fn begin_3d(&mut self, camera: &dyn Camera) -> Scene3D<'_, B> {
        self.renderer_3d.begin_scene(&mut self.backend, camera)
    }

    pub fn begin_3d_with_transform(
        &mut self,
        camera: &dyn Camera,
        transform: Mat4,
    ) -> Scene3D<'_, B> {
        self.renderer_3d
            .begin_scene_with_transform(&mut self.backend, camera, transform)
    }

    pub fn stats_2d(&self) -> Stats2D {
        self.renderer_2d.stats()
    }

    pub fn reset_stats_2d(&mut self) {
        self.renderer_2d.reset_stats();
    }

    pub fn stats_3d(&self) -> Stats3D {
        self.renderer_3d.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{OrthographicCamera, PerspectiveCamera};
    use crate::recording::RecordingBackend;
    use glam::{Vec2, Vec3, Vec4};

    #[test]
    fn rejects_invalid_config() {
        let config = RendererConfig {
            max_texture_slots: 1,
            ..RendererConfig::default()
        };
        assert!(RendererContext::new(RecordingBackend::new(), config).is_err());
    }

    #[test]
    fn two_contexts_are_independent() {
        let mut a = RendererContext::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
        let mut b = RendererContext::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
        let camera = OrthographicCamera::default();

        let mut scene = a.begin_2d(&camera);
        scene.draw_quad(Vec3::ZERO, Vec2::ONE, Vec4::ONE);
        scene.end_scene();
        b.begin_2d(&camera).end_scene();

        assert_eq!(a.stats_2d().quad_count, 1);
        assert_eq!(b.stats_2d().quad_count, 0);
        assert_eq!(a.backend().commands().len(), 1);
        assert!(b.backend().commands().is_empty());
    }

    #[test]
    fn stats_2d_accumulate_until_reset() {
        let mut ctx = RendererContext::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
        let camera = OrthographicCamera::default();
        for _ in 0..2 {
            let mut scene = ctx.begin_2d(&camera);
            scene.draw_quad(Vec3::ZERO, Vec2::ONE, Vec4::ONE);
            scene.end_scene();
        }
        assert_eq!(ctx.stats_2d().quad_count, 2);
        assert_eq!(ctx.stats_2d().draw_calls, 2);
        ctx.reset_stats_2d();
        assert_eq!(ctx.stats_2d(), Stats2D::default());
    }

    #[test]
    fn mixed_2d_and_3d_frame() {
        let mut ctx = RendererContext::new(RecordingBackend::new(), RendererConfig::default()).unwrap();
        assert_eq!(ctx.api(), GraphicsApi::Headless);

        let mut scene = ctx.begin_3d(&PerspectiveCamera::default());
        scene.draw_grid(false);
        scene.draw_sphere(Vec3::ZERO, 1.0, Vec4::ONE);
        scene.end_scene();

        let mut scene = ctx.begin_2d(&OrthographicCamera::default());
        scene.draw_circle(Mat4::IDENTITY, Vec4::ONE, 1.0, 0.005, tessera_common::EntityId::NONE);
        scene.end_scene();

        assert_eq!(ctx.stats_3d().draw_calls, 2);
        assert_eq!(ctx.stats_2d().circle_count, 1);
        assert_eq!(ctx.backend_mut().take_commands().len(), 3);
    }
}
