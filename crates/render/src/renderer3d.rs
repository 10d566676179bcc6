use glam::{Mat4, Quat, Vec3, Vec4};
use serde::Serialize;
use tessera_common::EntityId;

use crate::arena::VertexArena;
use crate::backend::{GridParams, Primitive3d, RenderBackend};
use crate::camera::Camera;
use crate::config::RendererConfig;
use crate::vertex::InstanceRecord;

/// Clip planes assumed for the grid when the camera does not report any.
pub const FALLBACK_CLIP_PLANES: (f32, f32) = (0.01, 1000.0);

/// Counters for the current scene. Reset by every `begin_scene`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats3D {
    pub draw_calls: u32,
    pub cube_count: u32,
    pub plane_count: u32,
    pub sphere_count: u32,
    pub capsule_count: u32,
    pub total_vertex_count: u32,
    pub total_index_count: u32,
}

impl Stats3D {
    fn count_mut(&mut self, primitive: Primitive3d) -> &mut u32 {
        match primitive {
            Primitive3d::Cube => &mut self.cube_count,
            Primitive3d::Plane => &mut self.plane_count,
            Primitive3d::Sphere => &mut self.sphere_count,
            Primitive3d::Capsule => &mut self.capsule_count,
        }
    }
}

/// Instanced batches of the four built-in primitives.
#[derive(Debug)]
pub struct Renderer3D {
    instances: [VertexArena<InstanceRecord>; 4],
    /// (vertices, indices) of each primitive's static mesh.
    mesh_sizes: [(u32, u32); 4],
    stats: Stats3D,
    view: Mat4,
    projection: Mat4,
    clip_planes: Option<(f32, f32)>,
}

impl Renderer3D {
    pub fn new(config: &RendererConfig) -> Self {
        let capacity = config.max_instances as usize;
        let mesh_sizes = Primitive3d::ALL.map(|p| {
            let mesh = p.mesh();
            (mesh.vertex_count(), mesh.index_count())
        });
        Self {
            instances: std::array::from_fn(|_| VertexArena::with_capacity(capacity)),
            mesh_sizes,
            stats: Stats3D::default(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            clip_planes: None,
        }
    }

    pub fn stats(&self) -> Stats3D {
        self.stats
    }

    pub fn begin_scene<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        camera: &dyn Camera,
    ) -> Scene3D<'a, B> {
        self.begin(backend, camera, camera.view())
    }

    /// Start a scene with the camera placed by `transform`; the view is
    /// its inverse.
    pub fn begin_scene_with_transform<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        camera: &dyn Camera,
        transform: Mat4,
    ) -> Scene3D<'a, B> {
        self.begin(backend, camera, transform.inverse())
    }

    fn begin<'a, B: RenderBackend>(
        &'a mut self,
        backend: &'a mut B,
        camera: &dyn Camera,
        view: Mat4,
    ) -> Scene3D<'a, B> {
        self.view = view;
        self.projection = camera.projection();
        self.clip_planes = camera.clip_planes();
        self.stats = Stats3D::default();
        backend.set_view_projection(self.projection * self.view);
        self.start_batch();
        Scene3D {
            renderer: self,
            backend,
            ended: false,
        }
    }

    fn start_batch(&mut self) {
        for arena in &mut self.instances {
            arena.clear();
        }
    }
}

/// An open 3D scene. Each primitive has its own instance batch; any full
/// batch flushes all four.
pub struct Scene3D<'a, B: RenderBackend> {
    renderer: &'a mut Renderer3D,
    backend: &'a mut B,
    ended: bool,
}

impl<B: RenderBackend> Scene3D<'_, B> {
    pub fn backend(&self) -> &B {
        self.backend
    }

    pub fn stats(&self) -> Stats3D {
        self.renderer.stats
    }

    pub fn next_batch(&mut self) {
        self.flush();
        self.renderer.start_batch();
    }

    /// One instanced draw per non-empty primitive: cube, plane, sphere,
    /// capsule.
    pub fn flush(&mut self) {
        let r = &mut *self.renderer;
        for primitive in Primitive3d::ALL {
            let arena = &r.instances[primitive.index()];
            if arena.is_empty() {
                continue;
            }
            self.backend.draw_mesh_instances(primitive, arena.as_slice());
            r.stats.draw_calls += 1;
        }
    }

    pub fn end_scene(mut self) {
        self.flush();
        self.ended = true;
    }

    fn submit(&mut self, primitive: Primitive3d, transform: Mat4, color: Vec4, entity: EntityId) {
        if !self.renderer.instances[primitive.index()].fits(1) {
            self.next_batch();
        }
        let r = &mut *self.renderer;
        let record = InstanceRecord::new(transform, color, 0.0, entity);
        let pushed = r.instances[primitive.index()].extend(&[record]);
        debug_assert!(pushed, "instance emitted without a capacity check");

        let (vertices, indices) = r.mesh_sizes[primitive.index()];
        *r.stats.count_mut(primitive) += 1;
        r.stats.total_vertex_count += vertices;
        r.stats.total_index_count += indices;
    }

    pub fn draw_cube(&mut self, position: Vec3, size: Vec3, color: Vec4) {
        let transform = Mat4::from_translation(position) * Mat4::from_scale(size);
        self.submit(Primitive3d::Cube, transform, color, EntityId::NONE);
    }

    pub fn draw_cube_transform(&mut self, transform: Mat4, color: Vec4, entity: EntityId) {
        self.submit(Primitive3d::Cube, transform, color, entity);
    }

    /// Flat plane in XZ, `size` along X and Z.
    pub fn draw_plane(&mut self, position: Vec3, size: glam::Vec2, color: Vec4) {
        let transform =
            Mat4::from_translation(position) * Mat4::from_scale(Vec3::new(size.x, 1.0, size.y));
        self.submit(Primitive3d::Plane, transform, color, EntityId::NONE);
    }

    pub fn draw_plane_transform(&mut self, transform: Mat4, color: Vec4, entity: EntityId) {
        self.submit(Primitive3d::Plane, transform, color, entity);
    }

    pub fn draw_sphere(&mut self, position: Vec3, radius: f32, color: Vec4) {
        let transform =
            Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(radius * 2.0));
        self.submit(Primitive3d::Sphere, transform, color, EntityId::NONE);
    }

    pub fn draw_sphere_transform(&mut self, transform: Mat4, color: Vec4, entity: EntityId) {
        self.submit(Primitive3d::Sphere, transform, color, entity);
    }

    /// Capsule of the given radius and cylinder height.
    ///
    /// The unit capsule is scaled non-uniformly to (2r, h + 2r, 2r), so the
    /// hemispherical caps stretch with the height. The shape is only exact
    /// when `height == 0`.
    pub fn draw_capsule(&mut self, position: Vec3, radius: f32, height: f32, color: Vec4) {
        let scale = Vec3::new(radius * 2.0, height + radius * 2.0, radius * 2.0);
        let transform = Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, position);
        self.submit(Primitive3d::Capsule, transform, color, EntityId::NONE);
    }

    pub fn draw_capsule_transform(&mut self, transform: Mat4, color: Vec4, entity: EntityId) {
        self.submit(Primitive3d::Capsule, transform, color, entity);
    }

    /// Infinite reference grid, drawn immediately rather than batched.
    ///
    /// The grid lies in XZ; with `xy_plane` it is rotated into XY. Clip
    /// planes come from the camera, or [`FALLBACK_CLIP_PLANES`].
    pub fn draw_grid(&mut self, xy_plane: bool) {
        let r = &mut *self.renderer;
        let view = if xy_plane {
            r.view * Mat4::from_rotation_x(-90f32.to_radians())
        } else {
            r.view
        };
        let (near, far) = r.clip_planes.unwrap_or(FALLBACK_CLIP_PLANES);
        self.backend.draw_grid(&GridParams {
            view,
            projection: r.projection,
            near,
            far,
        });
        r.stats.draw_calls += 1;
    }
}

impl<B: RenderBackend> Drop for Scene3D<'_, B> {
    fn drop(&mut self) {
        if !self.ended {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::recording::{DrawCommand, RecordingBackend};

    fn renderer(max_instances: u32) -> Renderer3D {
        Renderer3D::new(&RendererConfig {
            max_instances,
            ..RendererConfig::default()
        })
    }

    fn instance_draws(backend: &RecordingBackend) -> Vec<(Primitive3d, usize)> {
        backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Instances { primitive, count } => Some((*primitive, *count)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn flushes_in_fixed_primitive_order() {
        let mut r = renderer(16);
        let mut backend = RecordingBackend::new();
        let camera = PerspectiveCamera::default();

        let mut scene = r.begin_scene(&mut backend, &camera);
        scene.draw_capsule(Vec3::ZERO, 0.5, 1.0, Vec4::ONE);
        scene.draw_sphere(Vec3::ZERO, 1.0, Vec4::ONE);
        scene.draw_cube(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        scene.draw_cube(Vec3::X, Vec3::ONE, Vec4::ONE);
        scene.end_scene();

        assert_eq!(
            instance_draws(&backend),
            vec![
                (Primitive3d::Cube, 2),
                (Primitive3d::Sphere, 1),
                (Primitive3d::Capsule, 1),
            ]
        );
        let stats = r.stats();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.cube_count, 2);
        assert_eq!(stats.total_vertex_count, 24 * 2 + 703 + 306);
        assert_eq!(stats.total_index_count, 36 * 2 + 3672 + 1632);
    }

    #[test]
    fn full_primitive_batch_flushes_everything() {
        let mut r = renderer(2);
        let mut backend = RecordingBackend::new();
        let camera = PerspectiveCamera::default();

        let mut scene = r.begin_scene(&mut backend, &camera);
        scene.draw_plane(Vec3::ZERO, glam::Vec2::ONE, Vec4::ONE);
        scene.draw_cube(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        scene.draw_cube(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        scene.draw_cube(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        scene.end_scene();

        assert_eq!(
            instance_draws(&backend),
            vec![
                (Primitive3d::Cube, 2),
                (Primitive3d::Plane, 1),
                (Primitive3d::Cube, 1),
            ]
        );
    }

    #[test]
    fn stats_reset_each_scene() {
        let mut r = renderer(8);
        let mut backend = RecordingBackend::new();
        let camera = PerspectiveCamera::default();

        let mut scene = r.begin_scene(&mut backend, &camera);
        scene.draw_sphere(Vec3::ZERO, 1.0, Vec4::ONE);
        scene.end_scene();
        assert_eq!(r.stats().sphere_count, 1);

        r.begin_scene(&mut backend, &camera).end_scene();
        assert_eq!(r.stats(), Stats3D::default());
    }

    #[test]
    fn sphere_and_capsule_scales() {
        let mut r = renderer(8);
        let mut backend = RecordingBackend::new();
        let camera = PerspectiveCamera::default();

        let mut scene = r.begin_scene(&mut backend, &camera);
        scene.draw_capsule(Vec3::new(1.0, 2.0, 3.0), 0.5, 2.0, Vec4::ONE);
        assert_eq!(scene.stats().capsule_count, 1);
        scene.end_scene();

        let transform = Mat4::from_cols_array_2d(&r.instances[Primitive3d::Capsule.index()].as_slice()[0].transform);
        let (scale, _, translation) = transform.to_scale_rotation_translation();
        assert!((scale - Vec3::new(1.0, 3.0, 1.0)).length() < 1e-5);
        assert!((translation - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    }

    struct BareCamera;

    impl Camera for BareCamera {
        fn projection(&self) -> Mat4 {
            Mat4::perspective_rh(1.0, 1.0, 0.5, 50.0)
        }
    }

    #[test]
    fn grid_uses_fallback_planes_without_camera_planes() {
        let mut r = renderer(8);
        let mut backend = RecordingBackend::new();

        let mut scene = r.begin_scene(&mut backend, &BareCamera);
        scene.draw_grid(false);
        scene.end_scene();

        match backend.commands() {
            [DrawCommand::Grid(params)] => {
                assert_eq!((params.near, params.far), FALLBACK_CLIP_PLANES);
                assert_eq!(params.view, Mat4::IDENTITY);
            }
            other => panic!("unexpected commands {other:?}"),
        }
        assert_eq!(r.stats().draw_calls, 1);
    }

    #[test]
    fn grid_uses_camera_planes_and_xy_rotation() {
        let mut r = renderer(8);
        let mut backend = RecordingBackend::new();
        let camera = PerspectiveCamera::default();

        let mut scene = r.begin_scene(&mut backend, &camera);
        scene.draw_cube(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        scene.draw_grid(true);
        scene.end_scene();

        // The grid is immediate, so it precedes the batched cube.
        match &backend.commands()[0] {
            DrawCommand::Grid(params) => {
                assert_eq!((params.near, params.far), (camera.near, camera.far));
                let expected = camera.view() * Mat4::from_rotation_x(-90f32.to_radians());
                assert!(params.view.abs_diff_eq(expected, 1e-6));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
