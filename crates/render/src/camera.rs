use glam::{Mat4, Vec3};

/// Projection source for a scene.
///
/// `view` defaults to identity for cameras whose placement is supplied as a
/// separate transform. `clip_planes` is an optional capability: cameras that
/// do not know their near/far planes keep the default `None`.
pub trait Camera {
    fn projection(&self) -> Mat4;

    fn view(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    fn clip_planes(&self) -> Option<(f32, f32)> {
        None
    }
}

/// Orthographic camera sized in world units.
///
/// `size` is the visible height; the visible width is `size * aspect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicCamera {
    pub size: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthographicCamera {
    pub fn new(size: f32, aspect: f32) -> Self {
        Self {
            size,
            aspect,
            ..Self::default()
        }
    }
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self {
            size: 10.0,
            aspect: 16.0 / 9.0,
            near: -1.0,
            far: 1.0,
        }
    }
}

impl Camera for OrthographicCamera {
    fn projection(&self) -> Mat4 {
        let half_h = self.size * 0.5;
        let half_w = half_h * self.aspect;
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
    }

    fn clip_planes(&self) -> Option<(f32, f32)> {
        Some((self.near, self.far))
    }
}

/// Fly camera with position, yaw, pitch, and projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            yaw: -90.0_f32.to_radians(),
            pitch: -25.0_f32.to_radians(),
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            speed: 10.0,
            sensitivity: 0.003,
        }
    }
}

impl PerspectiveCamera {
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along the camera axes: `forward` and `right` in view space,
    /// `up` along world Y. Amounts are scaled by `speed * dt`.
    pub fn translate(&mut self, forward: f32, right: f32, up: f32, dt: f32) {
        let step = self.speed * dt;
        self.position += self.forward() * forward * step;
        self.position += self.right() * right * step;
        self.position.y += up * step;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }
}

impl Camera for PerspectiveCamera {
    fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    fn clip_planes(&self) -> Option<(f32, f32)> {
        Some((self.near, self.far))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn orthographic_maps_edges_to_ndc() {
        let cam = OrthographicCamera::new(10.0, 2.0);
        let p = cam.view_projection() * Vec4::new(10.0, 5.0, 0.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn perspective_reports_clip_planes() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.clip_planes(), Some((0.1, 1000.0)));
        assert!(!cam.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn camera_movement() {
        let mut cam = PerspectiveCamera::default();
        let start = cam.position;
        cam.translate(1.0, 0.0, 0.0, 1.0);
        assert_ne!(cam.position, start);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = PerspectiveCamera::default();
        cam.rotate(0.0, -100_000.0);
        assert!(cam.pitch <= 89.0_f32.to_radians() + 1e-6);
    }
}
