use std::fmt;
use std::str::FromStr;

use glam::Mat4;
use tessera_common::Texture;

use crate::vertex::{CircleVertex, InstanceRecord, LineVertex, QuadVertex};

/// Graphics API a backend drives. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsApi {
    /// No GPU; draw calls are recorded in memory.
    Headless,
    Wgpu,
    Vulkan,
    DirectX12,
    Metal,
}

impl GraphicsApi {
    /// Whether this workspace ships a backend for the API.
    pub fn is_implemented(self) -> bool {
        matches!(self, Self::Headless | Self::Wgpu)
    }
}

impl fmt::Display for GraphicsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Headless => "headless",
            Self::Wgpu => "wgpu",
            Self::Vulkan => "vulkan",
            Self::DirectX12 => "dx12",
            Self::Metal => "metal",
        };
        f.write_str(name)
    }
}

impl FromStr for GraphicsApi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "headless" | "none" => Ok(Self::Headless),
            "wgpu" => Ok(Self::Wgpu),
            "vulkan" => Ok(Self::Vulkan),
            "dx12" | "directx12" => Ok(Self::DirectX12),
            "metal" => Ok(Self::Metal),
            other => Err(format!("unknown graphics api '{other}'")),
        }
    }
}

/// The instanced 3D archetypes, in flush order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive3d {
    Cube,
    Plane,
    Sphere,
    Capsule,
}

impl Primitive3d {
    pub const ALL: [Self; 4] = [Self::Cube, Self::Plane, Self::Sphere, Self::Capsule];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Uniforms for the infinite editor grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub near: f32,
    pub far: f32,
}

/// The draw-call surface the batch schedulers need from a GPU.
///
/// Every `draw_*` call is one upload of the given records followed by one
/// draw; backends must not retain the slices.
pub trait RenderBackend {
    fn api(&self) -> GraphicsApi;

    fn set_view_projection(&mut self, view_projection: Mat4);

    /// Indexed draw of `index_count / 6` quads. `textures[i]` is bound to
    /// slot `i`; `textures[0]` is always the white texture.
    fn draw_quads(&mut self, vertices: &[QuadVertex], index_count: u32, textures: &[Texture]);

    fn draw_circles(&mut self, vertices: &[CircleVertex], index_count: u32);

    /// Line-list draw; every two vertices form one segment.
    fn draw_lines(&mut self, vertices: &[LineVertex], width: f32);

    /// One instanced indexed draw of `primitive`'s static mesh.
    fn draw_mesh_instances(&mut self, primitive: Primitive3d, instances: &[InstanceRecord]);

    fn draw_grid(&mut self, params: &GridParams);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_names_round_trip() {
        for api in [
            GraphicsApi::Headless,
            GraphicsApi::Wgpu,
            GraphicsApi::Vulkan,
            GraphicsApi::DirectX12,
            GraphicsApi::Metal,
        ] {
            assert_eq!(api.to_string().parse::<GraphicsApi>(), Ok(api));
        }
        assert!("opengl".parse::<GraphicsApi>().is_err());
    }

    #[test]
    fn only_headless_and_wgpu_are_implemented() {
        assert!(GraphicsApi::Wgpu.is_implemented());
        assert!(!GraphicsApi::Metal.is_implemented());
    }

    #[test]
    fn flush_order() {
        let order: Vec<usize> = Primitive3d::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
