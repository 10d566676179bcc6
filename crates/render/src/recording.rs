use glam::Mat4;
use tessera_common::{Texture, TextureId};

use crate::backend::{GraphicsApi, GridParams, Primitive3d, RenderBackend};
use crate::vertex::{CircleVertex, InstanceRecord, LineVertex, QuadVertex};

/// One draw call as seen by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Quads {
        vertices: Vec<QuadVertex>,
        index_count: u32,
        textures: Vec<TextureId>,
    },
    Circles {
        vertex_count: usize,
        index_count: u32,
    },
    Lines {
        vertices: Vec<LineVertex>,
        width: f32,
    },
    Instances {
        primitive: Primitive3d,
        count: usize,
    },
    Grid(GridParams),
}

/// Headless backend that records every draw call in order.
///
/// Used for tests and offline statistics; nothing is rasterized.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
    view_projection: Option<Mat4>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn view_projection(&self) -> Option<Mat4> {
        self.view_projection
    }

    /// Quad vertices from every recorded quad draw, in submission order.
    pub fn quad_vertices(&self) -> impl Iterator<Item = &QuadVertex> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Quads { vertices, .. } => Some(vertices.iter()),
                _ => None,
            })
            .flatten()
    }
}

impl RenderBackend for RecordingBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }

    fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = Some(view_projection);
    }

    fn draw_quads(&mut self, vertices: &[QuadVertex], index_count: u32, textures: &[Texture]) {
        self.commands.push(DrawCommand::Quads {
            vertices: vertices.to_vec(),
            index_count,
            textures: textures.iter().map(|t| t.id).collect(),
        });
    }

    fn draw_circles(&mut self, vertices: &[CircleVertex], index_count: u32) {
        self.commands.push(DrawCommand::Circles {
            vertex_count: vertices.len(),
            index_count,
        });
    }

    fn draw_lines(&mut self, vertices: &[LineVertex], width: f32) {
        self.commands.push(DrawCommand::Lines {
            vertices: vertices.to_vec(),
            width,
        });
    }

    fn draw_mesh_instances(&mut self, primitive: Primitive3d, instances: &[InstanceRecord]) {
        self.commands.push(DrawCommand::Instances {
            primitive,
            count: instances.len(),
        });
    }

    fn draw_grid(&mut self, params: &GridParams) {
        self.commands.push(DrawCommand::Grid(*params));
    }
}
