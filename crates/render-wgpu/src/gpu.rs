use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tessera_common::{Texture, TextureId};
use tessera_render::primitives::quad_indices;
use tessera_render::{
    CircleVertex, GraphicsApi, GridParams, InstanceRecord, LineVertex, MeshVertex, Primitive3d,
    QuadVertex, RenderBackend, RendererConfig,
};
use wgpu::util::DeviceExt;

use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GridUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    inverse_view: [[f32; 4]; 4],
    inverse_projection: [[f32; 4]; 4],
    near: f32,
    far: f32,
    _pad: [f32; 2],
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// [`RenderBackend`] on wgpu.
///
/// Every draw call records its own render pass and submits it, loading the
/// frame's color and depth targets. Draws outside
/// [`begin_frame`](Self::begin_frame)/[`end_frame`](Self::end_frame) are
/// dropped.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    texture_slots: u32,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    textures: HashMap<TextureId, GpuTexture>,

    quad_pipeline: wgpu::RenderPipeline,
    circle_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    mesh_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,

    quad_vertex_buffer: wgpu::Buffer,
    circle_vertex_buffer: wgpu::Buffer,
    line_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    meshes: [GpuMesh; 4],

    grid_buffer: wgpu::Buffer,
    grid_bind_group: wgpu::BindGroup,

    depth_view: wgpu::TextureView,
    frame: Option<wgpu::TextureView>,
    line_width_noted: bool,
}

impl WgpuBackend {
    /// Device features the quad pipeline's texture array needs.
    pub fn required_features() -> wgpu::Features {
        wgpu::Features::TEXTURE_BINDING_ARRAY
            | wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING
    }

    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: &RendererConfig,
    ) -> Self {
        let texture_slots = config.max_texture_slots;

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = uniform_layout(&device, "camera_layout");
        let camera_bind_group = uniform_bind_group(&device, &camera_layout, &camera_buffer);

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_slots_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: NonZeroU32::new(texture_slots),
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tile_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = create_texture(&device, &queue, "white_texture", 1, 1, &[255; 4]);

        let layout_2d = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("layout_2d"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });
        let quad_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let overlay_depth = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let solid_depth = wgpu::DepthStencilState {
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            ..overlay_depth.clone()
        };

        let quad_source = shaders::quad_shader(texture_slots);
        let quad_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "quad_pipeline",
                layout: &quad_layout,
                source: &quad_source,
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                        2 => Float32x2,
                        3 => Float32,
                        4 => Float32,
                        5 => Sint32,
                    ],
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                depth: overlay_depth.clone(),
                format: surface_format,
            },
        );
        let circle_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "circle_pipeline",
                layout: &layout_2d,
                source: shaders::CIRCLE_SHADER,
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<CircleVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x4,
                        3 => Float32,
                        4 => Float32,
                        5 => Sint32,
                    ],
                }],
                topology: wgpu::PrimitiveTopology::TriangleList,
                depth: overlay_depth.clone(),
                format: surface_format,
            },
        );
        let line_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "line_pipeline",
                layout: &layout_2d,
                source: shaders::LINE_SHADER,
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                        2 => Sint32,
                    ],
                }],
                topology: wgpu::PrimitiveTopology::LineList,
                depth: overlay_depth.clone(),
                format: surface_format,
            },
        );
        let mesh_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "mesh_pipeline",
                layout: &layout_2d,
                source: shaders::MESH_SHADER,
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceRecord>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                            8 => Float32x4,
                        ],
                    },
                ],
                topology: wgpu::PrimitiveTopology::TriangleList,
                depth: solid_depth,
                format: surface_format,
            },
        );

        let grid_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grid_buffer"),
            size: std::mem::size_of::<GridUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let grid_layout = uniform_layout(&device, "grid_layout");
        let grid_bind_group = uniform_bind_group(&device, &grid_layout, &grid_buffer);
        let grid_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid_pipeline_layout"),
            bind_group_layouts: &[&grid_layout],
            push_constant_ranges: &[],
        });
        let grid_pipeline = create_pipeline(
            &device,
            PipelineDesc {
                label: "grid_pipeline",
                layout: &grid_pipeline_layout,
                source: shaders::GRID_SHADER,
                buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                depth: wgpu::DepthStencilState {
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    ..overlay_depth
                },
                format: surface_format,
            },
        );

        let max_vertices = config.max_vertices() as u64;
        let quad_vertex_buffer = vertex_buffer::<QuadVertex>(&device, "quad_vertices", max_vertices);
        let circle_vertex_buffer =
            vertex_buffer::<CircleVertex>(&device, "circle_vertices", max_vertices);
        let line_vertex_buffer = vertex_buffer::<LineVertex>(&device, "line_vertices", max_vertices);
        let instance_buffer =
            vertex_buffer::<InstanceRecord>(&device, "instances", config.max_instances as u64);
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_indices"),
            contents: bytemuck::cast_slice(&quad_indices(config.max_indices())),
            usage: wgpu::BufferUsages::INDEX,
        });

        let meshes = Primitive3d::ALL.map(|primitive| {
            let mesh = primitive.mesh();
            GpuMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertices"),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_indices"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: mesh.index_count(),
            }
        });

        let depth_view = create_depth_view(&device, width, height);
        tracing::info!(?surface_format, texture_slots, "wgpu backend ready");

        Self {
            device,
            queue,
            texture_slots,
            camera_buffer,
            camera_bind_group,
            texture_layout,
            sampler,
            white,
            textures: HashMap::new(),
            quad_pipeline,
            circle_pipeline,
            line_pipeline,
            mesh_pipeline,
            grid_pipeline,
            quad_vertex_buffer,
            circle_vertex_buffer,
            line_vertex_buffer,
            quad_index_buffer,
            instance_buffer,
            meshes,
            grid_buffer,
            grid_bind_group,
            depth_view,
            frame: None,
            line_width_noted: false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    /// Upload RGBA8 pixels under `id`, replacing any earlier upload.
    /// Returns false when `rgba` does not hold `width * height` pixels.
    pub fn upload_texture(&mut self, id: TextureId, width: u32, height: u32, rgba: &[u8]) -> bool {
        if width == 0 || height == 0 || rgba.len() != (width * height * 4) as usize {
            tracing::warn!(?id, width, height, bytes = rgba.len(), "texture upload size mismatch");
            return false;
        }
        let texture = create_texture(&self.device, &self.queue, "tile_texture", width, height, rgba);
        self.textures.insert(id, texture);
        tracing::debug!(?id, width, height, "texture uploaded");
        true
    }

    pub fn has_texture(&self, id: TextureId) -> bool {
        id == TextureId::WHITE || self.textures.contains_key(&id)
    }

    /// Clear `target` and make it the destination of subsequent draws.
    pub fn begin_frame(&mut self, target: wgpu::TextureView, clear: wgpu::Color) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear_encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        self.queue.submit(std::iter::once(encoder.finish()));
        self.frame = Some(target);
    }

    /// Stop drawing into the current target and hand it back.
    pub fn end_frame(&mut self) -> Option<wgpu::TextureView> {
        self.frame.take()
    }

    /// Record one render pass that loads the frame targets, then submit it.
    fn submit_pass(&self, label: &str, draw: impl FnOnce(&mut wgpu::RenderPass<'_>)) {
        let Some(target) = self.frame.as_ref() else {
            tracing::trace!(label, "draw outside a frame dropped");
            return;
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            draw(&mut pass);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn texture_bind_group(&self, textures: &[Texture]) -> wgpu::BindGroup {
        let views: Vec<&wgpu::TextureView> = (0..self.texture_slots as usize)
            .map(|slot| {
                textures
                    .get(slot)
                    .and_then(|t| self.textures.get(&t.id))
                    .map_or(&self.white.view, |t| &t.view)
            })
            .collect();
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_slots"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureViewArray(&views),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

impl RenderBackend for WgpuBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Wgpu
    }

    fn set_view_projection(&mut self, view_projection: Mat4) {
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_projection: view_projection.to_cols_array_2d(),
            }),
        );
    }

    fn draw_quads(&mut self, vertices: &[QuadVertex], index_count: u32, textures: &[Texture]) {
        self.queue
            .write_buffer(&self.quad_vertex_buffer, 0, bytemuck::cast_slice(vertices));
        let texture_group = self.texture_bind_group(textures);
        self.submit_pass("quad_pass", |pass| {
            pass.set_pipeline(&self.quad_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &texture_group, &[]);
            pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        });
    }

    fn draw_circles(&mut self, vertices: &[CircleVertex], index_count: u32) {
        self.queue
            .write_buffer(&self.circle_vertex_buffer, 0, bytemuck::cast_slice(vertices));
        self.submit_pass("circle_pass", |pass| {
            pass.set_pipeline(&self.circle_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(0, self.circle_vertex_buffer.slice(..));
            pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        });
    }

    fn draw_lines(&mut self, vertices: &[LineVertex], width: f32) {
        // wgpu rasterizes lines one pixel wide.
        if width != 1.0 && !self.line_width_noted {
            tracing::debug!(width, "line width not supported by wgpu; drawing 1px lines");
            self.line_width_noted = true;
        }
        self.queue
            .write_buffer(&self.line_vertex_buffer, 0, bytemuck::cast_slice(vertices));
        let count = vertices.len() as u32;
        self.submit_pass("line_pass", |pass| {
            pass.set_pipeline(&self.line_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
            pass.draw(0..count, 0..1);
        });
    }

    fn draw_mesh_instances(&mut self, primitive: Primitive3d, instances: &[InstanceRecord]) {
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        let mesh = &self.meshes[primitive.index()];
        let count = instances.len() as u32;
        self.submit_pass("mesh_pass", |pass| {
            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..count);
        });
    }

    fn draw_grid(&mut self, params: &GridParams) {
        let uniform = GridUniform {
            view: params.view.to_cols_array_2d(),
            projection: params.projection.to_cols_array_2d(),
            inverse_view: params.view.inverse().to_cols_array_2d(),
            inverse_projection: params.projection.inverse().to_cols_array_2d(),
            near: params.near,
            far: params.far,
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.grid_buffer, 0, bytemuck::bytes_of(&uniform));
        self.submit_pass("grid_pass", |pass| {
            pass.set_pipeline(&self.grid_pipeline);
            pass.set_bind_group(0, &self.grid_bind_group, &[]);
            pass.draw(0..6, 0..1);
        });
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    source: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    depth: wgpu::DepthStencilState,
    format: wgpu::TextureFormat,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(desc.source.into()),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            ..Default::default()
        },
        depth_stencil: Some(desc.depth),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

fn vertex_buffer<T>(device: &wgpu::Device, label: &str, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: capacity.max(1) * std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&Default::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
