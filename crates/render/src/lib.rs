//! Batched renderer: 2D quads, circles, lines and tile maps, plus instanced
//! 3D primitives, over a pluggable [`RenderBackend`].
//!
//! # Invariants
//! - A batch never exceeds the capacities of its [`RendererConfig`].
//! - Texture slot 0 is always the white texture.
//! - Every texture index in a flushed batch refers to a texture bound in
//!   that same batch.
//!
//! The [`RecordingBackend`] records draw calls instead of issuing them and
//! backs the headless API.

mod arena;
mod backend;
mod camera;
mod config;
mod context;
pub mod primitives;
mod recording;
mod renderer2d;
mod renderer3d;
mod texture_slots;
mod vertex;

pub use arena::VertexArena;
pub use backend::{GraphicsApi, GridParams, Primitive3d, RenderBackend};
pub use camera::{Camera, OrthographicCamera, PerspectiveCamera};
pub use config::{ConfigError, RendererConfig};
pub use context::RendererContext;
pub use primitives::MeshData;
pub use recording::{DrawCommand, RecordingBackend};
pub use renderer2d::{Renderer2D, Scene2D, Sprite, Stats2D};
pub use renderer3d::{FALLBACK_CLIP_PLANES, Renderer3D, Scene3D, Stats3D};
pub use texture_slots::TextureSlots;
pub use vertex::{CircleVertex, InstanceRecord, LineVertex, MeshVertex, QuadVertex};
