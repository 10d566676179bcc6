//! wgpu implementation of the tessera [`RenderBackend`](tessera_render::RenderBackend).
//!
//! Pipelines for batched quads (texture-slot array), circles, lines,
//! instanced primitives and the infinite grid. Each backend draw call is one
//! buffer upload plus one submitted render pass.
//!
//! # Invariants
//! - Buffers are sized from the same `RendererConfig` as the renderer, so a
//!   flushed batch always fits.
//! - Unknown texture ids sample the white texture.

mod gpu;
mod shaders;

pub use gpu::WgpuBackend;
