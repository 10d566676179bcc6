//! Shared types for the tessera engine: entity ids, asset handles, texture
//! identities and spatial transforms.

mod types;

pub use types::{AssetHandle, EntityId, Texture, TextureId, Transform};
