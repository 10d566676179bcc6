use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the entity a piece of geometry was emitted for.
///
/// Written into every vertex so picking can map pixels back to entities.
/// `EntityId::NONE` (-1) means the geometry belongs to no entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i32);

impl EntityId {
    pub const NONE: Self = Self(-1);

    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NONE
    }
}

/// Opaque 64-bit asset handle. Zero is the null handle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssetHandle(pub u64);

impl AssetHandle {
    pub const NULL: Self = Self(0);

    /// Generate a fresh random handle, never null.
    pub fn new() -> Self {
        loop {
            let (hi, lo) = Uuid::new_v4().as_u64_pair();
            let value = hi ^ lo;
            if value != 0 {
                return Self(value);
            }
        }
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Identity of a GPU texture. Two textures are the same texture iff their
/// ids are equal; `TextureId::WHITE` is the built-in 1x1 opaque white texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

impl TextureId {
    pub const WHITE: Self = Self(0);
}

/// A texture as seen by the renderer: identity plus pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub const WHITE: Self = Self {
        id: TextureId::WHITE,
        width: 1,
        height: 1,
    };

    pub fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Model matrix: translate * rotate * scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_handle_uniqueness() {
        let a = AssetHandle::new();
        let b = AssetHandle::new();
        assert_ne!(a, b);
        assert!(!a.is_null());
        assert!(AssetHandle::default().is_null());
    }

    #[test]
    fn entity_id_default_is_none() {
        assert!(EntityId::default().is_none());
        assert!(!EntityId(3).is_none());
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn transform_matrix_translates() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let p = t.matrix().transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(1.0, 2.0, 3.0));
    }
}
