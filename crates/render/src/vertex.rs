//! GPU vertex and instance records. All are `#[repr(C)]` and `Pod` so a
//! batch can be uploaded as raw bytes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use tessera_common::EntityId;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    /// Texture slot within the batch, stored as a float for the shader.
    pub tex_index: f32,
    pub tiling_factor: f32,
    pub entity_id: i32,
}

impl QuadVertex {
    pub fn new(
        position: Vec3,
        color: Vec4,
        tex_coord: Vec2,
        tex_index: f32,
        tiling_factor: f32,
        entity: EntityId,
    ) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            tex_coord: tex_coord.to_array(),
            tex_index,
            tiling_factor,
            entity_id: entity.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CircleVertex {
    pub world_position: [f32; 3],
    /// Position within the unit quad scaled to [-1, 1].
    pub local_position: [f32; 3],
    pub color: [f32; 4],
    pub thickness: f32,
    pub fade: f32,
    pub entity_id: i32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub entity_id: i32,
}

/// Per-instance data for the instanced 3D primitives.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceRecord {
    pub color: [f32; 4],
    /// x = texture index, y = entity id, z and w unused.
    pub custom_data: [f32; 4],
    /// Model matrix columns.
    pub transform: [[f32; 4]; 4],
}

impl InstanceRecord {
    pub fn new(transform: Mat4, color: Vec4, tex_index: f32, entity: EntityId) -> Self {
        Self {
            color: color.to_array(),
            custom_data: [tex_index, entity.0 as f32, 0.0, 0.0],
            transform: transform.to_cols_array_2d(),
        }
    }
}

/// Static mesh vertex for the procedural 3D primitives.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_have_no_padding() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 48);
        assert_eq!(std::mem::size_of::<CircleVertex>(), 52);
        assert_eq!(std::mem::size_of::<LineVertex>(), 32);
        assert_eq!(std::mem::size_of::<InstanceRecord>(), 96);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
    }

    #[test]
    fn instance_record_packs_entity() {
        let r = InstanceRecord::new(Mat4::IDENTITY, Vec4::ONE, 0.0, EntityId(12));
        assert_eq!(r.custom_data[1], 12.0);
        assert_eq!(r.transform[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
