//! Procedural meshes for the instanced primitives and the shared quad
//! geometry used by the 2D batches.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Vec2, Vec3, Vec4};

use crate::backend::Primitive3d;
use crate::vertex::MeshVertex;

/// Unit quad corners, counter-clockwise from bottom-left.
pub const QUAD_POSITIONS: [Vec4; 4] = [
    Vec4::new(-0.5, -0.5, 0.0, 1.0),
    Vec4::new(0.5, -0.5, 0.0, 1.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
    Vec4::new(-0.5, 0.5, 0.0, 1.0),
];

pub const QUAD_TEX_COORDS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Index buffer for `max_indices / 6` quads: `0,1,2, 2,3,0` per quad,
/// advancing the base vertex by 4.
pub fn quad_indices(max_indices: u32) -> Vec<u32> {
    let quads = max_indices / 6;
    let mut indices = Vec::with_capacity((quads * 6) as usize);
    for quad in 0..quads {
        let base = quad * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    indices
}

/// Static geometry of one primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push(&mut self, position: Vec3, normal: Vec3, tex_coord: Vec2) {
        self.vertices.push(MeshVertex {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coord: tex_coord.to_array(),
        });
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

impl Primitive3d {
    /// Unit-sized mesh for this primitive, centered on the origin.
    pub fn mesh(self) -> MeshData {
        match self {
            Self::Cube => cube(),
            Self::Plane => plane(),
            Self::Sphere => sphere(18, 36, 0.5),
            Self::Capsule => capsule(8, 16, 0.5, 0.5),
        }
    }
}

/// Unit cube: 24 vertices (4 per face, flat normals) and 36 indices.
pub fn cube() -> MeshData {
    #[rustfmt::skip]
    const POSITIONS: [[f32; 3]; 24] = [
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5], // +Z
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5], // +X
        [ 0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], // -Z
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5], // -X
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5], // +Y
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5], // -Y
    ];
    const NORMALS: [Vec3; 6] = [Vec3::Z, Vec3::X, Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y];

    let mut mesh = MeshData::default();
    for (face, normal) in NORMALS.iter().enumerate() {
        for corner in 0..4 {
            let p = POSITIONS[face * 4 + corner];
            mesh.push(Vec3::from_array(p), *normal, QUAD_TEX_COORDS[corner]);
        }
    }
    mesh.indices = quad_indices(36);
    mesh
}

/// Unit plane on XZ facing +Y: 4 vertices, 6 indices.
pub fn plane() -> MeshData {
    let mut mesh = MeshData::default();
    let corners = [
        Vec3::new(-0.5, 0.0, 0.5),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(0.5, 0.0, -0.5),
        Vec3::new(-0.5, 0.0, -0.5),
    ];
    for (corner, uv) in corners.into_iter().zip(QUAD_TEX_COORDS) {
        mesh.push(corner, Vec3::Y, uv);
    }
    mesh.indices = quad_indices(6);
    mesh
}

/// Y-up UV sphere. The first and last stacks are triangle fans, so their
/// degenerate halves are skipped.
pub fn sphere(stacks: u32, sectors: u32, radius: f32) -> MeshData {
    let mut mesh = MeshData::default();
    for i in 0..=stacks {
        let stack_angle = FRAC_PI_2 - i as f32 * PI / stacks as f32;
        let xy = radius * stack_angle.cos();
        let y = radius * stack_angle.sin();
        for j in 0..=sectors {
            let sector_angle = j as f32 * TAU / sectors as f32;
            let position = Vec3::new(xy * sector_angle.cos(), y, xy * sector_angle.sin());
            mesh.push(
                position,
                position / radius,
                Vec2::new(j as f32 / sectors as f32, i as f32 / stacks as f32),
            );
        }
    }

    for i in 0..stacks {
        let mut k1 = i * (sectors + 1);
        let mut k2 = k1 + sectors + 1;
        for _ in 0..sectors {
            if i != 0 {
                mesh.indices.extend_from_slice(&[k1, k1 + 1, k2]);
            }
            if i != stacks - 1 {
                mesh.indices.extend_from_slice(&[k1 + 1, k2 + 1, k2]);
            }
            k1 += 1;
            k2 += 1;
        }
    }
    mesh
}

/// Y-up capsule: top hemisphere, cylinder band, bottom hemisphere.
///
/// The vertex rows are the `rings` top-cap rings, the two cylinder rims and
/// the `rings` bottom-cap rings, stitched into `2 * rings + 1` bands.
pub fn capsule(rings: u32, segments: u32, radius: f32, half_height: f32) -> MeshData {
    let mut mesh = MeshData::default();
    let rows = (rings * 2 + 1) as f32;

    let ring = |mesh: &mut MeshData, y: f32, r: f32, normal_y: f32, v: f32| {
        for j in 0..=segments {
            let u = j as f32 / segments as f32;
            let theta = u * TAU;
            let x = -theta.sin() * r;
            let z = theta.cos() * r;
            mesh.push(
                Vec3::new(x, y, z),
                Vec3::new(x / radius, normal_y, z / radius),
                Vec2::new(u, 1.0 - v),
            );
        }
    };

    for i in 0..rings {
        let phi = FRAC_PI_2 * (1.0 - i as f32 / rings as f32);
        ring(
            &mut mesh,
            phi.sin() * radius + half_height,
            phi.cos() * radius,
            phi.sin(),
            i as f32 / rows,
        );
    }
    ring(&mut mesh, half_height, radius, 0.0, rings as f32 / rows);
    ring(&mut mesh, -half_height, radius, 0.0, (rings + 1) as f32 / rows);
    for i in 1..=rings {
        let phi = FRAC_PI_2 * (i as f32 / rings as f32);
        ring(
            &mut mesh,
            -phi.sin() * radius - half_height,
            phi.cos() * radius,
            -phi.sin(),
            (rings + 1 + i) as f32 / rows,
        );
    }

    for i in 0..(rings * 2 + 1) {
        for j in 0..segments {
            let k1 = i * (segments + 1) + j;
            let k2 = k1 + segments + 1;
            mesh.indices
                .extend_from_slice(&[k1, k1 + 1, k2, k1 + 1, k2 + 1, k2]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(mesh: &MeshData) -> bool {
        mesh.indices.iter().all(|&i| i < mesh.vertex_count())
    }

    #[test]
    fn quad_index_pattern() {
        assert_eq!(quad_indices(12), vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn cube_and_plane_sizes() {
        let cube = Primitive3d::Cube.mesh();
        assert_eq!((cube.vertex_count(), cube.index_count()), (24, 36));
        let plane = Primitive3d::Plane.mesh();
        assert_eq!((plane.vertex_count(), plane.index_count()), (4, 6));
        assert!(indices_in_range(&cube));
    }

    #[test]
    fn sphere_sizes() {
        let sphere = Primitive3d::Sphere.mesh();
        assert_eq!(sphere.vertex_count(), 19 * 37);
        assert_eq!(sphere.index_count(), (18 * 2 - 2) * 36 * 3);
        assert!(indices_in_range(&sphere));
        let top = Vec3::from_array(sphere.vertices[0].position);
        assert!((top - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn capsule_sizes_and_extent() {
        let capsule = Primitive3d::Capsule.mesh();
        assert_eq!(capsule.vertex_count(), 18 * 17);
        assert_eq!(capsule.index_count(), 17 * 16 * 6);
        assert!(indices_in_range(&capsule));

        let max_y = capsule
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        assert!((max_y - 1.0).abs() < 1e-5);
    }
}
