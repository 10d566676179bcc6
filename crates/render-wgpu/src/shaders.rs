/// Batched quads. `tex_index` selects one of `TEXTURE_SLOTS` bound textures.
///
/// `TEXTURE_SLOTS` is substituted by [`quad_shader`].
const QUAD_SHADER_TEMPLATE: &str = r#"
struct Camera {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var textures: binding_array<texture_2d<f32>, TEXTURE_SLOTS>;
@group(1) @binding(1)
var texture_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) tex_coord: vec2<f32>,
    @location(3) tex_index: f32,
    @location(4) tiling_factor: f32,
    @location(5) entity_id: i32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) tex_coord: vec2<f32>,
    @location(2) @interpolate(flat) tex_index: u32,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_projection * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    out.tex_coord = in.tex_coord * in.tiling_factor;
    out.tex_index = u32(round(in.tex_index));
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(textures[in.tex_index], texture_sampler, in.tex_coord);
    let color = texel * in.color;
    if color.a == 0.0 {
        discard;
    }
    return color;
}
"#;

pub fn quad_shader(texture_slots: u32) -> String {
    QUAD_SHADER_TEMPLATE.replace("TEXTURE_SLOTS", &texture_slots.to_string())
}

/// Circles and rings drawn on quads; `local_position` spans [-1, 1].
pub const CIRCLE_SHADER: &str = r#"
struct Camera {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) world_position: vec3<f32>,
    @location(1) local_position: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) thickness: f32,
    @location(4) fade: f32,
    @location(5) entity_id: i32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local_position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) thickness: f32,
    @location(3) fade: f32,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_projection * vec4<f32>(in.world_position, 1.0);
    out.local_position = in.local_position;
    out.color = in.color;
    out.thickness = in.thickness;
    out.fade = in.fade;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let distance = 1.0 - length(in.local_position.xy);
    var alpha = smoothstep(0.0, in.fade, distance);
    alpha *= smoothstep(in.thickness + in.fade, in.thickness, distance);
    if alpha == 0.0 {
        discard;
    }
    return vec4<f32>(in.color.rgb, in.color.a * alpha);
}
"#;

pub const LINE_SHADER: &str = r#"
struct Camera {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) entity_id: i32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_projection * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Instanced primitives with a fixed directional light.
pub const MESH_SHADER: &str = r#"
struct Camera {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coord: vec2<f32>,
};

struct InstanceInput {
    @location(3) color: vec4<f32>,
    @location(4) custom_data: vec4<f32>,
    @location(5) model_0: vec4<f32>,
    @location(6) model_1: vec4<f32>,
    @location(7) model_2: vec4<f32>,
    @location(8) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = camera.view_projection * world_pos;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let diffuse = max(dot(in.world_normal, light_dir), 0.0);
    let lighting = 0.3 + diffuse * 0.7;
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;

/// Infinite XZ grid ray-cast from a full-screen quad. Fades with distance
/// and writes its own depth so it intersects geometry correctly.
pub const GRID_SHADER: &str = r#"
struct Grid {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    inverse_view: mat4x4<f32>,
    inverse_projection: mat4x4<f32>,
    near: f32,
    far: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> grid: Grid;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) near_point: vec3<f32>,
    @location(1) far_point: vec3<f32>,
};

struct FragmentOutput {
    @location(0) color: vec4<f32>,
    @builtin(frag_depth) depth: f32,
};

fn unproject(p: vec2<f32>, z: f32) -> vec3<f32> {
    let world = grid.inverse_view * grid.inverse_projection * vec4<f32>(p, z, 1.0);
    return world.xyz / world.w;
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var plane = array<vec2<f32>, 6>(
        vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, -1.0), vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(1.0, -1.0),
    );
    let p = plane[index];
    var out: VertexOutput;
    out.clip_position = vec4<f32>(p, 0.0, 1.0);
    out.near_point = unproject(p, 0.0);
    out.far_point = unproject(p, 1.0);
    return out;
}

fn grid_color(point: vec3<f32>, scale: f32) -> vec4<f32> {
    let coord = point.xz * scale;
    let derivative = fwidth(coord);
    let g = abs(fract(coord - 0.5) - 0.5) / derivative;
    let line = min(g.x, g.y);
    let min_x = min(derivative.x, 1.0);
    let min_z = min(derivative.y, 1.0);
    var color = vec4<f32>(0.2, 0.2, 0.2, 1.0 - min(line, 1.0));
    if abs(point.x) < 0.1 * min_x {
        color = vec4<f32>(0.2, 0.2, 1.0, color.a);
    }
    if abs(point.z) < 0.1 * min_z {
        color = vec4<f32>(1.0, 0.2, 0.2, color.a);
    }
    return color;
}

@fragment
fn fs_main(in: VertexOutput) -> FragmentOutput {
    let t = -in.near_point.y / (in.far_point.y - in.near_point.y);
    let point = in.near_point + t * (in.far_point - in.near_point);
    let clip = grid.projection * grid.view * vec4<f32>(point, 1.0);
    let depth = clip.z / clip.w;

    let linear_depth = grid.near * grid.far / (grid.far - depth * (grid.far - grid.near));
    let fading = max(0.0, 0.5 - linear_depth / grid.far);

    var out: FragmentOutput;
    out.depth = clamp(depth, 0.0, 1.0);
    var color = grid_color(point, 1.0) + grid_color(point, 0.1);
    color.a *= fading * f32(t > 0.0);
    if color.a <= 0.0 {
        discard;
    }
    out.color = color;
    return out;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_shader_sizes_texture_array() {
        let source = quad_shader(16);
        assert!(source.contains("binding_array<texture_2d<f32>, 16>"));
        assert!(!source.contains("TEXTURE_SLOTS"));
    }
}
