//! WGSL sources for the point and line pipelines.
//!
//! Both share the uniform block at group 0. Fog is exponential squared on
//! view-space depth and fades fragments toward transparent, which under
//! additive blending reads as fading into the background.

/// Uniform block shared by both pipelines. Must match `super::Uniforms`.
const UNIFORMS: &str = r#"
struct Uniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_position: vec3<f32>,
    point_size: f32,
    fog_color: vec3<f32>,
    fog_density: f32,
    viewport: vec2<f32>,
    sprite_enabled: f32,
    _pad: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

fn fog_factor(depth: f32) -> f32 {
    let d = uniforms.fog_density * depth;
    return clamp(1.0 - exp(-d * d), 0.0, 1.0);
}
"#;

const POINT_BODY: &str = r#"
@group(1) @binding(0)
var sprite_texture: texture_2d<f32>;
@group(1) @binding(1)
var sprite_sampler: sampler;

struct PointOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) depth: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> PointOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index];

    // Billboard in view space so points always face the camera.
    let world = uniforms.model * vec4<f32>(position, 1.0);
    var view_pos = uniforms.view * world;
    view_pos = vec4<f32>(view_pos.xy + corner * uniforms.point_size * 0.5, view_pos.zw);

    var out: PointOut;
    out.clip_position = uniforms.projection * view_pos;
    out.color = color;
    out.uv = corner * 0.5 + vec2<f32>(0.5, 0.5);
    out.depth = -view_pos.z;
    return out;
}

@fragment
fn fs_main(in: PointOut) -> @location(0) vec4<f32> {
    let sprite_alpha = textureSample(sprite_texture, sprite_sampler, in.uv).a;
    let r = length(in.uv * 2.0 - vec2<f32>(1.0, 1.0));
    let disc_alpha = 1.0 - smoothstep(0.6, 1.0, r);
    let alpha = select(disc_alpha, sprite_alpha, uniforms.sprite_enabled > 0.5);

    let visibility = 1.0 - fog_factor(in.depth);
    return vec4<f32>(in.color, alpha * visibility);
}
"#;

const LINE_BODY: &str = r#"
struct LineOut {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) depth: f32,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> LineOut {
    let view_pos = uniforms.view * uniforms.model * vec4<f32>(position, 1.0);

    var out: LineOut;
    out.clip_position = uniforms.projection * view_pos;
    out.color = color;
    out.depth = -view_pos.z;
    return out;
}

@fragment
fn fs_main(in: LineOut) -> @location(0) vec4<f32> {
    let visibility = 1.0 - fog_factor(in.depth);
    return vec4<f32>(in.color, visibility);
}
"#;

/// Instanced billboard shader: six vertices per point, one instance per particle.
pub fn point_shader() -> String {
    format!("{UNIFORMS}{POINT_BODY}")
}

/// `LineList` shader: colors already carry the per-edge fade.
pub fn line_shader() -> String {
    format!("{UNIFORMS}{LINE_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(code: &str) {
        let module = match naga::front::wgsl::parse_str(code) {
            Ok(m) => m,
            Err(e) => panic!("WGSL parse error:\n{}", e.emit_to_string(code)),
        };

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("WGSL validation error: {:?}", e);
        }
    }

    #[test]
    fn test_point_shader_valid() {
        validate(&point_shader());
    }

    #[test]
    fn test_line_shader_valid() {
        validate(&line_shader());
    }

    #[test]
    fn test_uniform_block_matches_rust_layout() {
        let module = naga::front::wgsl::parse_str(&line_shader()).unwrap();
        let (_, ty) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Uniforms"))
            .unwrap();
        match &ty.inner {
            naga::TypeInner::Struct { span, .. } => {
                assert_eq!(*span as usize, std::mem::size_of::<super::super::Uniforms>());
            }
            other => panic!("Uniforms is not a struct: {:?}", other),
        }
    }
}
