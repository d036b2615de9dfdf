use std::path::PathBuf;

use orbtrace_worker::InitError;

/// Where the fragment program comes from.
#[derive(Debug, Clone, Default)]
pub enum ShaderSource {
    /// The bundled minimal sphere tracer.
    #[default]
    Builtin,
    /// A WGSL file with `vertex_main` / `fragment_main` and the same bindings.
    File(PathBuf),
}

impl ShaderSource {
    pub fn load(&self) -> Result<String, InitError> {
        match self {
            Self::Builtin => Ok(BUILTIN_SHADER.to_owned()),
            Self::File(path) => std::fs::read_to_string(path)
                .map_err(|e| InitError::Shader(format!("{}: {e}", path.display()))),
        }
    }
}

/// Minimal WGSL sphere tracer matching the packed uniform and entity layouts.
///
/// Reflections follow `max_bounces`; sampling uses one ray per pixel.
pub const BUILTIN_SHADER: &str = r#"
struct Uniforms {
    camera: vec3<f32>,
    rotation: vec2<f32>,
    canvas_dimensions: vec2<f32>,
    light_theme: u32,
    fov_scale: f32,
    max_bounces: u32,
    antialiasing_samples: u32,
};

struct Sphere {
    position: vec3<f32>,
    @align(16) radius: f32,
    @align(16) color: vec3<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var<storage, read> spheres: array<Sphere>;

@vertex
fn vertex_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let corner = vec2<f32>(f32(index & 1u), f32(index >> 1u)) * 2.0 - 1.0;
    return vec4<f32>(corner, 0.0, 1.0);
}

fn sky(direction: vec3<f32>) -> vec3<f32> {
    let t = direction.z * 0.5 + 0.5;
    if (uniforms.light_theme == 1u) {
        return mix(vec3<f32>(0.85, 0.88, 0.92), vec3<f32>(1.0, 1.0, 1.0), t);
    }
    return mix(vec3<f32>(0.02, 0.02, 0.04), vec3<f32>(0.10, 0.12, 0.18), t);
}

fn hit_sphere(origin: vec3<f32>, direction: vec3<f32>, sphere: Sphere) -> f32 {
    let oc = origin - sphere.position;
    let b = dot(oc, direction);
    let c = dot(oc, oc) - sphere.radius * sphere.radius;
    let disc = b * b - c;
    if (disc < 0.0) {
        return -1.0;
    }
    return -b - sqrt(disc);
}

@fragment
fn fragment_main(@builtin(position) frag: vec4<f32>) -> @location(0) vec4<f32> {
    let yaw = uniforms.rotation.x;
    let pitch = uniforms.rotation.y;
    let forward = vec3<f32>(cos(yaw) * cos(pitch), sin(yaw) * cos(pitch), sin(pitch));
    let right = vec3<f32>(sin(yaw), -cos(yaw), 0.0);
    let up = cross(right, forward);

    let dims = max(uniforms.canvas_dimensions, vec2<f32>(1.0, 1.0));
    let uv = (frag.xy - dims * 0.5) / dims.y * uniforms.fov_scale;

    var origin = uniforms.camera;
    var direction = normalize(forward + right * uv.x - up * uv.y);
    var throughput = vec3<f32>(1.0, 1.0, 1.0);
    var color = vec3<f32>(0.0, 0.0, 0.0);
    let light = normalize(vec3<f32>(-0.4, 0.3, 1.0));

    for (var bounce = 0u; bounce <= uniforms.max_bounces; bounce++) {
        var nearest = 1e30;
        var hit_index = -1;
        for (var i = 0u; i < arrayLength(&spheres); i++) {
            let t = hit_sphere(origin, direction, spheres[i]);
            if (t > 1e-3 && t < nearest) {
                nearest = t;
                hit_index = i32(i);
            }
        }
        if (hit_index < 0) {
            color += throughput * sky(direction);
            break;
        }
        let sphere = spheres[hit_index];
        let point = origin + direction * nearest;
        let normal = normalize(point - sphere.position);
        let diffuse = max(dot(normal, light), 0.0) * 0.7 + 0.1;
        color += throughput * sphere.color * diffuse * 0.5;
        throughput *= sphere.color * 0.5;
        origin = point;
        direction = reflect(direction, normal);
    }

    return vec4<f32>(color, 1.0);
}
"#;
