use std::borrow::Cow;

use anyhow::{anyhow, Result};
use wave::names;
use wgpu::naga::ShaderStage;

/// Wraps the material's vertex stage and compiles it as Vulkan GLSL.
pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let wrapped = wrap_vertex(source);
    tracing::trace!(source = %wrapped, "wrapped vertex stage");
    compile_glsl(device, "wave vertex", wrapped, ShaderStage::Vertex)
}

/// Wraps the material's fragment stage and compiles it as Vulkan GLSL.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let wrapped = wrap_fragment(source);
    tracing::trace!(source = %wrapped, "wrapped fragment stage");
    compile_glsl(device, "wave fragment", wrapped, ShaderStage::Fragment)
}

fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    source: String,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source),
            stage,
            defines: &[],
        },
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(anyhow!("failed to compile {label}: {err}"));
    }
    Ok(module)
}

/// Produces a self-contained GLSL 450 vertex shader from the material source.
///
/// The material refers to `position`, `projectionMatrix` and
/// `modelViewMatrix` as implicit inputs; [`VERTEX_HEADER`] declares them.
fn wrap_vertex(source: &str) -> String {
    let body = sanitize(source, false, |_| false);
    format!("{VERTEX_HEADER}\n#line 1\n{body}")
}

/// Produces a self-contained GLSL 450 fragment shader from the material source.
///
/// Steps performed:
///
/// 1. Strip `#version`/`precision` directives and the material's loose
///    `uniform` declarations so the std140 block can replace them.
/// 2. Redirect `gl_FragColor` to the color output and `gl_FragCoord` to a
///    bottom-left origin copy, and rename the material's `main`.
/// 3. Prepend [`FRAGMENT_HEADER`] and append [`FRAGMENT_FOOTER`], whose `main`
///    fills in the coordinate copy and calls the material entry point.
fn wrap_fragment(source: &str) -> String {
    let body = sanitize(source, true, |line| {
        line.starts_with("uniform ") && names::ALL.iter().any(|name| line.contains(name))
    });
    let body = body
        .replace("gl_FragColor", "wave_out_color")
        .replace("gl_FragCoord", "wave_frag_coord");
    format!("{FRAGMENT_HEADER}\n#line 1\n{body}{FRAGMENT_FOOTER}")
}

fn sanitize(source: &str, rename_main: bool, skip_uniform: impl Fn(&str) -> bool) -> String {
    let mut sanitized = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#version") || trimmed.starts_with("precision ") {
            continue;
        }
        if skip_uniform(trimmed) {
            continue;
        }
        if rename_main && trimmed.starts_with("void main(") {
            sanitized.push_str(&line.replacen("main(", "wave_main(", 1));
        } else {
            sanitized.push_str(line);
        }
        sanitized.push('\n');
    }
    sanitized
}

/// GLSL prologue for the vertex stage.
///
/// The `WaveCamera` block layout must match `CameraBlock` in `gpu/uniforms.rs`.
const VERTEX_HEADER: &str = r"#version 450
layout(location = 0) in vec3 position;

layout(std140, set = 0, binding = 1) uniform WaveCamera {
    mat4 _projectionMatrix;
    mat4 _modelViewMatrix;
} camera;

#define projectionMatrix camera._projectionMatrix
#define modelViewMatrix camera._modelViewMatrix
";

/// GLSL prologue for the fragment stage.
///
/// The `WaveMaterial` block layout must match `MaterialBlock` in
/// `gpu/uniforms.rs`. Members carry a leading underscore so the macros below
/// can keep the material's plain uniform names.
const FRAGMENT_HEADER: &str = r"#version 450
layout(location = 0) out vec4 wave_out_color;

layout(std140, set = 0, binding = 0) uniform WaveMaterial {
    vec3 _u_colors[4];
    vec4 _u_background;
    vec2 _u_resolution;
    vec2 _u_mouse;
    float _u_time;
    float _u_scale;
    int _u_waves;
    float _u_thickness;
    float _u_stretch_x;
    float _u_stretch_y;
    float _u_blur;
    float _u_speed;
    float _u_coil;
} material;

#define u_colors material._u_colors
#define u_background material._u_background
#define u_resolution material._u_resolution
#define u_mouse material._u_mouse
#define u_time material._u_time
#define u_scale material._u_scale
#define u_waves material._u_waves
#define u_thickness material._u_thickness
#define u_stretch_x material._u_stretch_x
#define u_stretch_y material._u_stretch_y
#define u_blur material._u_blur
#define u_speed material._u_speed
#define u_coil material._u_coil

vec4 wave_frag_coord;
";

/// GLSL epilogue: flips the hardware top-left origin to bottom-left.
const FRAGMENT_FOOTER: &str = r"
void main() {
    wave_frag_coord = vec4(gl_FragCoord.x, u_resolution.y - gl_FragCoord.y, gl_FragCoord.z, gl_FragCoord.w);
    wave_main();
}
";
