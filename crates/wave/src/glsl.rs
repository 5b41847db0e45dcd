//! GLSL sources of the wave material.
//!
//! Both stages are written against the classic uniform-per-declaration
//! dialect. The renderer rewrites the declarations into a std140 block before
//! handing the code to the GPU, and [`crate::program`] mirrors the fragment
//! stage on the CPU.

/// Fragment stage: draws `u_waves` tapered sine lines over `u_background`.
pub const WAVE_FRAGMENT_SHADER: &str = r"uniform vec2 u_resolution;
uniform vec2 u_mouse;
uniform float u_time;
uniform vec3 u_colors[4];
uniform vec4 u_background;
uniform float u_scale;
uniform int u_waves;
uniform float u_thickness;
uniform float u_stretch_x;
uniform float u_stretch_y;
uniform float u_blur;
uniform float u_speed;
uniform float u_coil;

vec4 wave(vec2 uv, float speed, float height, vec3 col) {
  float taper = abs(uv.x);
  uv.y += smoothstep(1., 0., taper) * sin(u_time * speed + uv.x * height) * .2;
  return vec4(
    smoothstep(u_blur * smoothstep(.1, .9, taper), 0., abs(uv.y)*(1.-u_blur) - .2*u_thickness) * col,
    1.0
  ) * smoothstep(1., .5, abs(uv.x));
}

vec4 render(vec2 uv) {
  vec4 color = vec4(0.);
  uv *= (1. - u_scale);
  for (int i = 1; i <= u_waves; i++) {
    vec3 c = u_colors[i % 4];
    float t = float(i) / float(u_waves);
    vec4 l = wave(
      uv * vec2(1.5 - 1.5 * u_stretch_x, 4. - 4. * u_stretch_y),
      1. + t * u_speed * 8.0,
      u_coil * t,
      c * vec3(.2 + t * .7, .2 + t * .4, 1.0 * t)
    );
    color += vec4(l.rgb, clamp(l.r + l.g + l.b, 0., 1.));
  }
  return color;
}

void main() {
  vec2 uv = (gl_FragCoord.xy - .5 * u_resolution.xy) / u_resolution.y;
  vec4 color = render(uv);
  color = (color * color.a) + (u_background * (1. - color.a));
  gl_FragColor = color;
}
";

/// Vertex stage: standard projection × model-view transform, nothing else.
pub const WAVE_VERTEX_SHADER: &str = r"void main() {
  gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
}
";
