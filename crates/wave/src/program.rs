//! CPU evaluation of the wave fragment stage.
//!
//! Mirrors [`crate::glsl::WAVE_FRAGMENT_SHADER`] operation for operation in
//! `f32`, so still frames and regression tests do not need a GPU. GLSL
//! builtins follow their specified formulas; in particular `smoothstep` with
//! equal edges divides by zero and saturates the same way GPUs do.

use glam::{Vec2, Vec3, Vec4};

use crate::uniforms::{names, UniformError, UniformTable};

/// Uniform values read by the fragment stage, resolved once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentUniforms {
    pub resolution: Vec2,
    pub mouse: Vec2,
    pub time: f32,
    pub colors: [Vec3; 4],
    pub background: Vec4,
    pub scale: f32,
    pub waves: i32,
    pub thickness: f32,
    pub stretch_x: f32,
    pub stretch_y: f32,
    pub blur: f32,
    pub speed: f32,
    pub coil: f32,
}

impl FragmentUniforms {
    pub fn from_table(table: &UniformTable) -> Result<Self, UniformError> {
        let colors = table.vec3_array4(names::COLORS)?;
        Ok(Self {
            resolution: Vec2::from(table.vec2(names::RESOLUTION)?),
            mouse: Vec2::from(table.vec2(names::MOUSE)?),
            time: table.float(names::TIME)?,
            colors: colors.map(Vec3::from),
            background: Vec4::from(table.vec4(names::BACKGROUND)?),
            scale: table.float(names::SCALE)?,
            waves: table.int(names::WAVES)?,
            thickness: table.float(names::THICKNESS)?,
            stretch_x: table.float(names::STRETCH_X)?,
            stretch_y: table.float(names::STRETCH_Y)?,
            blur: table.float(names::BLUR)?,
            speed: table.float(names::SPEED)?,
            coil: table.float(names::COIL)?,
        })
    }

    /// Color of the pixel at `frag_coord` (pixel centers, bottom-left origin).
    pub fn shade(&self, frag_coord: Vec2) -> Vec4 {
        let uv = (frag_coord - 0.5 * self.resolution) / self.resolution.y;
        let color = self.render(uv);
        color * color.w + self.background * (1.0 - color.w)
    }

    fn render(&self, uv: Vec2) -> Vec4 {
        let mut color = Vec4::ZERO;
        let uv = uv * (1.0 - self.scale);
        let stretch = Vec2::new(
            1.5 - 1.5 * self.stretch_x,
            4.0 - 4.0 * self.stretch_y,
        );
        for i in 1..=self.waves {
            let c = self.colors[i.rem_euclid(4) as usize];
            let t = i as f32 / self.waves as f32;
            let l = self.wave(
                uv * stretch,
                1.0 + t * self.speed * 8.0,
                self.coil * t,
                c * Vec3::new(0.2 + t * 0.7, 0.2 + t * 0.4, 1.0 * t),
            );
            let alpha = clamp(l.x + l.y + l.z, 0.0, 1.0);
            color += l.truncate().extend(alpha);
        }
        color
    }

    fn wave(&self, mut uv: Vec2, speed: f32, height: f32, col: Vec3) -> Vec4 {
        let taper = uv.x.abs();
        uv.y += smoothstep(1.0, 0.0, taper) * (self.time * speed + uv.x * height).sin() * 0.2;
        let line = smoothstep(
            self.blur * smoothstep(0.1, 0.9, taper),
            0.0,
            uv.y.abs() * (1.0 - self.blur) - 0.2 * self.thickness,
        );
        (line * col).extend(1.0) * smoothstep(1.0, 0.5, uv.x.abs())
    }
}

/// GLSL `clamp`; `max` first so a NaN input collapses to `lo`.
fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}

/// GLSL `smoothstep`, including reversed (`edge0 > edge1`) edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveParams;
    use crate::scene::{Mesh, ShaderMaterial};
    use crate::updater::{update_uniforms, DrawableSize, FrameInput, PointerState};

    // Reference colors for the default parameters on a 100x100 surface at
    // t = 0. Accumulated alpha exceeds one near the center, so the composited
    // channels overshoot the displayable range there.
    const GOLDEN_CENTER: [f32; 4] = [15.578185, 8.983296, 23.010635, 33.44538];
    const GOLDEN_OFF_CENTER: [f32; 4] = [0.00351, 0.166755, 0.16396, 0.7525];

    fn golden_uniforms(params: &WaveParams) -> FragmentUniforms {
        let mut mesh = Mesh::plane(ShaderMaterial::wave(params));
        update_uniforms(
            Some(&mut mesh),
            &FrameInput {
                elapsed: 0.0,
                pointer: PointerState::new(0.0, 0.0),
                drawable: DrawableSize::new(100.0, 100.0),
            },
        );
        FragmentUniforms::from_table(&mesh.material.uniforms).unwrap()
    }

    fn assert_close(actual: Vec4, expected: [f32; 4]) {
        let expected = Vec4::from(expected);
        let tolerance = 1e-4 * expected.abs().max_element().max(1.0);
        assert!(
            (actual - expected).abs().max_element() < tolerance,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn smoothstep_matches_glsl_definition() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((smoothstep(1.0, 0.0, 0.25) - 0.84375).abs() < 1e-6);
    }

    #[test]
    fn smoothstep_with_equal_edges_saturates() {
        assert_eq!(smoothstep(0.0, 0.0, 0.5), 1.0);
        assert_eq!(smoothstep(0.0, 0.0, -0.5), 0.0);
        assert_eq!(smoothstep(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn center_pixel_matches_golden_value() {
        let uniforms = golden_uniforms(&WaveParams::default());
        let color = uniforms.shade(Vec2::new(50.5, 50.5));
        assert_close(color, GOLDEN_CENTER);
    }

    #[test]
    fn off_center_pixel_matches_golden_value() {
        let uniforms = golden_uniforms(&WaveParams::default());
        let color = uniforms.shade(Vec2::new(30.5, 55.5));
        assert_close(color, GOLDEN_OFF_CENTER);
    }

    #[test]
    fn shading_is_deterministic() {
        let uniforms = golden_uniforms(&WaveParams::default());
        for &(x, y) in &[(0.5, 0.5), (12.5, 77.5), (99.5, 99.5)] {
            let coord = Vec2::new(x, y);
            assert_eq!(uniforms.shade(coord), uniforms.shade(coord));
        }
    }

    #[test]
    fn far_edges_show_only_background() {
        // |uv.x| * 1.5 >= 1 at the left and right borders, so every wave tapers out.
        let mut uniforms = golden_uniforms(&WaveParams::default());
        uniforms.resolution = Vec2::new(400.0, 100.0);
        let color = uniforms.shade(Vec2::new(0.5, 50.5));
        assert_close(color, WaveParams::default().background);
    }

    #[test]
    fn zero_waves_render_background_without_nan() {
        let params = WaveParams {
            waves: 0,
            ..WaveParams::default()
        };
        let uniforms = golden_uniforms(&params);
        for &(x, y) in &[(50.5, 50.5), (0.5, 99.5)] {
            let color = uniforms.shade(Vec2::new(x, y));
            assert!(!color.is_nan());
            assert_eq!(color, Vec4::from(params.background));
        }
    }
}

