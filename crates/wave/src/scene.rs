//! Imperatively built scene: one camera, one shaded plane.

use std::borrow::Cow;

use glam::{Mat4, Vec3};

use crate::glsl::{WAVE_FRAGMENT_SHADER, WAVE_VERTEX_SHADER};
use crate::params::WaveParams;
use crate::uniforms::UniformTable;
use crate::updater::{update_uniforms, FrameInput};

/// Perspective camera looking down -Z at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }

    /// Updates the aspect ratio; degenerate sizes keep the previous value.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection into wgpu clip space (depth in `[0, 1]`).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }
}

/// Axis-aligned plane in the XY plane centered on the origin, split into two
/// counter-clockwise triangles facing +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
        }
    }
}

impl PlaneGeometry {
    /// Corner positions: top-left, top-right, bottom-left, bottom-right.
    pub fn positions(&self) -> [[f32; 3]; 4] {
        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;
        [
            [-half_w, half_h, 0.0],
            [half_w, half_h, 0.0],
            [-half_w, -half_h, 0.0],
            [half_w, -half_h, 0.0],
        ]
    }

    pub fn indices(&self) -> [u16; 6] {
        [0, 2, 1, 2, 3, 1]
    }
}

/// Shader program sources plus the uniform table they read.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub vertex_source: Cow<'static, str>,
    pub fragment_source: Cow<'static, str>,
    pub uniforms: UniformTable,
}

impl ShaderMaterial {
    pub fn new(
        vertex_source: impl Into<Cow<'static, str>>,
        fragment_source: impl Into<Cow<'static, str>>,
        uniforms: UniformTable,
    ) -> Self {
        Self {
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
            uniforms,
        }
    }

    /// The wave material with its uniform table seeded from `params`.
    pub fn wave(params: &WaveParams) -> Self {
        Self::new(
            WAVE_VERTEX_SHADER,
            WAVE_FRAGMENT_SHADER,
            params.uniform_table(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: PlaneGeometry,
    pub material: ShaderMaterial,
    pub position: Vec3,
}

impl Mesh {
    /// A 100×100 plane at the origin carrying `material`.
    pub fn plane(material: ShaderMaterial) -> Self {
        Self {
            geometry: PlaneGeometry::default(),
            material,
            position: Vec3::ZERO,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

/// Camera plus the (optional) mesh it looks at.
///
/// The mesh slot starts empty so hosts can run frames before the material is
/// ready; updates during that window do nothing.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub camera: PerspectiveCamera,
    mesh: Option<Mesh>,
}

impl Scene {
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self { camera, mesh: None }
    }

    /// Builds the full wave scene for a drawable of the given aspect ratio.
    pub fn wave(params: &WaveParams, aspect: f32) -> Self {
        let mut scene = Self::new(PerspectiveCamera::new(aspect));
        scene.attach(Mesh::plane(ShaderMaterial::wave(params)));
        scene
    }

    pub fn attach(&mut self, mesh: Mesh) {
        self.mesh = Some(mesh);
    }

    pub fn detach(&mut self) -> Option<Mesh> {
        self.mesh.take()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn uniforms(&self) -> Option<&UniformTable> {
        self.mesh.as_ref().map(|mesh| &mesh.material.uniforms)
    }

    /// Per-frame callback: tracks the drawable aspect and refreshes the
    /// dynamic uniforms of the attached material.
    pub fn update(&mut self, frame: &FrameInput) {
        self.camera.set_aspect(frame.drawable.aspect());
        update_uniforms(self.mesh.as_mut(), frame);
    }

    /// `projection` and `model_view` matrices for the attached mesh.
    pub fn transforms(&self) -> (Mat4, Mat4) {
        let model = self
            .mesh
            .as_ref()
            .map(Mesh::model_matrix)
            .unwrap_or(Mat4::IDENTITY);
        (
            self.camera.projection_matrix(),
            self.camera.view_matrix() * model,
        )
    }
}
