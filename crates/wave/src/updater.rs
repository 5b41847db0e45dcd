//! Per-frame synchronisation of the dynamic uniforms.
//!
//! The host calls [`update_uniforms`] exactly once per frame, before the draw
//! consumes the table. Pointer, clock and drawable size are sampled by the
//! host and handed over in a [`FrameInput`]; nothing here blocks or keeps
//! state between frames.

use tracing::warn;

use crate::scene::Mesh;
use crate::uniforms::{names, UniformError, UniformKind, UniformTable, UniformValue};

/// Pointer position in device-normalized coordinates (`[-1, 1]`, +y up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Converts a cursor position measured in pixels from the top-left corner.
    ///
    /// An empty drawable maps to the center so the first frames of a window
    /// that has not been laid out yet stay well defined.
    pub fn from_physical(px: f64, py: f64, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::default();
        }
        let x = (px / f64::from(width)) * 2.0 - 1.0;
        let y = -(py / f64::from(height)) * 2.0 + 1.0;
        Self::new(x as f32, y as f32)
    }

    /// Maps the pointer into `[0, 1]` per axis, the form `u_mouse` expects.
    pub fn normalized(&self) -> [f32; 2] {
        [self.x / 2.0 + 0.5, self.y / 2.0 + 0.5]
    }
}

/// Pixel size of the drawable at the time the frame was sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableSize {
    pub width: f32,
    pub height: f32,
}

impl DrawableSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Everything the host samples for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the animation started.
    pub elapsed: f32,
    pub pointer: PointerState,
    pub drawable: DrawableSize,
}

/// The three values written into the table each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicUniforms {
    pub mouse: [f32; 2],
    pub time: f32,
    pub resolution: [f32; 2],
}

impl From<&FrameInput> for DynamicUniforms {
    fn from(frame: &FrameInput) -> Self {
        Self {
            mouse: frame.pointer.normalized(),
            time: frame.elapsed,
            resolution: [frame.drawable.width, frame.drawable.height],
        }
    }
}

impl UniformTable {
    /// Writes all three dynamic uniforms, or none of them if any slot is
    /// missing or has the wrong type.
    pub fn write_dynamic(&mut self, values: &DynamicUniforms) -> Result<(), UniformError> {
        self.check(names::MOUSE, UniformKind::Vec2)?;
        self.check(names::TIME, UniformKind::Float)?;
        self.check(names::RESOLUTION, UniformKind::Vec2)?;
        self.set(names::MOUSE, UniformValue::Vec2(values.mouse))?;
        self.set(names::TIME, UniformValue::Float(values.time))?;
        self.set(names::RESOLUTION, UniformValue::Vec2(values.resolution))
    }
}

/// Synchronises the mesh material with the current frame's input.
///
/// A missing mesh (the scene is still being built) turns the call into a
/// no-op. A malformed table is logged and left untouched.
pub fn update_uniforms(mesh: Option<&mut Mesh>, frame: &FrameInput) {
    let Some(mesh) = mesh else {
        return;
    };
    let values = DynamicUniforms::from(frame);
    if let Err(err) = mesh.material.uniforms.write_dynamic(&values) {
        warn!(error = %err, "skipping uniform update for malformed material");
    }
}
