//! Core of the wave background: everything that does not touch the GPU.
//!
//! ```text
//!   host frame callback
//!          │ FrameInput { elapsed, pointer, drawable }
//!          ▼
//!   Scene::update ──▶ update_uniforms() ──▶ ShaderMaterial.uniforms
//!                                                   │
//!                          renderer packs std140 ◀──┤
//!                     program::FragmentUniforms ◀───┘  (CPU reference)
//! ```
//!
//! The scene is built explicitly (`Scene::wave`) rather than declared; the
//! host owns the GPU-side copies and releases them itself.

pub mod glsl;
pub mod params;
pub mod program;
pub mod scene;
pub mod uniforms;
pub mod updater;

pub use params::WaveParams;
pub use program::FragmentUniforms;
pub use scene::{Mesh, PerspectiveCamera, PlaneGeometry, Scene, ShaderMaterial};
pub use uniforms::{names, UniformError, UniformKind, UniformTable, UniformValue};
pub use updater::{update_uniforms, DrawableSize, DynamicUniforms, FrameInput, PointerState};
