//! GPU side of the renderer.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` compiles the material's wrapped GLSL into a render pipeline
//!   with a single bind group layout.
//! - `uniforms` holds the std140 images of the material and camera blocks.
//! - `state` uploads geometry once, rewrites both uniform blocks every frame
//!   and exposes the `GpuState` API used by `window`.

mod context;
mod pipeline;
mod state;
pub(crate) mod uniforms;

pub(crate) use state::GpuState;
