//! Renderer crate for wavepaper.
//!
//! The crate glues the `winit` window, the `wgpu` pipeline, and the wave
//! scene together. The overall flow is:
//!
//! ```text
//!   CLI / config file
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          │                                      │
//!          │                                      └─▶ Scene::update() ─▶ GPU UBOs
//!          └─▶ export::export_still() ─▶ CPU shading ─▶ PNG
//! ```
//!
//! `WindowState` owns all GPU resources (surface, device, pipeline, uniform
//! buffers), while `Renderer` is the thin entry point that chooses between
//! the interactive window and a still export. The material's GLSL is wrapped
//! at runtime so it can be compiled as Vulkan GLSL and fed its uniforms from
//! std140 blocks.

mod compile;
pub mod export;
mod gpu;
pub mod runtime;
pub mod types;
mod window;

use anyhow::Result;

pub use export::{export_still, render_still_image};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FrameScheduler, ManualTimeSource,
    RenderPolicy, SystemTimeSource, TimeSample, TimeSource,
};
pub use types::{
    AdapterProfile, Antialiasing, GpuPowerPreference, RenderMode, RendererConfig, SurfaceSettings,
};

/// High-level entry point that owns the chosen configuration.
///
/// The heavy lifting lives inside the window state; `Renderer` simply selects
/// the presentation path and forwards the request.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Runs until the window closes, or writes the still frame for an export
    /// policy without opening a window.
    pub fn run(&mut self) -> Result<()> {
        match &self.config.policy {
            RenderPolicy::Export { time, path } => {
                export::export_still(&self.config, time.unwrap_or(0.0), path)
            }
            RenderPolicy::Animate { .. } | RenderPolicy::Still { .. } => {
                window::run(&self.config)
            }
        }
    }
}
