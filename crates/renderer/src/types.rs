use wave::{PointerState, WaveParams};

use crate::runtime::RenderPolicy;

/// How the visual is mounted on the desktop.
///
/// * `Windowed` opens a decorated window of `surface_size`.
/// * `Fullscreen` covers the current monitor with a borderless window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Windowed,
    Fullscreen,
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Auto
    }
}

/// Adapter selection hint handed to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Static configuration of the drawable, fixed for the lifetime of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSettings {
    /// Keep an alpha channel in the swapchain and let the compositor blend it.
    pub transparent: bool,
    /// Whether color values handed to the compositor are premultiplied.
    pub premultiplied_alpha: bool,
    pub antialiasing: Antialiasing,
    pub power: GpuPowerPreference,
    /// Request `COPY_SRC` on swapchain images so the last frame stays readable.
    pub preserve_drawing_buffer: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            transparent: true,
            premultiplied_alpha: false,
            antialiasing: Antialiasing::Auto,
            power: GpuPowerPreference::High,
            preserve_drawing_buffer: true,
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and the configuration file: how large the
/// window should be, how it is mounted, how frames are paced, and the static
/// tuning uniforms of the wave material.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Presentation mode (window vs fullscreen).
    pub mode: RenderMode,
    /// Surface options applied when the swapchain is created.
    pub surface: SurfaceSettings,
    /// Static uniforms of the wave material.
    pub params: WaveParams,
    /// High-level render behaviour requested by the caller.
    pub policy: RenderPolicy,
    /// Pointer position used until the first cursor event, and by still export.
    pub pointer: PointerState,
    /// Title of the preview window.
    pub title: String,
}

impl Default for RendererConfig {
    /// Provides a 720p windowed configuration with the default wave.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            mode: RenderMode::Windowed,
            surface: SurfaceSettings::default(),
            params: WaveParams::default(),
            policy: RenderPolicy::default(),
            pointer: PointerState::default(),
            title: "wavepaper".to_string(),
        }
    }
}

/// Summary of the adapter `wgpu` picked, kept for logging and frame pacing.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    /// Whether a swapchain of `width`x`height` fits the adapter's 2D texture limit.
    pub fn fits_surface(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dimension && height <= self.max_texture_dimension
    }

    /// CPU rasterizers (llvmpipe, SwiftShader, WARP) report themselves as `Cpu`.
    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_surface_matches_drawable_contract() {
        let surface = SurfaceSettings::default();
        assert!(surface.transparent);
        assert!(!surface.premultiplied_alpha);
        assert_eq!(surface.antialiasing, Antialiasing::Auto);
        assert_eq!(surface.power, GpuPowerPreference::High);
        assert!(surface.preserve_drawing_buffer);
    }

    #[test]
    fn software_adapters_are_detected_by_type_or_name() {
        let mut profile = AdapterProfile {
            name: "NVIDIA GeForce".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::DiscreteGpu,
            max_texture_dimension: 16384,
        };
        assert!(!profile.is_software());
        profile.name = "llvmpipe (LLVM 17.0.6, 256 bits)".into();
        assert!(profile.is_software());
        profile.name = "SwiftShader".into();
        profile.device_type = wgpu::DeviceType::Cpu;
        assert!(profile.is_software());
    }

    #[test]
    fn surface_fits_only_within_texture_limit() {
        let profile = AdapterProfile {
            name: "test adapter".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::IntegratedGpu,
            max_texture_dimension: 4096,
        };
        assert!(profile.fits_surface(4096, 2160));
        assert!(!profile.fits_surface(4097, 1080));
        assert!(!profile.fits_surface(1920, 8192));
    }
}
