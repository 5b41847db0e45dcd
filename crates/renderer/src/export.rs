//! Still-frame export evaluated on the CPU.
//!
//! The scene goes through the same per-frame update as the window; the
//! fragment stage is then evaluated per pixel with [`FragmentUniforms::shade`].

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::{Vec2, Vec4};
use image::{ImageFormat, Rgba, RgbaImage};
use tracing::info;
use wave::FragmentUniforms;
use winit::dpi::PhysicalSize;

use crate::runtime::{FixedTimeSource, RenderPolicy};
use crate::types::RendererConfig;
use crate::window::{headless_frame, RenderPolicyDriver};

/// Renders one frame of `config`'s scene at `time` seconds.
///
/// Row 0 of the image is the top of the drawable.
pub fn render_still_image(config: &RendererConfig, time: f32) -> Result<RgbaImage> {
    let (width, height) = config.surface_size;
    if width == 0 || height == 0 {
        return Err(anyhow!("cannot export an empty {width}x{height} frame"));
    }

    let policy = RenderPolicy::Still { time: Some(time) };
    let mut driver = RenderPolicyDriver::with_time_source(
        policy,
        Box::new(FixedTimeSource::new(time)),
    );
    let scene = headless_frame(
        &config.params,
        &mut driver,
        config.pointer,
        PhysicalSize::new(width, height),
    );
    let table = scene
        .uniforms()
        .ok_or_else(|| anyhow!("scene has no material to evaluate"))?;
    let uniforms = FragmentUniforms::from_table(table).context("material uniforms unreadable")?;

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let frag_coord = Vec2::new(x as f32 + 0.5, (height - 1 - y) as f32 + 0.5);
        to_rgba8(uniforms.shade(frag_coord))
    }))
}

/// Renders a still frame and writes it to `path` as PNG.
pub fn export_still(config: &RendererConfig, time: f32, path: &Path) -> Result<()> {
    let image = render_still_image(config, time)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;
    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        time,
        "still frame exported"
    );
    Ok(())
}

/// Quantizes a straight-alpha color, saturating values outside `[0, 1]`.
fn to_rgba8(color: Vec4) -> Rgba<u8> {
    let quantize = |channel: f32| {
        if channel.is_nan() {
            0
        } else {
            (channel.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    };
    Rgba(color.to_array().map(quantize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave::WaveParams;

    fn small_config() -> RendererConfig {
        RendererConfig {
            surface_size: (64, 48),
            ..RendererConfig::default()
        }
    }

    #[test]
    fn quantization_saturates_and_rounds() {
        assert_eq!(to_rgba8(Vec4::new(2.0, -1.0, 0.5, 1.0)), Rgba([255, 0, 128, 255]));
        assert_eq!(to_rgba8(Vec4::new(f32::NAN, 0.0, 0.0, 0.0)), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn still_image_has_requested_size_and_background_borders() {
        let config = RendererConfig {
            surface_size: (400, 100),
            ..RendererConfig::default()
        };
        let image = render_still_image(&config, 0.0).unwrap();
        assert_eq!(image.dimensions(), (400, 100));
        let background = to_rgba8(Vec4::from(WaveParams::default().background));
        assert_eq!(*image.get_pixel(0, 50), background);
        assert_eq!(*image.get_pixel(399, 50), background);
    }

    #[test]
    fn still_image_is_deterministic() {
        let config = small_config();
        let first = render_still_image(&config, 1.25).unwrap();
        let second = render_still_image(&config, 1.25).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn empty_surface_is_rejected() {
        let config = RendererConfig {
            surface_size: (0, 10),
            ..RendererConfig::default()
        };
        assert!(render_still_image(&config, 0.0).is_err());
    }

    #[test]
    fn export_writes_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("frame.png");
        export_still(&small_config(), 0.0, &path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }
}
