use anyhow::{Context, Result};
use renderer::{RenderMode, RenderPolicy, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;
use wave::UniformValue;

use crate::cli::RunArgs;
use crate::config::FileConfig;

pub fn run(args: RunArgs) -> Result<()> {
    let file = FileConfig::load(args.config.as_deref())?;
    let config = build_renderer_config(&args, &file)?;
    tracing::info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        policy = ?config.policy,
        antialiasing = ?config.surface.antialiasing,
        "starting wavepaper"
    );
    let mut renderer = Renderer::new(config);
    renderer.run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Merges the configuration file with CLI flags; flags win.
pub fn build_renderer_config(args: &RunArgs, file: &FileConfig) -> Result<RendererConfig> {
    let defaults = RendererConfig::default();
    let mut surface = file.surface_settings()?;
    if let Some(antialias) = args.antialias {
        surface.antialiasing = antialias;
    }

    for (flag, reason) in ignored_flags(args) {
        tracing::warn!("{flag} ignored {reason}");
    }

    let policy = if let Some(path) = args.still_export.clone() {
        RenderPolicy::Export {
            time: args.still_time,
            path,
        }
    } else if args.still {
        RenderPolicy::Still {
            time: args.still_time,
        }
    } else {
        RenderPolicy::Animate {
            target_fps: args.fps.filter(|fps| *fps > 0.0),
        }
    };

    Ok(RendererConfig {
        surface_size: args.size.unwrap_or(defaults.surface_size),
        mode: if args.fullscreen {
            RenderMode::Fullscreen
        } else {
            RenderMode::Windowed
        },
        surface,
        params: file.wave,
        policy,
        pointer: args.pointer.unwrap_or_default(),
        title: defaults.title,
    })
}

/// Flags that have no effect under the policy the other flags select.
fn ignored_flags(args: &RunArgs) -> Vec<(&'static str, &'static str)> {
    let single_frame = args.still || args.still_export.is_some();
    let mut ignored = Vec::new();
    if single_frame && args.fps.is_some() {
        ignored.push(("--fps", "with --still or --still-export"));
    }
    if !single_frame && args.still_time.is_some() {
        ignored.push(("--still-time", "without --still or --still-export"));
    }
    ignored
}

/// Prints the table the material is created with, before any frame runs.
pub fn print_uniforms(args: &RunArgs, json: bool) -> Result<()> {
    let file = FileConfig::load(args.config.as_deref())?;
    let table = file.wave.uniform_table();
    if json {
        let text = serde_json::to_string_pretty(&table).context("failed to encode uniforms")?;
        println!("{text}");
        return Ok(());
    }

    for (name, value) in table.iter() {
        println!(
            "{name:<14} {kind:<8} {value}",
            kind = value.kind().to_string(),
            value = format_value(value)
        );
    }
    Ok(())
}

fn format_value(value: &UniformValue) -> String {
    match value {
        UniformValue::Float(v) => format!("{v}"),
        UniformValue::Int(v) => format!("{v}"),
        UniformValue::Vec2(v) => format!("{v:?}"),
        UniformValue::Vec4(v) => format!("{v:?}"),
        UniformValue::Vec3Array4(v) => format!("{v:?}"),
    }
}
