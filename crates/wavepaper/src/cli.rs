use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::Antialiasing;
use wave::PointerState;

#[derive(Parser, Debug)]
#[command(
    name = "wavepaper",
    author,
    version,
    about = "Animated wave shader background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// TOML file with `[wave]` and `[surface]` sections.
    #[arg(long, env = "WAVEPAPER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial surface size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Cover the current monitor with a borderless window.
    #[arg(long)]
    pub fullscreen: bool,

    /// Optional FPS cap for the animation (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Render a single still frame instead of animating continuously.
    #[arg(long, conflicts_with = "still_export")]
    pub still: bool,

    /// Timestamp in seconds to evaluate for still/export modes.
    #[arg(long, value_name = "SECONDS")]
    pub still_time: Option<f32>,

    /// Render a still frame on the CPU, write it to the provided PNG path, then exit.
    #[arg(long, value_name = "PATH", value_parser = parse_export_path)]
    pub still_export: Option<PathBuf>,

    /// Pointer position in normalized device coordinates (`-1..1`, +y up).
    #[arg(
        long,
        value_name = "X,Y",
        value_parser = parse_pointer,
        allow_hyphen_values = true
    )]
    pub pointer: Option<PointerState>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the uniform table the material starts with.
    Uniforms(UniformsArgs),
}

#[derive(Parser, Debug)]
pub struct UniformsArgs {
    /// Emit JSON instead of an aligned table.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_pointer(value: &str) -> Result<PointerState, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| "expected X,Y".to_string())?;
    let parse_axis = |axis: &str, name: &str| -> Result<f32, String> {
        let parsed = axis
            .trim()
            .parse::<f32>()
            .map_err(|_| format!("invalid pointer {name} '{}'", axis.trim()))?;
        if !(-1.0..=1.0).contains(&parsed) {
            return Err(format!("pointer {name} must lie within -1..1"));
        }
        Ok(parsed)
    };
    Ok(PointerState::new(parse_axis(x, "x")?, parse_axis(y, "y")?))
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(path),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_variants() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias(" OFF ").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("lots").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("1920").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn parses_pointer_coordinates() {
        assert_eq!(parse_pointer("0,0").unwrap(), PointerState::new(0.0, 0.0));
        assert_eq!(
            parse_pointer("-0.5, 1").unwrap(),
            PointerState::new(-0.5, 1.0)
        );
        assert!(parse_pointer("1.5,0").is_err());
        assert!(parse_pointer("0").is_err());
    }

    #[test]
    fn export_path_must_be_png() {
        assert!(parse_export_path("frame.PNG").is_ok());
        assert!(parse_export_path("frame.jpg").is_err());
        assert!(parse_export_path("frame").is_err());
    }

    #[test]
    fn cli_accepts_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "wavepaper",
            "--size",
            "320x200",
            "--pointer=-0.25,0.75",
            "uniforms",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.run.size, Some((320, 200)));
        assert_eq!(cli.run.pointer, Some(PointerState::new(-0.25, 0.75)));
        assert!(matches!(cli.command, Some(Command::Uniforms(UniformsArgs { json: true }))));
    }

    #[test]
    fn still_and_still_export_conflict() {
        let result = Cli::try_parse_from([
            "wavepaper",
            "--still",
            "--still-export",
            "frame.png",
        ]);
        assert!(result.is_err());
    }
}
