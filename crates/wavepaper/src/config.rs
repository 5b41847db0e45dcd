use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use renderer::{GpuPowerPreference, SurfaceSettings};
use serde::Deserialize;
use wave::WaveParams;

use crate::cli::parse_antialias;

/// Contents of the `--config` TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub wave: WaveParams,
    pub surface: SurfaceSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceSection {
    /// Same syntax as `--antialias`.
    pub antialias: Option<String>,
    pub power: Option<PowerSetting>,
    pub preserve_drawing_buffer: Option<bool>,
    pub transparent: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    High,
    Low,
}

impl From<PowerSetting> for GpuPowerPreference {
    fn from(value: PowerSetting) -> Self {
        match value {
            PowerSetting::High => GpuPowerPreference::High,
            PowerSetting::Low => GpuPowerPreference::Low,
        }
    }
}

impl FileConfig {
    /// Reads `path`, or returns the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::parse(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Surface settings with the file's overrides applied to the defaults.
    pub fn surface_settings(&self) -> Result<SurfaceSettings> {
        let mut settings = SurfaceSettings::default();
        let section = &self.surface;
        if let Some(mode) = section.antialias.as_deref() {
            settings.antialiasing =
                parse_antialias(mode).map_err(|err| anyhow!("[surface] antialias: {err}"))?;
        }
        if let Some(power) = section.power {
            settings.power = power.into();
        }
        if let Some(preserve) = section.preserve_drawing_buffer {
            settings.preserve_drawing_buffer = preserve;
        }
        if let Some(transparent) = section.transparent {
            settings.transparent = transparent;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::Antialiasing;

    #[test]
    fn empty_file_yields_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config.wave, WaveParams::default());
        assert_eq!(
            config.surface_settings().unwrap(),
            SurfaceSettings::default()
        );
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = FileConfig::parse(
            r#"
            [wave]
            waves = 3
            speed = 0.5

            [surface]
            antialias = "off"
            power = "low"
            transparent = false
            "#,
        )
        .unwrap();
        assert_eq!(config.wave.waves, 3);
        assert_eq!(config.wave.speed, 0.5);
        assert_eq!(config.wave.coil, WaveParams::default().coil);

        let surface = config.surface_settings().unwrap();
        assert_eq!(surface.antialiasing, Antialiasing::Off);
        assert_eq!(surface.power, GpuPowerPreference::Low);
        assert!(!surface.transparent);
        assert!(surface.preserve_drawing_buffer);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[wave]\nwaviness = 2").is_err());
        assert!(FileConfig::parse("[display]\nsize = 3").is_err());
        assert!(FileConfig::parse("[surface]\npower = \"turbo\"").is_err());
    }

    #[test]
    fn invalid_antialias_is_reported_with_section() {
        let config = FileConfig::parse("[surface]\nantialias = \"3\"").unwrap();
        let err = config.surface_settings().unwrap_err();
        assert!(err.to_string().contains("[surface] antialias"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(FileConfig::load(Some(&missing)).is_err());
        assert!(FileConfig::load(None).is_ok());
    }
}
