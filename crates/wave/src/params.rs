//! Static tuning uniforms and their defaults.

use serde::{Deserialize, Serialize};

use crate::uniforms::{names, UniformTable, UniformValue};

/// Resolution the table starts with before the first frame reports a real size.
pub const INITIAL_RESOLUTION: [f32; 2] = [100.0, 100.0];

/// Static tuning uniforms of the wave program.
///
/// These are set once when the material is built and never change while the
/// scene runs. The numbers are hand-tuned for the look of the effect and have
/// no closed-form derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaveParams {
    /// Four-entry palette indexed by `wave_index % 4`.
    pub colors: [[f32; 3]; 4],
    /// Color composited behind the waves.
    pub background: [f32; 4],
    pub scale: f32,
    /// Number of wave lines; zero or negative draws only the background.
    pub waves: i32,
    pub thickness: f32,
    pub stretch_x: f32,
    pub stretch_y: f32,
    pub blur: f32,
    pub speed: f32,
    pub coil: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            colors: [
                [0.937, 0.0, 1.0],
                [0.875, 1.0, 0.0],
                [0.0, 1.0, 1.0],
                [0.467, 0.22, 1.0],
            ],
            background: [0.0078, 0.0039, 0.0588, 1.0],
            scale: 0.0,
            waves: 8,
            thickness: 0.04,
            stretch_x: 0.0,
            stretch_y: 0.677,
            blur: 0.04,
            speed: 0.196,
            coil: 6.084,
        }
    }
}

impl WaveParams {
    /// Builds the complete uniform table: the static values from `self` plus
    /// the three per-frame slots at their start-up values.
    pub fn uniform_table(&self) -> UniformTable {
        let mut table = UniformTable::new();
        table.declare(names::COLORS, UniformValue::Vec3Array4(self.colors));
        table.declare(names::BACKGROUND, UniformValue::Vec4(self.background));
        table.declare(names::SCALE, UniformValue::Float(self.scale));
        table.declare(names::WAVES, UniformValue::Int(self.waves));
        table.declare(names::THICKNESS, UniformValue::Float(self.thickness));
        table.declare(names::STRETCH_X, UniformValue::Float(self.stretch_x));
        table.declare(names::STRETCH_Y, UniformValue::Float(self.stretch_y));
        table.declare(names::BLUR, UniformValue::Float(self.blur));
        table.declare(names::SPEED, UniformValue::Float(self.speed));
        table.declare(names::COIL, UniformValue::Float(self.coil));
        table.declare(names::TIME, UniformValue::Float(0.0));
        table.declare(names::MOUSE, UniformValue::Vec2([0.0, 0.0]));
        table.declare(names::RESOLUTION, UniformValue::Vec2(INITIAL_RESOLUTION));
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_declares_every_uniform() {
        let table = WaveParams::default().uniform_table();
        assert_eq!(table.len(), names::ALL.len());
        for name in names::ALL {
            assert!(table.get(name).is_some(), "missing {name}");
        }
        assert_eq!(table.int(names::WAVES).unwrap(), 8);
        assert_eq!(table.float(names::COIL).unwrap(), 6.084);
        assert_eq!(table.vec2(names::RESOLUTION).unwrap(), [100.0, 100.0]);
        assert_eq!(table.vec2(names::MOUSE).unwrap(), [0.0, 0.0]);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let params: WaveParams = toml::from_str("waves = 3\ncoil = 2.0\n").unwrap();
        assert_eq!(params.waves, 3);
        assert_eq!(params.coil, 2.0);
        assert_eq!(params.blur, WaveParams::default().blur);
        assert_eq!(params.colors, WaveParams::default().colors);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<WaveParams, _> = toml::from_str("wavez = 3\n");
        assert!(result.is_err());
    }
}
