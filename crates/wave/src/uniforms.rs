//! Typed uniform table owned by the wave material.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Uniform names understood by the wave fragment program.
pub mod names {
    pub const RESOLUTION: &str = "u_resolution";
    pub const MOUSE: &str = "u_mouse";
    pub const TIME: &str = "u_time";
    pub const COLORS: &str = "u_colors";
    pub const BACKGROUND: &str = "u_background";
    pub const SCALE: &str = "u_scale";
    pub const WAVES: &str = "u_waves";
    pub const THICKNESS: &str = "u_thickness";
    pub const STRETCH_X: &str = "u_stretch_x";
    pub const STRETCH_Y: &str = "u_stretch_y";
    pub const BLUR: &str = "u_blur";
    pub const SPEED: &str = "u_speed";
    pub const COIL: &str = "u_coil";

    /// Every uniform the program declares, in declaration order.
    pub const ALL: [&str; 13] = [
        RESOLUTION, MOUSE, TIME, COLORS, BACKGROUND, SCALE, WAVES, THICKNESS, STRETCH_X,
        STRETCH_Y, BLUR, SPEED, COIL,
    ];
}

/// Typed value stored in a [`UniformTable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    #[serde(rename = "vec3[4]")]
    Vec3Array4([[f32; 3]; 4]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Vec3Array4(_) => UniformKind::Vec3Array4,
        }
    }
}

/// GLSL type of a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec4,
    Vec3Array4,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Float => f.write_str("float"),
            UniformKind::Int => f.write_str("int"),
            UniformKind::Vec2 => f.write_str("vec2"),
            UniformKind::Vec4 => f.write_str("vec4"),
            UniformKind::Vec3Array4 => f.write_str("vec3[4]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("uniform '{0}' is not declared")]
    Unknown(String),
    #[error("uniform '{name}' is declared as {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
}

/// Name → value map owned by a shader material.
///
/// Slots are fixed once declared: [`UniformTable::set`] only replaces the value
/// of an existing slot and refuses to change its type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UniformTable {
    entries: BTreeMap<String, UniformValue>,
}

impl UniformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a slot, replacing any previous declaration with the same name.
    pub fn declare(&mut self, name: impl Into<String>, value: UniformValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.get(name)
    }

    /// Writes a value into an already declared slot of the same type.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        self.check(name, value.kind())?;
        if let Some(slot) = self.entries.get_mut(name) {
            *slot = value;
        }
        Ok(())
    }

    /// Confirms that `name` is declared with the given type.
    pub fn check(&self, name: &str, kind: UniformKind) -> Result<(), UniformError> {
        let current = self
            .entries
            .get(name)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))?;
        if current.kind() != kind {
            return Err(UniformError::TypeMismatch {
                name: name.to_string(),
                expected: current.kind(),
                found: kind,
            });
        }
        Ok(())
    }

    pub fn float(&self, name: &str) -> Result<f32, UniformError> {
        match self.declared(name)? {
            UniformValue::Float(value) => Ok(*value),
            other => Err(mismatch(name, UniformKind::Float, other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i32, UniformError> {
        match self.declared(name)? {
            UniformValue::Int(value) => Ok(*value),
            other => Err(mismatch(name, UniformKind::Int, other)),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<[f32; 2], UniformError> {
        match self.declared(name)? {
            UniformValue::Vec2(value) => Ok(*value),
            other => Err(mismatch(name, UniformKind::Vec2, other)),
        }
    }

    pub fn vec4(&self, name: &str) -> Result<[f32; 4], UniformError> {
        match self.declared(name)? {
            UniformValue::Vec4(value) => Ok(*value),
            other => Err(mismatch(name, UniformKind::Vec4, other)),
        }
    }

    pub fn vec3_array4(&self, name: &str) -> Result<[[f32; 3]; 4], UniformError> {
        match self.declared(name)? {
            UniformValue::Vec3Array4(value) => Ok(*value),
            other => Err(mismatch(name, UniformKind::Vec3Array4, other)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn declared(&self, name: &str) -> Result<&UniformValue, UniformError> {
        self.entries
            .get(name)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))
    }
}

fn mismatch(name: &str, expected: UniformKind, found: &UniformValue) -> UniformError {
    UniformError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_value_of_declared_slot() {
        let mut table = UniformTable::new();
        table.declare(names::TIME, UniformValue::Float(0.0));
        table.set(names::TIME, UniformValue::Float(2.5)).unwrap();
        assert_eq!(table.float(names::TIME).unwrap(), 2.5);
    }

    #[test]
    fn set_rejects_undeclared_names() {
        let mut table = UniformTable::new();
        let err = table
            .set("u_missing", UniformValue::Float(1.0))
            .unwrap_err();
        assert_eq!(err, UniformError::Unknown("u_missing".into()));
        assert!(table.is_empty());
    }

    #[test]
    fn set_refuses_to_change_slot_type() {
        let mut table = UniformTable::new();
        table.declare(names::WAVES, UniformValue::Int(8));
        let err = table.set(names::WAVES, UniformValue::Float(8.0)).unwrap_err();
        assert!(matches!(
            err,
            UniformError::TypeMismatch {
                expected: UniformKind::Int,
                found: UniformKind::Float,
                ..
            }
        ));
        assert_eq!(table.int(names::WAVES).unwrap(), 8);
    }

    #[test]
    fn typed_getters_check_kind() {
        let mut table = UniformTable::new();
        table.declare(names::MOUSE, UniformValue::Vec2([0.25, 0.75]));
        assert_eq!(table.vec2(names::MOUSE).unwrap(), [0.25, 0.75]);
        assert_eq!(
            table.float(names::MOUSE).unwrap_err(),
            UniformError::TypeMismatch {
                name: names::MOUSE.into(),
                expected: UniformKind::Float,
                found: UniformKind::Vec2,
            }
        );
        assert_eq!(
            table.vec4(names::BACKGROUND).unwrap_err(),
            UniformError::Unknown(names::BACKGROUND.into())
        );
    }

    #[test]
    fn kind_display_matches_glsl_spelling() {
        assert_eq!(UniformKind::Vec3Array4.to_string(), "vec3[4]");
        assert_eq!(UniformKind::Int.to_string(), "int");
    }
}
