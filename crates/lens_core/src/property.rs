//! Typed metadata attached to documents and scene nodes.
//!
//! Values are decoded from the document's XML property blocks; only the
//! types a viewer can display are kept.

use std::fmt;

use lens_math::{Quat, Vec3};
use serde::Serialize;

/// A rigid transform stored as axis-angle rotation plus translation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    /// Rotation axis (not necessarily normalized)
    pub axis: Vec3,

    /// Rotation angle in radians
    pub angle: f32,

    /// Translation vector
    pub translation: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            axis: Vec3::Z,
            angle: 0.0,
            translation: Vec3::ZERO,
        }
    }
}

impl Placement {
    /// Rotation part as a quaternion. A zero-length axis yields identity.
    pub fn rotation(&self) -> Quat {
        match self.axis.try_normalize() {
            Some(axis) => Quat::from_axis_angle(axis, self.angle),
            None => Quat::IDENTITY,
        }
    }
}

/// The value half of a property.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    /// Angle in degrees at the stored precision. Fractional degrees are
    /// kept, not truncated to whole degrees.
    Angle(f64),
    Placement(Placement),
}

impl PropertyValue {
    /// Numeric view of the value, for sizes and counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(v) => Some(*v as f64),
            PropertyValue::Number(v) | PropertyValue::Angle(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_placement(&self) -> Option<&Placement> {
        match self {
            PropertyValue::Placement(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Boolean(v) => write!(f, "{v}"),
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Number(v) => write!(f, "{v}"),
            PropertyValue::Text(v) => f.write_str(v),
            PropertyValue::Angle(v) => write!(f, "{v}°"),
            PropertyValue::Placement(p) => write!(
                f,
                "axis ({}, {}, {}) angle {} at ({}, {}, {})",
                p.axis.x, p.axis.y, p.axis.z, p.angle, p.translation.x, p.translation.y, p.translation.z
            ),
        }
    }
}

/// A named, typed property.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    #[serde(flatten)]
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An ordered collection of properties.
///
/// Insertion order is the document's order; duplicate names are kept and
/// lookups return the first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PropertyGroup {
    pub name: String,
    pub properties: Vec<Property>,
}

impl PropertyGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// First Placement-valued property with this name.
    pub fn placement(&self, name: &str) -> Option<&Placement> {
        self.get(name).and_then(PropertyValue::as_placement)
    }

    /// Numeric property, 0 when absent or non-numeric.
    pub fn number_or_zero(&self, name: &str) -> f64 {
        self.get(name).and_then(PropertyValue::as_f64).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }
}
