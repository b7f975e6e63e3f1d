//! Result database object model: steps, frames and field outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::mesh::Instance;

/// Field output name of the stress tensor
pub const STRESS_FIELD: &str = "S";
/// Field output name of the element status (element deletion) flag
pub const STATUS_FIELD: &str = "STATUS";

/// Location within an element where a field value was sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    IntegrationPoint,
    ElementNodal,
    Centroid,
    Nodal,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::IntegrationPoint => "INTEGRATION_POINT",
            Position::ElementNodal => "ELEMENT_NODAL",
            Position::Centroid => "CENTROID",
            Position::Nodal => "NODAL",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sampled value of a field output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    /// Name of the owning instance
    pub instance: String,
    /// Owning element, absent for purely nodal fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_label: Option<i32>,
    /// Node the value belongs to, for nodal and element-nodal positions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_label: Option<i32>,
    pub position: Position,
    /// Component values; for stress `S11, S22, S33, S12, S13, S23`
    pub data: Vec<f64>,
    /// Precomputed von Mises invariant. Missing or non-numeric entries decode as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub mises: Option<f64>,
}

/// A named field output of one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldOutput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub component_labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

impl FieldOutput {
    /// Values sampled at `position`
    pub fn values_at(&self, position: Position) -> impl Iterator<Item = &FieldValue> {
        self.values.iter().filter(move |v| v.position == position)
    }

    pub fn has_position(&self, position: Position) -> bool {
        self.values.iter().any(|v| v.position == position)
    }

    /// Values belonging to one instance
    pub fn values_for<'a>(&'a self, instance: &'a str) -> impl Iterator<Item = &'a FieldValue> {
        self.values.iter().filter(move |v| v.instance == instance)
    }
}

/// One output frame (increment) of a step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub frame_id: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub field_outputs: BTreeMap<String, FieldOutput>,
}

impl Frame {
    pub fn field(&self, name: &str) -> Option<&FieldOutput> {
        self.field_outputs.get(name)
    }
}

/// An analysis step with its ordered frames
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

impl Step {
    /// Resolve a frame index; any negative index selects the last frame.
    pub fn frame(&self, index: i64) -> Option<&Frame> {
        if index < 0 {
            return self.frames.last();
        }
        usize::try_from(index).ok().and_then(|i| self.frames.get(i))
    }
}

/// Read-only view of a complete result database
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultDatabase {
    /// Part instances of the root assembly, in database order
    #[serde(default)]
    pub instances: Vec<Instance>,
    /// Analysis steps, in database order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ResultDatabase {
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientScalar {
    Number(f64),
    Other(IgnoredAny),
}

fn lenient_scalar<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientScalar::deserialize(deserializer)? {
        LenientScalar::Number(value) if value.is_finite() => Some(value),
        _ => None,
    })
}
