//! Mesh records of one part instance.
//!
//! Nodes, elements and node sets are read once from the result database and
//! never mutated afterwards; every collection is keyed by label so lookups and
//! iteration order are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node of a part instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node label (1-based in the source database)
    pub label: i32,
    /// Undeformed coordinates
    pub coordinates: [f64; 3],
}

impl Node {
    pub fn new(label: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            label,
            coordinates: [x, y, z],
        }
    }
}

/// Topology family relevant to boundary extraction.
///
/// Only linear tetrahedra and hexahedra have face tables; everything else is
/// carried through the export untouched but contributes no faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementShape {
    /// 4-node tetrahedron (C3D4 family)
    Tet4,
    /// 8-node hexahedron (C3D8 family)
    Hex8,
    /// Any other element, or a tag whose connectivity length does not match
    Other,
}

impl ElementShape {
    /// Number of corner nodes for supported shapes
    pub fn num_nodes(self) -> Option<usize> {
        match self {
            ElementShape::Tet4 => Some(4),
            ElementShape::Hex8 => Some(8),
            ElementShape::Other => None,
        }
    }

    /// Classify an element type tag, checking it against the connectivity length.
    ///
    /// Accepts the `C3D4*`/`C3D8*` solid families (including reduced, hybrid and
    /// incompatible-mode variants such as `C3D8R` or `C3D4H`), their heat
    /// transfer counterparts `DC3D4`/`DC3D8`, and the short aliases `tet`,
    /// `tet4`, `hex` and `hex8`.
    pub fn from_type_tag(type_tag: &str, num_nodes: usize) -> Self {
        let tag = type_tag.trim().to_ascii_uppercase();
        let family = match tag.as_str() {
            "TET" | "TET4" => ElementShape::Tet4,
            "HEX" | "HEX8" => ElementShape::Hex8,
            _ => solid_family(&tag),
        };

        match family.num_nodes() {
            Some(expected) if expected == num_nodes => family,
            _ => ElementShape::Other,
        }
    }
}

fn solid_family(tag: &str) -> ElementShape {
    let Some(rest) = tag
        .strip_prefix("C3D")
        .or_else(|| tag.strip_prefix("DC3D"))
    else {
        return ElementShape::Other;
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.as_str() {
        "4" => ElementShape::Tet4,
        "8" => ElementShape::Hex8,
        _ => ElementShape::Other,
    }
}

/// An element of a part instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Element label
    pub label: i32,
    /// Element type tag as stored in the database (e.g. `C3D8R`)
    #[serde(rename = "type")]
    pub element_type: String,
    /// Node labels in the element's canonical ordering
    pub connectivity: Vec<i32>,
}

impl Element {
    pub fn new(label: i32, element_type: impl Into<String>, connectivity: Vec<i32>) -> Self {
        Self {
            label,
            element_type: element_type.into(),
            connectivity,
        }
    }

    pub fn shape(&self) -> ElementShape {
        ElementShape::from_type_tag(&self.element_type, self.connectivity.len())
    }
}

/// One named part occurrence in the assembly
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name, written as the first column of every table
    pub name: String,
    /// Nodes by label
    #[serde(default, with = "labelled")]
    pub nodes: BTreeMap<i32, Node>,
    /// Elements by label
    #[serde(default, with = "labelled")]
    pub elements: BTreeMap<i32, Element>,
    /// Instance-scoped node sets by name
    #[serde(default)]
    pub node_sets: BTreeMap<String, Vec<i32>>,
}

impl Instance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.label, node);
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.insert(element.label, element);
    }

    pub fn add_node_set(&mut self, name: impl Into<String>, nodes: Vec<i32>) {
        self.node_sets.insert(name.into(), nodes);
    }

    /// Look up a node set by name.
    ///
    /// Set names are stored upper-case by most pre-processors, so an exact
    /// match is tried first and a case-insensitive match second.
    pub fn node_set(&self, name: &str) -> Option<&[i32]> {
        if let Some(nodes) = self.node_sets.get(name) {
            return Some(nodes);
        }
        self.node_sets
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, nodes)| nodes.as_slice())
    }
}

/// Records stored as a JSON array but held as a label-keyed map.
pub(crate) trait Labelled {
    fn label(&self) -> i32;
}

impl Labelled for Node {
    fn label(&self) -> i32 {
        self.label
    }
}

impl Labelled for Element {
    fn label(&self) -> i32 {
        self.label
    }
}

mod labelled {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Labelled;

    pub fn serialize<S, T>(map: &BTreeMap<i32, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<i32, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Labelled,
    {
        let records = Vec::<T>::deserialize(deserializer)?;
        Ok(records.into_iter().map(|r| (r.label(), r)).collect())
    }
}
