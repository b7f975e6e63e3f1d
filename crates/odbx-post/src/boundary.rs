//! Boundary-face classification of an active sub-mesh.
//!
//! Every face of every active element is keyed by its sorted node labels and
//! counted. A face seen exactly once belongs to a single active element and
//! is therefore exposed; its nodes are boundary nodes. Counting is
//! commutative, so the result does not depend on the order elements are
//! visited in.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use odbx_model::Element;

use crate::faces::{canonical_face, element_faces};

/// Label-based access to elements
pub trait ElementLookup {
    fn element(&self, label: i32) -> Option<&Element>;
}

impl ElementLookup for BTreeMap<i32, Element> {
    fn element(&self, label: i32) -> Option<&Element> {
        self.get(&label)
    }
}

impl ElementLookup for HashMap<i32, Element> {
    fn element(&self, label: i32) -> Option<&Element> {
        self.get(&label)
    }
}

/// Count how many active elements share each canonical face.
///
/// Active labels missing from `elements` are skipped; repeated labels are
/// counted once.
pub fn face_counts<L, I>(active_elements: I, elements: &L) -> HashMap<Vec<i32>, usize>
where
    L: ElementLookup + ?Sized,
    I: IntoIterator<Item = i32>,
{
    let active: BTreeSet<i32> = active_elements.into_iter().collect();
    let mut counts = HashMap::<Vec<i32>, usize>::new();

    for label in active {
        let Some(element) = elements.element(label) else {
            continue;
        };
        for face in element_faces(element) {
            *counts.entry(canonical_face(&face)).or_insert(0) += 1;
        }
    }

    counts
}

/// Canonical faces owned by exactly one active element
pub fn boundary_faces<L, I>(active_elements: I, elements: &L) -> BTreeSet<Vec<i32>>
where
    L: ElementLookup + ?Sized,
    I: IntoIterator<Item = i32>,
{
    face_counts(active_elements, elements)
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(face, _)| face)
        .collect()
}

/// Nodes on faces owned by exactly one active element, restricted to `active_nodes`.
pub fn boundary_nodes<L, I>(
    active_elements: I,
    elements: &L,
    active_nodes: &BTreeSet<i32>,
) -> BTreeSet<i32>
where
    L: ElementLookup + ?Sized,
    I: IntoIterator<Item = i32>,
{
    boundary_faces(active_elements, elements)
        .into_iter()
        .flatten()
        .filter(|node| active_nodes.contains(node))
        .collect()
}
