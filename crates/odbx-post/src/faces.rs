//! Face tables of linear solid elements.
//!
//! Local node numbering follows the usual solid-element convention: for a
//! hexahedron nodes 0-3 form one cap, 4-7 the opposite cap, and node `i` is
//! edge-connected to node `i + 4`.

use odbx_model::{Element, ElementShape};

/// Triangles of a 4-node tetrahedron, each omitting one node
const TET4_FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [1, 2, 3], [0, 2, 3]];

/// Quadrilaterals of an 8-node hexahedron: two caps, then four sides
const HEX8_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

/// Faces of an element given its connectivity and type tag.
///
/// Node labels are returned in the element's local face ordering. Unsupported
/// types, and connectivity lengths that do not match the type, give no faces.
pub fn faces_of(connectivity: &[i32], type_tag: &str) -> Vec<Vec<i32>> {
    let pick = |local: &[usize]| local.iter().map(|&i| connectivity[i]).collect::<Vec<_>>();

    match ElementShape::from_type_tag(type_tag, connectivity.len()) {
        ElementShape::Tet4 => TET4_FACES.iter().map(|f| pick(f)).collect(),
        ElementShape::Hex8 => HEX8_FACES.iter().map(|f| pick(f)).collect(),
        ElementShape::Other => Vec::new(),
    }
}

pub fn element_faces(element: &Element) -> Vec<Vec<i32>> {
    faces_of(&element.connectivity, &element.element_type)
}

/// Order-free key of a face: its node labels sorted ascending
pub fn canonical_face(face: &[i32]) -> Vec<i32> {
    let mut key = face.to_vec();
    key.sort_unstable();
    key
}
