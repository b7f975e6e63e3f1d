//! Post-processing of finite-element results for export.
//!
//! - [`faces`]: face tables of linear tetrahedra and hexahedra
//! - [`boundary`]: face-sharing classification of the active sub-mesh
//! - [`stress`]: von Mises evaluation and per-element averaging
//! - [`activity`]: stress position choice and active element/node sets
//! - [`export`]: the database-to-CSV pipeline

pub mod activity;
pub mod boundary;
pub mod export;
pub mod faces;
pub mod stress;

pub use activity::{
    STATUS_THRESHOLD, active_elements, active_nodes, element_status, select_stress_position,
};
pub use boundary::{ElementLookup, boundary_faces, boundary_nodes, face_counts};
pub use export::{
    ExportConfig, ExportSummary, InstanceResults, InstanceSummary, analyze_instance,
    export_database, resolve_frame, run_export,
};
pub use faces::{canonical_face, element_faces, faces_of};
pub use stress::{StressAccumulator, StressSample, average_by_element, compute_mises_stress};
