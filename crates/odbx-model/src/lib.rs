//! In-memory records of a finite-element result database.
//!
//! Everything here is plain data: instances with their nodes, elements and
//! node sets, and the step/frame/field-output tree of the analysis results.

pub mod mesh;
pub mod results;
pub mod stress;

pub use mesh::{Element, ElementShape, Instance, Node};
pub use results::{
    FieldOutput, FieldValue, Frame, Position, ResultDatabase, STATUS_FIELD, STRESS_FIELD, Step,
};
pub use stress::{ElementStress, StressTensor};
