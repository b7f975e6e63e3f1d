//! Legacy VTK writer for the exported sub-mesh
//!
//! Writes the nodes and elements of every exported instance as one ASCII
//! `UNSTRUCTURED_GRID`, with the element-averaged von Mises stress attached
//! as a cell scalar so the export can be inspected in ParaView directly.
//!
//! Node labels are only unique within an instance, so points are keyed by
//! `(instance, label)` and renumbered to consecutive zero-based indices.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use odbx_io::VtkWriter;
//! use odbx_model::{Element, Node};
//!
//! let nodes = vec![Node::new(1, 0.0, 0.0, 0.0)];
//! let elements: Vec<Element> = Vec::new();
//! let mut writer = VtkWriter::new();
//! writer.add_instance("PART-1-1", nodes.iter(), elements.iter(), &BTreeMap::new());
//! writer.write("mesh.vtk")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use odbx_model::{Element, ElementShape, Node};
use tracing::{info, warn};

use crate::error::{ExportError, Result};

/// VTK element type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VtkCellType {
    Empty = 0,
    Vertex = 1,
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
}

struct Cell {
    cell_type: VtkCellType,
    points: Vec<usize>,
    mises: Option<f64>,
}

/// Accumulates instances and writes them as one legacy VTK file
#[derive(Default)]
pub struct VtkWriter {
    points: Vec<[f64; 3]>,
    point_index: HashMap<(String, i32), usize>,
    cells: Vec<Cell>,
}

impl VtkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one instance's nodes and elements.
    ///
    /// An element referencing a node not passed in `nodes` is written as an
    /// empty cell, so cell data stays aligned with the elements.
    pub fn add_instance<'a>(
        &mut self,
        instance: &str,
        nodes: impl IntoIterator<Item = &'a Node>,
        elements: impl IntoIterator<Item = &'a Element>,
        mises: &BTreeMap<i32, f64>,
    ) {
        for node in nodes {
            let key = (instance.to_string(), node.label);
            if self.point_index.contains_key(&key) {
                continue;
            }
            self.point_index.insert(key, self.points.len());
            self.points.push(node.coordinates);
        }

        for element in elements {
            let points: Option<Vec<usize>> = element
                .connectivity
                .iter()
                .map(|&label| {
                    self.point_index
                        .get(&(instance.to_string(), label))
                        .copied()
                })
                .collect();
            let (cell_type, points) = match points {
                Some(points) => (vtk_cell_type(element), points),
                None => {
                    warn!(
                        "element {} of {} references nodes outside the export; writing an empty cell",
                        element.label, instance
                    );
                    (VtkCellType::Empty, Vec::new())
                }
            };
            self.cells.push(Cell {
                cell_type,
                points,
                mises: mises.get(&element.label).copied(),
            });
        }
    }

    /// Write the accumulated grid.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ExportError::write(path, source))?;
        let mut out = BufWriter::new(file);

        self.write_body(&mut out)
            .and_then(|()| out.flush())
            .map_err(|source| ExportError::write(path, source))?;

        info!(
            "Wrote {} with {} points and {} cells",
            path.display(),
            self.points.len(),
            self.cells.len()
        );
        Ok(())
    }

    fn write_body(&self, out: &mut impl Write) -> std::io::Result<()> {
        self.write_header(out)?;
        self.write_points(out)?;
        self.write_cells(out)?;
        self.write_cell_data(out)
    }

    fn write_header(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "# vtk DataFile Version 3.0")?;
        writeln!(out, "odbx export")?;
        writeln!(out, "ASCII")?;
        writeln!(out, "DATASET UNSTRUCTURED_GRID")?;
        Ok(())
    }

    fn write_points(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "POINTS {} double", self.points.len())?;
        for [x, y, z] in &self.points {
            writeln!(out, "{x} {y} {z}")?;
        }
        Ok(())
    }

    fn write_cells(&self, out: &mut impl Write) -> std::io::Result<()> {
        let total_size: usize = self.cells.iter().map(|c| 1 + c.points.len()).sum();
        writeln!(out, "CELLS {} {}", self.cells.len(), total_size)?;
        for cell in &self.cells {
            write!(out, "{}", cell.points.len())?;
            for idx in &cell.points {
                write!(out, " {idx}")?;
            }
            writeln!(out)?;
        }

        writeln!(out, "CELL_TYPES {}", self.cells.len())?;
        for cell in &self.cells {
            writeln!(out, "{}", cell.cell_type as i32)?;
        }
        Ok(())
    }

    fn write_cell_data(&self, out: &mut impl Write) -> std::io::Result<()> {
        if self.cells.is_empty() {
            return Ok(());
        }
        writeln!(out, "CELL_DATA {}", self.cells.len())?;
        writeln!(out, "SCALARS von_mises double 1")?;
        writeln!(out, "LOOKUP_TABLE default")?;
        for cell in &self.cells {
            match cell.mises {
                Some(value) => writeln!(out, "{value}")?,
                None => writeln!(out, "nan")?,
            }
        }
        Ok(())
    }
}

fn vtk_cell_type(element: &Element) -> VtkCellType {
    match element.shape() {
        ElementShape::Tet4 => return VtkCellType::Tetra,
        ElementShape::Hex8 => return VtkCellType::Hexahedron,
        ElementShape::Other => {}
    }

    // Fall back to the node count for shapes without a face table
    match element.connectivity.len() {
        1 => VtkCellType::Vertex,
        2 => VtkCellType::Line,
        3 => VtkCellType::Triangle,
        4 if element.element_type.to_ascii_uppercase().starts_with('S') => VtkCellType::Quad,
        4 => VtkCellType::Tetra,
        5 => VtkCellType::Pyramid,
        6 => VtkCellType::Wedge,
        8 => VtkCellType::Hexahedron,
        10 => VtkCellType::QuadraticTetra,
        20 => VtkCellType::QuadraticHexahedron,
        _ => VtkCellType::Empty,
    }
}
