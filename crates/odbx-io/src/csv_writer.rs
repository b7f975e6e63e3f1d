//! CSV table writers.
//!
//! Every table starts with a header row and carries the instance name as its
//! first column. The four tables of one export are owned by a single
//! [`CsvTables`] value: handles are released when it is dropped, whichever
//! way the export ends, and [`CsvTables::finish`] flushes them on success so
//! late write errors are reported instead of lost.

use std::borrow::Cow;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use odbx_model::{Element, ElementStress, Node};
use tracing::info;

use crate::error::{ExportError, Result};
use crate::format::{format_full, format_g};

pub const NODES_HEADER: &str = "instance,node_id,x,y,z";
pub const ELEMENTS_HEADER: &str = "instance,element_id,node_ids";
pub const STRESS_HEADER: &str = "instance,element_id,MISES,S11,S22,S33,S12,S13,S23";

/// Significant digits of the stress table
const STRESS_DIGITS: usize = 6;

/// Filename suffix encoding the step name and frame (`_<step>_<frame>`).
///
/// A negative frame index is written as the literal `last`. Characters that
/// are awkward in file names are replaced by `_`.
pub fn table_suffix(step_name: &str, frame_index: i64) -> String {
    let step: String = step_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let frame = if frame_index < 0 {
        "last".to_string()
    } else {
        frame_index.to_string()
    };
    format!("_{step}_{frame}")
}

/// Paths of every file an export may produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub nodes: PathBuf,
    pub elements: PathBuf,
    pub stress: PathBuf,
    pub boundary_nodes: PathBuf,
    pub vtk: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: impl AsRef<Path>, suffix: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            nodes: dir.join(format!("nodes{suffix}.csv")),
            elements: dir.join(format!("elements{suffix}.csv")),
            stress: dir.join(format!("stress{suffix}.csv")),
            boundary_nodes: dir.join(format!("boundary_nodes{suffix}.csv")),
            vtk: dir.join(format!("mesh{suffix}.vtk")),
        }
    }

    /// The four CSV tables, in the order they are reported
    pub fn tables(&self) -> [&Path; 4] {
        [
            &self.nodes,
            &self.elements,
            &self.stress,
            &self.boundary_nodes,
        ]
    }
}

/// Number of data rows written to each table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub nodes: usize,
    pub elements: usize,
    pub stress: usize,
    pub boundary_nodes: usize,
}

struct TableWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows: usize,
}

impl TableWriter {
    fn create(path: &Path, header: &str) -> Result<Self> {
        let file = File::create(path).map_err(|source| ExportError::write(path, source))?;
        let mut table = Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            rows: 0,
        };
        table.line(format_args!("{header}"))?;
        Ok(table)
    }

    fn line(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        writeln!(self.out, "{args}").map_err(|source| ExportError::write(&self.path, source))
    }

    fn row(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.line(args)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<usize> {
        self.out
            .flush()
            .map_err(|source| ExportError::write(&self.path, source))?;
        Ok(self.rows)
    }
}

/// The open nodes, elements, stress and boundary-node tables of one export
pub struct CsvTables {
    nodes: TableWriter,
    elements: TableWriter,
    stress: TableWriter,
    boundary_nodes: TableWriter,
}

impl CsvTables {
    /// Create (or truncate) all four tables and write their headers.
    pub fn create(paths: &OutputPaths) -> Result<Self> {
        if let Some(parent) = paths.nodes.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ExportError::write(parent, source))?;
        }

        Ok(Self {
            nodes: TableWriter::create(&paths.nodes, NODES_HEADER)?,
            elements: TableWriter::create(&paths.elements, ELEMENTS_HEADER)?,
            stress: TableWriter::create(&paths.stress, STRESS_HEADER)?,
            boundary_nodes: TableWriter::create(&paths.boundary_nodes, NODES_HEADER)?,
        })
    }

    pub fn write_node(&mut self, instance: &str, node: &Node) -> Result<()> {
        write_node_row(&mut self.nodes, instance, node)
    }

    pub fn write_element(&mut self, instance: &str, element: &Element) -> Result<()> {
        let node_ids = element
            .connectivity
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.elements.row(format_args!(
            "{},{},{}",
            csv_field(instance),
            element.label,
            node_ids
        ))
    }

    pub fn write_stress(&mut self, instance: &str, stress: &ElementStress) -> Result<()> {
        let t = &stress.tensor;
        let g = |v: f64| format_g(v, STRESS_DIGITS);
        self.stress.row(format_args!(
            "{},{},{},{},{},{},{},{},{}",
            csv_field(instance),
            stress.element_label,
            g(stress.mises),
            g(t.s11),
            g(t.s22),
            g(t.s33),
            g(t.s12),
            g(t.s13),
            g(t.s23)
        ))
    }

    pub fn write_boundary_node(&mut self, instance: &str, node: &Node) -> Result<()> {
        write_node_row(&mut self.boundary_nodes, instance, node)
    }

    /// Flush every table and report the row counts.
    pub fn finish(self) -> Result<TableCounts> {
        let counts = TableCounts {
            nodes: self.nodes.finish()?,
            elements: self.elements.finish()?,
            stress: self.stress.finish()?,
            boundary_nodes: self.boundary_nodes.finish()?,
        };
        info!(
            "wrote {} node, {} element, {} stress and {} boundary node row(s)",
            counts.nodes, counts.elements, counts.stress, counts.boundary_nodes
        );
        Ok(counts)
    }
}

fn write_node_row(table: &mut TableWriter, instance: &str, node: &Node) -> Result<()> {
    let [x, y, z] = node.coordinates;
    table.row(format_args!(
        "{},{},{},{},{}",
        csv_field(instance),
        node.label,
        format_full(x),
        format_full(y),
        format_full(z)
    ))
}

/// Quote a text field only when it would otherwise break the row.
fn csv_field(text: &str) -> Cow<'_, str> {
    if text.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}
