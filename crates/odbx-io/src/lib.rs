//! I/O for the odbx result exporter.
//!
//! This crate provides:
//! - **Result database** loading (JSON rendition of the result object model)
//! - **CSV tables** for nodes, elements, element-averaged stress and boundary nodes
//! - **`%g` number formatting** matching the C/Python conventions of the tables
//! - **Legacy VTK export** of the written sub-mesh for ParaView
//! - The **error taxonomy** shared by every export stage

pub mod csv_writer;
pub mod database;
pub mod error;
pub mod format;
pub mod vtk_writer;

pub use csv_writer::{
    CsvTables, ELEMENTS_HEADER, NODES_HEADER, OutputPaths, STRESS_HEADER, TableCounts,
    table_suffix,
};
pub use database::{open_database, save_database};
pub use error::{ExportError, Result};
pub use format::{format_full, format_g};
pub use vtk_writer::VtkWriter;
