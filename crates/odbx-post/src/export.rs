//! The export pipeline: database → CSV tables (and optionally VTK).
//!
//! Every lookup that can fail (step, frame, stress field, stress position,
//! instances) is resolved before any output file is created, so a failed run
//! leaves previous outputs untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use odbx_io::{
    CsvTables, ExportError, OutputPaths, Result, TableCounts, VtkWriter, open_database,
    table_suffix,
};
use odbx_model::{
    ElementStress, FieldOutput, FieldValue, Frame, Instance, Position, ResultDatabase,
    STATUS_FIELD, STRESS_FIELD,
};
use tracing::{debug, info, warn};

use crate::activity::{active_elements, active_nodes, element_status, select_stress_position};
use crate::boundary::boundary_nodes;
use crate::stress::{StressSample, average_by_element};

/// Options of one export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Result database to read
    pub database: PathBuf,
    /// Step to export
    pub step_name: String,
    /// Frame index within the step; negative selects the last frame
    pub frame: i64,
    /// Instance-scoped node set whose nodes are added to the boundary
    pub node_set: Option<String>,
    /// Directory receiving the output files
    pub output_dir: PathBuf,
    /// Append `_<step>_<frame>` to output file names
    pub suffix: bool,
    /// Restrict node, element and stress tables to the active sub-mesh
    pub active_only: bool,
    /// Also write a legacy VTK file of the exported mesh
    pub vtk: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::new(),
            step_name: "equ".to_string(),
            frame: -1,
            node_set: None,
            output_dir: PathBuf::from("."),
            suffix: false,
            active_only: false,
            vtk: false,
        }
    }
}

impl ExportConfig {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn output_paths(&self) -> OutputPaths {
        let suffix = if self.suffix {
            table_suffix(&self.step_name, self.frame)
        } else {
            String::new()
        };
        OutputPaths::new(&self.output_dir, &suffix)
    }
}

/// Derived results of one instance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceResults {
    /// Element-averaged stress of every element that reported stress
    pub stress: Vec<ElementStress>,
    pub active_elements: BTreeSet<i32>,
    pub active_nodes: BTreeSet<i32>,
    /// Classified boundary nodes plus any requested node-set nodes
    pub boundary_nodes: BTreeSet<i32>,
}

/// Per-instance part of an export summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSummary {
    pub name: String,
    pub stress_elements: usize,
    pub active_elements: usize,
    pub boundary_nodes: usize,
}

/// What an export run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub paths: OutputPaths,
    pub counts: TableCounts,
    pub stress_position: Position,
    pub instances: Vec<InstanceSummary>,
    /// Path of the VTK file, when one was written
    pub vtk: Option<PathBuf>,
}

/// Open the configured database and export it.
pub fn run_export(config: &ExportConfig) -> Result<ExportSummary> {
    let db = open_database(&config.database)?;
    export_database(&db, config)
}

/// Resolve a step by name and a frame by index (negative selects the last frame).
pub fn resolve_frame<'a>(db: &'a ResultDatabase, step_name: &str, index: i64) -> Result<&'a Frame> {
    let step = db
        .step(step_name)
        .ok_or_else(|| ExportError::StepNotFound {
            name: step_name.to_string(),
            available: db.step_names(),
        })?;

    if step.frames.is_empty() {
        return Err(ExportError::NoFrames {
            step: step.name.clone(),
        });
    }

    step.frame(index).ok_or_else(|| ExportError::FrameOutOfRange {
        step: step.name.clone(),
        index,
        count: step.frames.len(),
    })
}

/// Export an already opened database.
pub fn export_database(db: &ResultDatabase, config: &ExportConfig) -> Result<ExportSummary> {
    let frame = resolve_frame(db, &config.step_name, config.frame)?;
    debug!(
        "using frame {} of step '{}' ({})",
        frame.frame_id, config.step_name, frame.description
    );

    let stress = frame
        .field(STRESS_FIELD)
        .ok_or_else(|| ExportError::MissingField {
            field: STRESS_FIELD.to_string(),
            step: config.step_name.clone(),
            frame: frame.frame_id,
        })?;
    let position = select_stress_position(stress).ok_or_else(|| ExportError::NoSupportedPosition {
        field: STRESS_FIELD.to_string(),
    })?;
    info!("Stress position used: {position}");

    let status = frame.field(STATUS_FIELD);
    if status.is_none() {
        info!("no {STATUS_FIELD} field in frame; every element with stress is active");
    }

    if db.instances.is_empty() {
        return Err(ExportError::NoInstances);
    }

    let stress_by_instance = group_by_instance(stress, position, db);

    let paths = config.output_paths();
    let mut tables = CsvTables::create(&paths)?;
    let mut vtk = config.vtk.then(VtkWriter::new);
    let mut summaries = Vec::with_capacity(db.instances.len());

    for inst in &db.instances {
        let values = stress_by_instance
            .get(inst.name.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let results = analyze_instance(inst, values, status, config.node_set.as_deref());
        write_instance(&mut tables, vtk.as_mut(), inst, &results, config.active_only)?;

        summaries.push(InstanceSummary {
            name: inst.name.clone(),
            stress_elements: results.stress.len(),
            active_elements: results.active_elements.len(),
            boundary_nodes: results.boundary_nodes.len(),
        });
    }

    let counts = tables.finish()?;
    let vtk_path = match vtk {
        Some(writer) => {
            writer.write(&paths.vtk)?;
            Some(paths.vtk.clone())
        }
        None => None,
    };

    info!(
        "Done. Wrote {}",
        paths
            .tables()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(ExportSummary {
        paths,
        counts,
        stress_position: position,
        instances: summaries,
        vtk: vtk_path,
    })
}

/// Derive stress rows, the active sub-mesh and its boundary for one instance.
///
/// `stress_values` are the instance's stress values at the selected position.
pub fn analyze_instance(
    instance: &Instance,
    stress_values: &[&FieldValue],
    status: Option<&FieldOutput>,
    node_set: Option<&str>,
) -> InstanceResults {
    let mut skipped = 0usize;
    let samples: Vec<StressSample> = stress_values
        .iter()
        .filter_map(|value| {
            let sample = StressSample::from_field_value(value);
            if sample.is_none() {
                skipped += 1;
            }
            sample
        })
        .collect();
    if skipped > 0 {
        warn!(
            "{}: skipped {} malformed stress value(s)",
            instance.name, skipped
        );
    }

    let stress = average_by_element(samples);

    let status = status.map(|field| element_status(field, &instance.name));
    if status.as_ref().is_some_and(BTreeMap::is_empty) {
        debug!(
            "{}: no {STATUS_FIELD} values; every element with stress is active",
            instance.name
        );
    }
    let active = active_elements(stress.iter().map(|row| row.element_label), status.as_ref());
    let nodes = active_nodes(instance, &active);

    let mut boundary = boundary_nodes(active.iter().copied(), &instance.elements, &nodes);
    if let Some(set_name) = node_set {
        match instance.node_set(set_name) {
            Some(labels) => {
                let before = boundary.len();
                boundary.extend(
                    labels
                        .iter()
                        .copied()
                        .filter(|label| instance.nodes.contains_key(label)),
                );
                debug!(
                    "{}: node set {} added {} boundary node(s)",
                    instance.name,
                    set_name,
                    boundary.len() - before
                );
            }
            None => warn!("{}: node set {} not found", instance.name, set_name),
        }
    }

    info!(
        "{}: {} stress element(s), {} active, {} boundary node(s)",
        instance.name,
        stress.len(),
        active.len(),
        boundary.len()
    );

    InstanceResults {
        stress,
        active_elements: active,
        active_nodes: nodes,
        boundary_nodes: boundary,
    }
}

fn group_by_instance<'a>(
    stress: &'a FieldOutput,
    position: Position,
    db: &ResultDatabase,
) -> BTreeMap<&'a str, Vec<&'a FieldValue>> {
    let mut grouped = BTreeMap::<&str, Vec<&FieldValue>>::new();
    for value in stress.values_at(position) {
        grouped.entry(value.instance.as_str()).or_default().push(value);
    }

    let orphans: usize = grouped
        .iter()
        .filter(|(name, _)| db.instance(name).is_none())
        .map(|(_, values)| values.len())
        .sum();
    if orphans > 0 {
        warn!("ignoring {orphans} stress value(s) of unknown instances");
    }
    grouped
}

fn write_instance(
    tables: &mut CsvTables,
    vtk: Option<&mut VtkWriter>,
    inst: &Instance,
    results: &InstanceResults,
    active_only: bool,
) -> Result<()> {
    let name = inst.name.as_str();

    let nodes: Vec<_> = if active_only {
        results
            .active_nodes
            .iter()
            .filter_map(|label| inst.nodes.get(label))
            .collect()
    } else {
        inst.nodes.values().collect()
    };
    let elements: Vec<_> = if active_only {
        results
            .active_elements
            .iter()
            .filter_map(|label| inst.elements.get(label))
            .collect()
    } else {
        inst.elements.values().collect()
    };

    for node in &nodes {
        tables.write_node(name, node)?;
    }
    for element in &elements {
        tables.write_element(name, element)?;
    }
    for row in &results.stress {
        if active_only && !results.active_elements.contains(&row.element_label) {
            continue;
        }
        tables.write_stress(name, row)?;
    }
    for node in results
        .boundary_nodes
        .iter()
        .filter_map(|label| inst.nodes.get(label))
    {
        tables.write_boundary_node(name, node)?;
    }

    if let Some(vtk) = vtk {
        let mises: BTreeMap<i32, f64> = results
            .stress
            .iter()
            .map(|row| (row.element_label, row.mises))
            .collect();
        vtk.add_instance(name, nodes, elements, &mises);
    }
    Ok(())
}
