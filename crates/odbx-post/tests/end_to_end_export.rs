//! End-to-end export of a small result database.
//!
//! Two instances: a pair of hexahedra (one deleted through STATUS) and a
//! single tetrahedron without any STATUS values. The `equ` step carries
//! integration-point stress; the `EN` step only element-nodal stress.

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use odbx_io::ExportError;
use odbx_model::Position;
use odbx_post::{ExportConfig, run_export};
use serde_json::{Value, json};

fn hex_nodes() -> Value {
    let coords = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
        [0.0, 0.0, 2.0],
        [1.0, 0.0, 2.0],
        [1.0, 1.0, 2.0],
        [0.0, 1.0, 2.0],
    ];
    Value::Array(
        coords
            .iter()
            .enumerate()
            .map(|(i, c)| json!({"label": i + 1, "coordinates": c}))
            .collect(),
    )
}

fn ip(instance: &str, element: i32, data: [f64; 6], mises: Value) -> Value {
    json!({
        "instance": instance,
        "element_label": element,
        "position": "INTEGRATION_POINT",
        "data": data,
        "mises": mises,
    })
}

fn en(instance: &str, element: i32, node: i32, s11: f64) -> Value {
    json!({
        "instance": instance,
        "element_label": element,
        "node_label": node,
        "position": "ELEMENT_NODAL",
        "data": [s11, 0.0, 0.0, 0.0, 0.0, 0.0],
    })
}

/// Step whose stress exists only at element nodes (plus an ignored centroid value)
fn element_nodal_step() -> Value {
    json!({
        "name": "EN",
        "frames": [{
            "frame_id": 1,
            "field_outputs": {
                "S": {
                    "values": [
                        en("BLOCK-1", 1, 1, 6.0),
                        en("TET-1", 1, 1, 1.0),
                        en("TET-1", 1, 2, 2.0),
                        en("TET-1", 1, 3, 3.0),
                        en("TET-1", 1, 4, 4.0),
                        {"instance": "BLOCK-1", "element_label": 2,
                         "position": "CENTROID", "data": [9.0, 0.0, 0.0, 0.0, 0.0, 0.0]}
                    ]
                }
            }
        }]
    })
}

fn database() -> Value {
    json!({
        "instances": [
            {
                "name": "BLOCK-1",
                "nodes": hex_nodes(),
                "elements": [
                    {"label": 1, "type": "C3D8R", "connectivity": [1, 2, 3, 4, 5, 6, 7, 8]},
                    {"label": 2, "type": "C3D8R", "connectivity": [5, 6, 7, 8, 9, 10, 11, 12]}
                ],
                "node_sets": {"BASE": [1, 2, 3, 4]}
            },
            {
                "name": "TET-1",
                "nodes": [
                    {"label": 1, "coordinates": [0.0, 0.0, 0.0]},
                    {"label": 2, "coordinates": [1.0, 0.0, 0.0]},
                    {"label": 3, "coordinates": [0.0, 1.0, 0.0]},
                    {"label": 4, "coordinates": [0.0, 0.0, 1.0]},
                    {"label": 5, "coordinates": [5.0, 5.0, 5.0]}
                ],
                "elements": [
                    {"label": 1, "type": "C3D4", "connectivity": [1, 2, 3, 4]}
                ]
            }
        ],
        "steps": [
            {"name": "Initial", "frames": [{"frame_id": 0}]},
            {
                "name": "equ",
                "frames": [
                    {"frame_id": 0, "description": "Increment 0"},
                    {
                        "frame_id": 1,
                        "description": "Increment 1",
                        "field_outputs": {
                            "S": {
                                "component_labels": ["S11", "S22", "S33", "S12", "S13", "S23"],
                                "values": [
                                    ip("BLOCK-1", 1, [10.0, 0.0, 0.0, 0.0, 0.0, 0.0], json!(null)),
                                    ip("BLOCK-1", 1, [20.0, 0.0, 0.0, 0.0, 0.0, 0.0], json!("bad")),
                                    ip("BLOCK-1", 2, [0.0, 0.0, 0.0, 5.0, 0.0, 0.0], json!(1.5)),
                                    ip("TET-1", 1, [1.0, 2.0, 3.0, 0.0, 0.0, 0.0], json!(null))
                                ]
                            },
                            "STATUS": {
                                "values": [
                                    {"instance": "BLOCK-1", "element_label": 1,
                                     "position": "INTEGRATION_POINT", "data": [1.0]},
                                    {"instance": "BLOCK-1", "element_label": 2,
                                     "position": "INTEGRATION_POINT", "data": [0.0]}
                                ]
                            }
                        }
                    }
                ]
            }
        ]
    })
}

fn write_database(dir: &Path) -> std::path::PathBuf {
    write_document(dir, &database())
}

fn write_document(dir: &Path, document: &Value) -> std::path::PathBuf {
    let path = dir.join("job.odb.json");
    fs::write(&path, serde_json::to_vec_pretty(document).expect("encode"))
        .expect("write database");
    path
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("table should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn exports_all_tables_for_last_frame() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = write_database(dir.path());
    let config = ExportConfig {
        output_dir: dir.path().join("out"),
        suffix: true,
        ..ExportConfig::new(&db_path)
    };

    let summary = run_export(&config).expect("export should succeed");

    assert_eq!(summary.stress_position, Position::IntegrationPoint);
    assert!(summary.paths.nodes.ends_with("nodes_equ_last.csv"));
    assert!(summary.vtk.is_none());

    let nodes = lines(&summary.paths.nodes);
    assert_eq!(nodes[0], "instance,node_id,x,y,z");
    assert_eq!(nodes.len(), 1 + 12 + 5);
    assert_eq!(nodes[2], "BLOCK-1,2,1,0,0");
    assert_eq!(nodes[13], "TET-1,1,0,0,0");

    let elements = lines(&summary.paths.elements);
    assert_eq!(
        elements,
        vec![
            "instance,element_id,node_ids",
            "BLOCK-1,1,1 2 3 4 5 6 7 8",
            "BLOCK-1,2,5 6 7 8 9 10 11 12",
            "TET-1,1,1 2 3 4",
        ]
    );

    let stress = lines(&summary.paths.stress);
    assert_eq!(stress[0], "instance,element_id,MISES,S11,S22,S33,S12,S13,S23");
    // Both mises values of element 1 are unusable and recomputed: (10 + 20) / 2
    assert_eq!(stress[1], "BLOCK-1,1,15,15,0,0,0,0,0");
    assert_eq!(stress[2], "BLOCK-1,2,1.5,0,0,0,5,0,0");
    assert_eq!(stress[3], "TET-1,1,1.73205,1,2,3,0,0,0");

    // Element 2 is deleted, so element 1 is alone and all of its nodes are exposed.
    // The tetrahedron has no STATUS values and stays active through its stress.
    let boundary = lines(&summary.paths.boundary_nodes);
    let labels: Vec<&str> = boundary[1..]
        .iter()
        .map(|row| {
            let mut cols = row.split(',');
            let inst = cols.next().unwrap_or_default();
            let node = cols.next().unwrap_or_default();
            if inst == "BLOCK-1" { node } else { "" }
        })
        .filter(|n| !n.is_empty())
        .collect();
    assert_eq!(labels, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
    assert!(boundary.iter().any(|r| r == "TET-1,4,0,0,1"));
    assert!(!boundary.iter().any(|r| r.starts_with("TET-1,5,")));

    assert_eq!(summary.counts.nodes, 17);
    assert_eq!(summary.counts.elements, 3);
    assert_eq!(summary.counts.stress, 3);
    assert_eq!(summary.counts.boundary_nodes, 12);

    let block = &summary.instances[0];
    assert_eq!(block.name, "BLOCK-1");
    assert_eq!(block.stress_elements, 2);
    assert_eq!(block.active_elements, 1);
}

#[test]
fn active_only_restricts_tables_and_node_set_extends_boundary() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = write_database(dir.path());
    let config = ExportConfig {
        output_dir: dir.path().to_path_buf(),
        frame: 1,
        active_only: true,
        node_set: Some("base".to_string()),
        vtk: true,
        ..ExportConfig::new(&db_path)
    };

    let summary = run_export(&config).expect("export should succeed");
    assert!(summary.paths.nodes.ends_with("nodes.csv"));

    let elements = lines(&summary.paths.elements);
    assert_eq!(
        elements,
        vec![
            "instance,element_id,node_ids",
            "BLOCK-1,1,1 2 3 4 5 6 7 8",
            "TET-1,1,1 2 3 4",
        ]
    );

    let nodes = lines(&summary.paths.nodes);
    assert_eq!(nodes.len(), 1 + 8 + 4);

    let stress = lines(&summary.paths.stress);
    assert_eq!(stress.len(), 3);
    assert!(stress[1].starts_with("BLOCK-1,1,"));

    let vtk_path = summary.vtk.expect("vtk requested");
    let vtk = fs::read_to_string(vtk_path).expect("vtk readable");
    assert!(vtk.contains("POINTS 12 double"));
    assert!(vtk.contains("CELL_TYPES 2\n12\n10\n"));

    let tet_mises = 3.0_f64.sqrt();
    let last = vtk.lines().last().unwrap_or_default();
    let parsed: f64 = last.parse().expect("numeric cell value");
    assert_relative_eq!(parsed, tet_mises, epsilon = 1e-12);
}

#[test]
fn element_nodal_stress_is_used_without_integration_points() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut document = database();
    if let Some(steps) = document["steps"].as_array_mut() {
        steps.push(element_nodal_step());
    }
    let db_path = write_document(dir.path(), &document);
    let config = ExportConfig {
        output_dir: dir.path().to_path_buf(),
        step_name: "EN".to_string(),
        ..ExportConfig::new(&db_path)
    };

    let summary = run_export(&config).expect("export should succeed");
    assert_eq!(summary.stress_position, Position::ElementNodal);
    assert!(summary.paths.stress.ends_with("stress.csv"));

    // Four nodal samples of the tetrahedron: 1, 2, 3 and 4 in uniaxial tension
    let stress = lines(&summary.paths.stress);
    assert_eq!(
        stress,
        vec![
            "instance,element_id,MISES,S11,S22,S33,S12,S13,S23",
            "BLOCK-1,1,6,6,0,0,0,0,0",
            "TET-1,1,2.5,2.5,0,0,0,0,0",
        ]
    );

    // No STATUS in this frame, so element 2 (centroid stress only) is not active
    assert_eq!(summary.instances[0].stress_elements, 1);
    assert_eq!(summary.instances[0].active_elements, 1);
    assert_eq!(summary.counts.boundary_nodes, 8 + 4);
}

#[test]
fn unknown_step_fails_before_writing_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = write_database(dir.path());
    let config = ExportConfig {
        output_dir: dir.path().join("out"),
        step_name: "CUT".to_string(),
        ..ExportConfig::new(&db_path)
    };

    let err = run_export(&config).expect_err("step does not exist");
    match err {
        ExportError::StepNotFound { name, available } => {
            assert_eq!(name, "CUT");
            assert_eq!(available, vec!["Initial".to_string(), "equ".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn frame_without_stress_is_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = write_database(dir.path());
    let config = ExportConfig {
        output_dir: dir.path().join("out"),
        frame: 0,
        ..ExportConfig::new(&db_path)
    };

    let err = run_export(&config).expect_err("frame 0 has no stress");
    assert!(matches!(err, ExportError::MissingField { frame: 0, .. }));
    assert!(err.to_string().contains("'S'"));
}

#[test]
fn rerun_overwrites_previous_tables() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = write_database(dir.path());
    let config = ExportConfig {
        output_dir: dir.path().to_path_buf(),
        ..ExportConfig::new(&db_path)
    };

    let first = run_export(&config).expect("first run");
    let before = fs::read_to_string(&first.paths.stress).expect("stress readable");
    let second = run_export(&config).expect("second run");
    let after = fs::read_to_string(&second.paths.stress).expect("stress readable");
    assert_eq!(before, after);
}
