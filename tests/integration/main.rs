//! Integration tests for Hyperfold
//!
//! These tests drive the loader, the engine and the CLI binary together.

use std::io::Write;
use std::process::Command;

use hyperfold_core::{CollapseExpandEngine, VisibleGraph, VisibleSnapshot};
use hyperfold_loader::GraphLoader;
use tempfile::NamedTempFile;

const PIPELINE: &str = r#"{
    "nodes": [
        {"id": "0", "shortLabel": "source"},
        {"id": "1", "shortLabel": "map"},
        {"id": "2", "shortLabel": "filter"},
        {"id": "3", "shortLabel": "network"},
        {"id": "4", "shortLabel": "fold"},
        {"id": "5", "shortLabel": "sink"}
    ],
    "edges": [
        {"id": "e01", "source": "0", "target": "1", "semanticTags": ["Stream"]},
        {"id": "e12", "source": "1", "target": "2", "semanticTags": ["Stream"]},
        {"id": "e23", "source": "2", "target": "3", "semanticTags": ["Network"]},
        {"id": "e34", "source": "3", "target": "4", "semanticTags": ["Network"]},
        {"id": "e45", "source": "4", "target": "5", "semanticTags": ["Stream"]},
        {"id": "e05", "source": "0", "target": "5"}
    ],
    "hierarchyChoices": [
        {"id": "location", "name": "Location", "children": [
            {"key": "leader", "name": "Leader", "children": [
                {"key": "stage1", "name": "Stage 1"}
            ]},
            {"key": "worker", "name": "Worker"}
        ]}
    ],
    "nodeAssignments": {
        "location": {"0": "stage1", "1": "stage1", "2": "leader", "4": "worker", "5": "worker"}
    }
}"#;

fn pipeline_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PIPELINE.as_bytes()).unwrap();
    file
}

fn hyperfold(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hyperfold"))
        .args(args)
        .output()
        .expect("Failed to execute hyperfold")
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = hyperfold(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("hyperfold"));
    assert!(stdout.contains("show"));
}

#[test]
fn test_loaded_graph_round_trips_through_collapse_all() {
    let file = pipeline_file();
    let store = GraphLoader::new().load_path(file.path()).unwrap();
    let before = VisibleSnapshot::capture(&store);
    assert_eq!(before.containers.len(), 3);
    assert_eq!(before.nodes.len(), 6);
    assert_eq!(before.edges.len(), 6);

    let mut engine = CollapseExpandEngine::new(store);
    engine.collapse_all().unwrap();
    let collapsed = VisibleSnapshot::capture(engine.store());

    // only the two top-level containers and the unassigned node remain
    let units: Vec<_> = collapsed.units().map(|u| u.id.as_str()).collect();
    assert_eq!(units, vec!["leader", "worker", "3"]);
    assert!(collapsed.edges.iter().all(|e| e.is_hyper()));
    let graph = VisibleGraph::from_snapshot(&collapsed);
    assert!(graph.has_edge_between("leader", "3"));
    assert!(graph.has_edge_between("3", "worker"));
    assert!(graph.has_edge_between("leader", "worker"));

    engine.expand_all().unwrap();
    assert_eq!(VisibleSnapshot::capture(engine.store()), before);
}

#[test]
fn test_network_edges_keep_priority_when_lifted() {
    let file = pipeline_file();
    let store = GraphLoader::new().load_path(file.path()).unwrap();
    let mut engine = CollapseExpandEngine::new(store);
    engine.collapse("worker").unwrap();

    let into_worker = engine.store().hyperedge("hyper_3_to_worker").unwrap();
    assert_eq!(into_worker.style, hyperfold_core::EdgeStyle::Thick);
    let from_zero = engine.store().hyperedge("hyper_0_to_worker").unwrap();
    assert_eq!(from_zero.style, hyperfold_core::EdgeStyle::Default);
}

#[test]
fn test_cli_show_json() {
    let file = pipeline_file();
    let path = file.path().to_str().unwrap();
    let output = hyperfold(&["show", path, "--collapse", "worker", "--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let snapshot: VisibleSnapshot = serde_json::from_slice(&output.stdout).unwrap();
    let worker = snapshot
        .containers
        .iter()
        .find(|c| c.id.as_str() == "worker")
        .unwrap();
    assert!(worker.collapsed);
    assert!(!snapshot.nodes.iter().any(|n| n.id.as_str() == "4"));
    assert_eq!(snapshot.hyperedge_count(), 2);
}

#[test]
fn test_cli_show_summary_with_config() {
    let file = pipeline_file();
    let mut config = NamedTempFile::new().unwrap();
    config
        .write_all(b"[collapsed_dimensions]\nwidth = 99.0\nheight = 11.0\n")
        .unwrap();

    let output = hyperfold(&[
        "show",
        file.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "--collapse-all",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let snapshot: VisibleSnapshot = serde_json::from_slice(&output.stdout).unwrap();
    for container in &snapshot.containers {
        assert_eq!(container.dimensions.width, 99.0);
    }
}

#[test]
fn test_cli_unknown_container_fails() {
    let file = pipeline_file();
    let output = hyperfold(&["show", file.path().to_str().unwrap(), "--collapse", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("collapsing nope"));
}

#[test]
fn test_cli_unknown_hierarchy_fails() {
    let file = pipeline_file();
    let output = hyperfold(&["stats", file.path().to_str().unwrap(), "--hierarchy", "backtrace"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("backtrace"));
}
