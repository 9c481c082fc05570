//! CLI command implementations

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use hyperfold_core::{
    CollapseExpandEngine, DiffEngine, GraphDiff, GraphStore, StoreConfig, VisibleGraph,
    VisibleSnapshot,
};
use hyperfold_loader::GraphLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per visible container, node and edge
    Summary,
    /// The visible snapshot as pretty JSON
    Json,
    /// Graphviz DOT of the visible graph
    Dot,
    /// Mermaid flowchart, with expanded containers as subgraphs
    Mermaid,
}

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub collapse_all: bool,
    pub collapse: Vec<String>,
    pub expand: Vec<String>,
    pub format: OutputFormat,
    pub diffs: bool,
}

pub fn show(
    input: &Path,
    hierarchy: Option<String>,
    config: Option<&Path>,
    options: ViewOptions,
) -> anyhow::Result<()> {
    let store = load_store(input, hierarchy, config)?;
    let mut engine = CollapseExpandEngine::new(store);
    let mut diffs = DiffEngine::new();
    diffs.observe(VisibleSnapshot::capture(engine.store()));

    let mut step = |engine: &CollapseExpandEngine, label: &str| -> anyhow::Result<()> {
        let diff = diffs.observe(VisibleSnapshot::capture(engine.store()));
        if options.diffs {
            println!("# {label}: {}", describe_diff(&diff));
            println!("{}", serde_json::to_string(&diff)?);
        }
        Ok(())
    };

    if options.collapse_all {
        engine.collapse_all()?;
        step(&engine, "collapse all")?;
    }
    for id in &options.collapse {
        engine
            .collapse(id)
            .with_context(|| format!("collapsing {id}"))?;
        step(&engine, &format!("collapse {id}"))?;
    }
    for id in &options.expand {
        engine
            .expand(id)
            .with_context(|| format!("expanding {id}"))?;
        step(&engine, &format!("expand {id}"))?;
    }

    let snapshot = VisibleSnapshot::capture(engine.store());
    println!("{}", render(&snapshot, options.format)?);
    Ok(())
}

pub fn stats(input: &Path, hierarchy: Option<String>, config: Option<&Path>) -> anyhow::Result<()> {
    let store = load_store(input, hierarchy, config)?;
    let expanded = VisibleSnapshot::capture(&store);
    println!(
        "{} nodes, {} containers, {} edges",
        store.node_count(),
        store.container_count(),
        store.edge_count()
    );

    let mut engine = CollapseExpandEngine::new(store);
    engine.collapse_all()?;
    let collapsed = VisibleSnapshot::capture(engine.store());
    println!(
        "expanded: {} visible units, {} visible edges",
        expanded.units().count(),
        expanded.edges.len()
    );
    println!(
        "collapsed: {} visible units, {} visible edges ({} hyperedges)",
        collapsed.units().count(),
        collapsed.edges.len(),
        collapsed.hyperedge_count()
    );
    Ok(())
}

fn load_store(
    input: &Path,
    hierarchy: Option<String>,
    config: Option<&Path>,
) -> anyhow::Result<GraphStore> {
    tracing::info!("Loading graph: {}", input.display());

    let mut loader = GraphLoader::new();
    if let Some(path) = config {
        loader = loader.with_config(load_config(path)?);
    }
    if let Some(choice) = hierarchy {
        loader = loader.hierarchy(choice);
    }
    let store = loader
        .load_path(input)
        .with_context(|| format!("loading {}", input.display()))?;

    tracing::info!(
        "Loaded {} nodes, {} containers, {} edges",
        store.node_count(),
        store.container_count(),
        store.edge_count()
    );
    Ok(store)
}

pub fn load_config(path: &Path) -> anyhow::Result<StoreConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn parse_config(text: &str) -> anyhow::Result<StoreConfig> {
    Ok(toml::from_str(text)?)
}

pub fn render(snapshot: &VisibleSnapshot, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => snapshot.to_json_pretty()?,
        OutputFormat::Dot => VisibleGraph::from_snapshot(snapshot).to_dot(),
        OutputFormat::Mermaid => VisibleGraph::from_snapshot(snapshot).to_mermaid(),
        OutputFormat::Summary => summary(snapshot),
    })
}

fn summary(snapshot: &VisibleSnapshot) -> String {
    let mut lines = Vec::new();
    for unit in snapshot.units() {
        match &unit.parent {
            Some(parent) => lines.push(format!("{} ({}) in {}", unit, unit.id, parent)),
            None => lines.push(format!("{} ({})", unit, unit.id)),
        }
    }
    for edge in &snapshot.edges {
        lines.push(format!("{} -> {}  {}", edge.source, edge.target, edge));
    }
    lines.join("\n")
}

fn describe_diff(diff: &GraphDiff) -> String {
    format!(
        "+{} -{} ~{} units, +{} -{} ~{} edges",
        diff.added_nodes.len(),
        diff.removed_nodes.len(),
        diff.modified_nodes.len(),
        diff.added_edges.len(),
        diff.removed_edges.len(),
        diff.modified_edges.len()
    )
}
