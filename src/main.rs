//! Hyperfold CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{OutputFormat, ViewOptions};

#[derive(Parser)]
#[command(name = "hyperfold")]
#[command(about = "Collapse and expand hierarchical graphs from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with default entity dimensions
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a graph, apply collapse/expand operations and print what is visible
    Show {
        /// Graph JSON file
        input: PathBuf,

        /// Hierarchy choice to group nodes by
        #[arg(long)]
        hierarchy: Option<String>,

        /// Collapse every top-level container first
        #[arg(long)]
        collapse_all: bool,

        /// Container to collapse (repeatable, applied in order)
        #[arg(long = "collapse", value_name = "CONTAINER")]
        collapse: Vec<String>,

        /// Container to expand (repeatable, applied after collapses)
        #[arg(long = "expand", value_name = "CONTAINER")]
        expand: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        format: OutputFormat,

        /// Also print the visible-state diff produced by each operation
        #[arg(long)]
        diffs: bool,
    },
    /// Load a graph and report its size, collapsed and expanded
    Stats {
        /// Graph JSON file
        input: PathBuf,

        /// Hierarchy choice to group nodes by
        #[arg(long)]
        hierarchy: Option<String>,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("hyperfold={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Show {
            input,
            hierarchy,
            collapse_all,
            collapse,
            expand,
            format,
            diffs,
        } => {
            let options = ViewOptions {
                collapse_all,
                collapse,
                expand,
                format,
                diffs,
            };
            commands::show(&input, hierarchy, cli.config.as_deref(), options)
        }
        Commands::Stats { input, hierarchy } => {
            commands::stats(&input, hierarchy, cli.config.as_deref())
        }
        Commands::Version => {
            println!("Hyperfold v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
