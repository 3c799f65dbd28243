//! Refract command-line inspector
//!
//! Loads TOML type manifests into a registry and prints what the
//! reflection engine sees: descriptors, hierarchies and resolution errors.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "refract")]
#[command(about = "Inspect reflective type manifests", long_about = None)]
#[command(version)]
struct Cli {
    /// Color output: auto, always, never
    #[arg(long, global = true, value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the descriptor of one type
    Inspect {
        /// Manifest file
        manifest: PathBuf,
        /// Qualified type name
        type_name: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the supertype chain and every reachable interface
    Hierarchy {
        /// Manifest file
        manifest: PathBuf,
        /// Qualified type name
        type_name: String,
    },

    /// Resolve every declared type and report failures
    Check {
        /// Manifest file
        manifest: PathBuf,
    },

    /// Show version and environment info
    Info,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("REFRACT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let color = output::resolve_color_choice(cli.color.as_deref());

    match cli.command {
        Commands::Inspect {
            manifest,
            type_name,
            json,
        } => commands::inspect::execute(&manifest, &type_name, json, color),
        Commands::Hierarchy {
            manifest,
            type_name,
        } => commands::hierarchy::execute(&manifest, &type_name, color),
        Commands::Check { manifest } => commands::check::execute(&manifest, color),
        Commands::Info => commands::info::execute(),
    }
}
