//! cicd: build content-addressed chart bundles and register pipelines.
//!
//! # Usage
//!
//! ```text
//! cicd chart build <source> [--set k=v]... [--allow k]... [--category c] [--label l]
//! cicd chart status <label>
//! cicd chart remove <label>
//! cicd pipeline activate <label> --kind helm|terraform|script [fields...]
//! cicd pipeline show <label>
//! cicd pipeline deactivate <label>
//! cicd status [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{chart::ChartCommand, pipeline::PipelineCommand, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cicd",
    version,
    about = "Build chart bundles and manage pipeline registrations",
    long_about = None,
)]
struct Cli {
    /// Control-plane root URL. Overrides $CICD_API_ROOT and the config file.
    #[arg(long, global = true, value_name = "URL")]
    api_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build, inspect and remove chart bundles.
    Chart {
        #[command(subcommand)]
        command: ChartCommand,
    },

    /// Register, inspect and unregister pipelines.
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },

    /// List every recorded chart and pipeline.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = commands::CliContext::new(cli.api_root)?;
    match cli.command {
        Commands::Chart { command } => commands::chart::run(&ctx, command),
        Commands::Pipeline { command } => commands::pipeline::run(&ctx, command),
        Commands::Status(args) => args.run(&ctx),
    }
}
