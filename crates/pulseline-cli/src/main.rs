mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pulseline",
    version,
    about = "The single-binary social stream enrichment engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an enrichment pipeline
    Run {
        /// Path to pipeline YAML file
        pipeline: PathBuf,
        /// Run id assigned by an external scheduler (overrides the
        /// pipeline file; generated when absent from both)
        #[arg(long)]
        run_id: Option<String>,
    },
    /// Validate pipeline configuration and plugin resolution
    Check {
        /// Path to pipeline YAML file
        pipeline: PathBuf,
    },
    /// List available plugins by capability family
    Plugins,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Run { pipeline, run_id } => {
            commands::run::execute(&pipeline, run_id.as_deref()).await
        }
        Commands::Check { pipeline } => commands::check::execute(&pipeline),
        Commands::Plugins => {
            commands::plugins::execute();
            Ok(())
        }
    }
}
