//! Dossier CLI: the main entry point.
//!
//! Commands:
//! - `build`   : Compile the corpus into a document
//! - `inspect` : Load and parse the corpus offline, report diagnostics
//! - `formula` : Parse one expression and show every rendering
//! - `doctor`  : Diagnose configuration and corpus
//! - `onboard` : Write a default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "dossier",
    about = "Dossier — document assembly compiler for paper corpora",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.dossier/config.toml
    #[arg(short, long, global = true, env = "DOSSIER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the corpus into a document
    Build {
        /// Corpus root containing the category folders
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: markdown, html or json
        #[arg(short, long)]
        format: Option<String>,

        /// Papers processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Load and parse the corpus without any network call
    Inspect {
        /// Corpus root containing the category folders
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Print diagnostics as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Parse one formula and print its renderings
    Formula {
        /// The expression, in linear notation
        expression: String,

        /// Variable binding for evaluation, e.g. `--var m=2`
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },

    /// Diagnose configuration and corpus
    Doctor,

    /// Write a default config file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Build {
            corpus,
            output,
            format,
            workers,
        } => {
            let overrides = commands::build::Overrides {
                corpus,
                output,
                format,
                workers,
            };
            commands::build::run(config_path.as_deref(), overrides).await?
        }
        Commands::Inspect { corpus, json } => {
            commands::inspect::run(config_path.as_deref(), corpus, json).await?
        }
        Commands::Formula { expression, vars } => commands::formula::run(&expression, &vars)?,
        Commands::Doctor => commands::doctor::run(config_path.as_deref()).await?,
        Commands::Onboard => commands::onboard::run(config_path.as_deref()).await?,
    }

    Ok(())
}
