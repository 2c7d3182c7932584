//! Altomatic CLI - ALT-text generation for image catalogs.
//!
//! Altomatic asks a vision provider (OpenAI, Google Vision, AWS Rekognition or
//! Azure Vision) to describe each image and writes the result into the
//! asset's ALT-text field. Assets live in a JSON catalog built from a
//! directory; every queue action is recorded in a SQLite audit log.
//!
//! # Usage
//!
//! ```bash
//! # Build a catalog from a directory of images
//! altomatic catalog scan ./uploads --base-url https://cdn.example.com/uploads
//!
//! # Check provider credentials
//! altomatic check
//!
//! # Caption one asset right away
//! altomatic generate 42
//!
//! # Queue the whole library in batches of 200
//! altomatic queue --all
//!
//! # Coverage and recent queue actions
//! altomatic stats
//! altomatic logs --limit 20
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Altomatic - Generate image ALT text with vision providers.
#[derive(Parser, Debug)]
#[command(name = "altomatic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "ALTOMATIC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate ALT text for one asset now
    Generate(cli::generate::GenerateArgs),

    /// Queue assets for ALT-text generation in batch jobs
    Queue(cli::queue::QueueArgs),

    /// Show how many images already have ALT text
    Stats,

    /// Show recent queue actions from the audit log
    Logs(cli::logs::LogsArgs),

    /// Check whether the selected provider is configured
    Check,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),

    /// Build and inspect the asset catalog
    Catalog(cli::catalog::CatalogArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli::context::config_path(cli.config.as_deref());

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match altomatic_core::Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            anyhow::bail!("Failed to load config {}: {e}", config_path.display());
        }
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `altomatic config path`."
            );
            altomatic_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Altomatic v{}", altomatic_core::VERSION);

    let ctx = cli::context::Context::new(config, config_path);

    match cli.command {
        Commands::Generate(args) => cli::generate::execute(args, ctx).await,
        Commands::Queue(args) => cli::queue::execute(args, ctx).await,
        Commands::Stats => cli::stats::execute(ctx).await,
        Commands::Logs(args) => cli::logs::execute(args, ctx).await,
        Commands::Check => cli::check::execute(ctx).await,
        Commands::Config(args) => cli::config::execute(args, ctx).await,
        Commands::Catalog(args) => cli::catalog::execute(args, ctx).await,
    }
}
