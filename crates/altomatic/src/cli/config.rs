//! The `altomatic config` command for configuration management.

use altomatic_core::Config;
use clap::{Args, Subcommand};

use super::context::Context;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration (credentials masked)
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs, ctx: Context) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let toml = masked(&ctx.config).to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            println!("{}", ctx.config_path.display());
        }

        ConfigCommand::Init { force } => {
            let path = &ctx.config_path;

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = Config::default().to_toml()?;
            std::fs::write(path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Copy of `config` with literal secrets replaced. `${VAR}` references are
/// shown as written.
fn masked(config: &Config) -> Config {
    fn mask(value: &mut Option<String>) {
        if let Some(v) = value {
            if !v.is_empty() && !v.starts_with("${") {
                *v = "********".to_string();
            }
        }
    }

    let mut config = config.clone();
    mask(&mut config.providers.openai.api_key);
    mask(&mut config.providers.google.api_key);
    mask(&mut config.providers.aws.secret_key);
    mask(&mut config.providers.azure.api_key);
    config
}
