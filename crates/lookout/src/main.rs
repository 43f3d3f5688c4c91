use clap::Parser;
use eyre::Result;

use lookout::cli::{Cli, Commands, config as cli_config};
use lookout::commands::{Command, check::CheckCommand, replay::ReplayCommand};
use lookout::replay::FrameSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    // Load .env before parsing so LOOKOUT_* fallbacks can come from it
    cli_config::load_env()?;

    let cli = Cli::parse();

    let (config, ignored) = cli_config::resolve(cli.config.as_deref(), cli.format)?;

    lookout_core::utils::tracing::init_tracing(&config.log)?;

    if let Some(error) = ignored {
        tracing::warn!(%error, "Ignoring user config file, using defaults");
    }

    tracing::debug!(
        format = %config.output.format,
        command_buffer = config.runtime.command_buffer,
        update_buffer = config.runtime.update_buffer,
        "Configuration resolved"
    );

    match cli.command {
        Commands::Replay { input } => {
            ReplayCommand {
                source: FrameSource::from_arg(input.as_deref()),
                format: config.output.format,
                runtime: config.runtime,
            }
            .execute()
            .await
        }
        Commands::Check { input } => {
            CheckCommand {
                source: FrameSource::from_arg(input.as_deref()),
                format: config.output.format,
                runtime: config.runtime,
            }
            .execute()
            .await
        }
    }
}
