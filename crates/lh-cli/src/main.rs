use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lh_cli::commands::{report, streaks, together};
use lh_cli::{Cli, Commands, Config, StreaksAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON on stdout stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Report(args) => report::run(&mut stdout, args, &config)?,
        Commands::Streaks(StreaksAction::Top(args)) => streaks::run_top(&mut stdout, args, &config)?,
        Commands::Streaks(StreaksAction::Count(args)) => {
            streaks::run_count(&mut stdout, args, &config)?;
        }
        Commands::Together(args) => together::run(&mut stdout, args, &config)?,
    }

    Ok(())
}
