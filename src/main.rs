#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use keyhold::cli::{Cli, Commands};
use keyhold::commands;
use keyhold::config::Config;
use keyhold::env::ProcessEnv;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let project_root = std::env::current_dir()?;
    let config = Config::load(&project_root, &ProcessEnv)?.with_cli_overrides(&cli);

    let ok = match &cli.command {
        Commands::Setup { hostname } => commands::setup::execute(&config, hostname),
        Commands::Clone { url, dest, branch } => {
            commands::clone::execute(&config, url, dest, branch.as_deref())
        }
        Commands::SshCommand { hostname } => commands::ssh_command::execute(&config, hostname),
        Commands::Test { hostname } => commands::test::execute(&config, hostname),
        Commands::Status => {
            commands::status::execute(&config)?;
            true
        }
        Commands::Clean { yes } => {
            commands::clean::execute(&config, *yes)?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

// Logs go to stderr so `keyhold ssh-command` output stays capturable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "keyhold=debug" } else { "keyhold=info" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
