//! `starling` CLI entry point.

mod cli;
mod commands;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use error::CliError;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let cli = Cli::parse();
    let format = cli.format.into();

    let result = run(cli.command, &cli.node_url, format).await;

    match result {
        Ok(Some(output)) => println!("{output}"),
        Ok(None) => {}
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(command: Commands, node_url: &str, format: output::OutputFormat) -> Result<Option<String>, CliError> {
    match command {
        Commands::Init { data_dir, force } => commands::init::init(data_dir, force, format).map(Some),
        Commands::Whoami { data_dir, routing_address } => {
            commands::whoami::whoami(data_dir, routing_address, format).map(Some)
        }
        Commands::Peers => commands::peers::peers(node_url, format).await.map(Some),
        Commands::Channels => commands::channels::channels(node_url, format).await.map(Some),
        Commands::Start { config } => commands::start::start(config).await.map(|_| None),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(clap_complete::Shell::from(shell), &mut command, name, &mut std::io::stdout());
            Ok(None)
        }
    }
}
