//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Starling protocol CLI.
#[derive(Parser, Debug)]
#[command(name = "starling")]
#[command(version)]
#[command(about = "Command-line interface for the Starling protocol")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (human or json).
    #[arg(short, long, global = true, default_value = "human")]
    pub format: OutputFormatArg,

    /// Base URL of a running node, for commands that need live state.
    #[arg(long, global = true, env = "STARLING_NODE_URL", default_value = "http://127.0.0.1:7890")]
    pub node_url: String,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    #[default]
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create this node's identity keypair.
    ///
    /// Generates a signing keypair and a sealing keypair and writes them to
    /// the data directory's keyfile. Safe to run again once the file exists
    /// only if `--force` is given.
    Init {
        /// Directory the identity keyfile is written under.
        #[arg(long, env = "STARLING_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Overwrite an existing identity.
        #[arg(short = 'F', long)]
        force: bool,
    },

    /// Show this node's identity.
    Whoami {
        #[arg(long, env = "STARLING_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Routing address to report alongside the peer id.
        #[arg(long, env = "STARLING_ROUTING_ADDRESS", default_value = "")]
        routing_address: String,
    },

    /// List peers known to a running node.
    Peers,

    /// List open payment channels on a running node.
    Channels,

    /// Start a node: serve the relay, connector, and health endpoints.
    Start {
        #[command(flatten)]
        config: starling_node::NodeConfig,
    },

    /// Generate shell completions.
    Completions {
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl From<CompletionShell> for clap_complete::Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
            CompletionShell::PowerShell => clap_complete::Shell::PowerShell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn start_accepts_flattened_node_config_args() {
        let cli = Cli::try_parse_from([
            "starling",
            "start",
            "--routing-address",
            "g.alice",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Start { .. }));
    }
}
