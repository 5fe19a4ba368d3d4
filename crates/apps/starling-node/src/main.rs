//! Binary entry point. Parses [`starling_node::NodeConfig`] from CLI args
//! and environment, sets up logging, and runs the node until killed.
//!
//! The multi-threaded runtime flavor is required: `register_packet_handler`
//! bridges `DirectConnector`'s synchronous callback onto async code via
//! `tokio::task::block_in_place`, which panics on the current-thread runtime.

use clap::Parser;
use starling_node::NodeConfig;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = NodeConfig::parse();

    if let Err(e) = starling_node::run(config).await {
        tracing::error!(error = %e, "node exited with an error");
        return Err(e.into());
    }

    Ok(())
}
