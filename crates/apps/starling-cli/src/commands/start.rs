//! Start command: thin pass-through into the node binary's own `run`, so the
//! CLI and the `starling-node` binary never drift on how a node is wired up.

use starling_node::NodeConfig;

use crate::error::CliResult;

pub async fn start(config: NodeConfig) -> CliResult<()> {
    starling_node::run(config).await.map_err(Into::into)
}
