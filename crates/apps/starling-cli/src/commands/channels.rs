//! Channel inspection command: reuses `/peers` and filters to peers with an
//! open channel, since a channel is tracked as a peer-table attribute (§5),
//! not a separate resource.

use crate::commands::peers::fetch_peers;
use crate::error::CliResult;
use crate::output::{ChannelsOutput, OutputFormat, Render};

pub async fn channels(node_url: &str, format: OutputFormat) -> CliResult<String> {
    let rows = fetch_peers(node_url).await?;
    Ok(ChannelsOutput(rows).render(format))
}
