//! Peer inspection command: queries a running node's `GET /peers`.

use serde::Deserialize;

use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, PeerRow, PeersOutput, Render};

#[derive(Deserialize)]
struct PeerEntry {
    #[serde(rename = "peerId")]
    peer_id: String,
    #[serde(rename = "routingAddress")]
    routing_address: String,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
    priority: u32,
}

pub async fn peers(node_url: &str, format: OutputFormat) -> CliResult<String> {
    let rows = fetch_peers(node_url).await?;
    Ok(PeersOutput(rows).render(format))
}

pub(crate) async fn fetch_peers(node_url: &str) -> CliResult<Vec<PeerRow>> {
    let url = format!("{}/peers", node_url.trim_end_matches('/'));
    let response = reqwest::get(&url).await.map_err(|source| CliError::Unreachable { url: url.clone(), source })?;

    if !response.status().is_success() {
        return Err(CliError::NodeResponse(format!("{} returned {}", url, response.status())));
    }

    let entries: Vec<PeerEntry> =
        response.json().await.map_err(|source| CliError::Unreachable { url, source })?;

    Ok(entries
        .into_iter()
        .map(|entry| PeerRow {
            peer_id: entry.peer_id,
            routing_address: entry.routing_address,
            channel_id: entry.channel_id,
            priority: entry.priority,
        })
        .collect())
}
