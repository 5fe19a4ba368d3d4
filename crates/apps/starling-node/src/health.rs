//! `GET /health` and `GET /peers` (§4.8, §6, §10.7): reports bootstrap phase,
//! current peer/channel counts, and per-peer detail for the CLI's peer/channel
//! inspection commands.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;

use crate::bootstrap::BootstrapState;
use crate::peer_table::PeerTable;

pub struct HealthState {
    pub bootstrap: Arc<BootstrapState>,
    pub peers: Arc<PeerTable>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(rename = "bootstrapPhase")]
    bootstrap_phase: String,
    #[serde(rename = "peerCount")]
    peer_count: usize,
    #[serde(rename = "channelCount")]
    channel_count: usize,
}

pub async fn health(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        bootstrap_phase: state.bootstrap.phase().to_string(),
        peer_count: state.peers.len(),
        channel_count: state.peers.channel_count(),
    })
}

#[derive(Serialize)]
pub struct PeerSummary {
    #[serde(rename = "peerId")]
    pub peer_id: String,
    #[serde(rename = "routingAddress")]
    pub routing_address: String,
    #[serde(rename = "transportEndpoint")]
    pub transport_endpoint: String,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    pub priority: u32,
}

pub async fn peers(State(state): State<Arc<HealthState>>) -> Json<Vec<PeerSummary>> {
    let summaries = state
        .peers
        .peer_ids()
        .into_iter()
        .filter_map(|peer_id| {
            let tracked = state.peers.get(&peer_id)?;
            let tracked = tracked.lock().unwrap();
            Some(PeerSummary {
                peer_id: starling_crypto::peer_id_to_string(&peer_id),
                routing_address: tracked.routing_address.clone(),
                transport_endpoint: tracked.transport_endpoint.clone(),
                channel_id: tracked.channel_id.clone(),
                priority: tracked.priority,
            })
        })
        .collect();
    Json(summaries)
}
