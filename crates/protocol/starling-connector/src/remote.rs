//! HTTP connector: talks to an out-of-process connector admin API.
//! Network errors retry with exponential backoff via [`RetryPolicy`];
//! application-level rejections (4xx bodies carrying a reject code) are
//! returned immediately and never retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starling_crypto::PeerId;
use starling_types::ChainId;

use crate::error::{ConnectorError, Result};
use crate::retry::RetryPolicy;
use crate::traits::Connector;
use crate::types::{ChannelInfo, ChannelState, PacketHandler, PacketOutcome};

pub struct RemoteConnector {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl RemoteConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_retry_policy(base_url, RetryPolicy::default())
    }

    pub fn with_retry_policy(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ConnectorError::Network(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(ConnectorError::Network(format!("server error: {}", response.status())));
        }
        if response.status().is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Remote(message));
        }

        let bytes = response.bytes().await.map_err(|e| ConnectorError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Serialize)]
struct RegisterPeerRequest<'a> {
    peer: String,
    transport_endpoint: &'a str,
    routing_address: &'a str,
    routes: &'a [String],
    priority: Option<u32>,
    channel_id: Option<&'a str>,
}

#[derive(Serialize)]
struct SendPacketRequest<'a> {
    destination_routing_address: &'a str,
    amount: u64,
    data: &'a [u8],
    timeout_ms: u64,
}

#[derive(Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
enum SendPacketResponse {
    Fulfill { data: Vec<u8> },
    Reject { error_code: String, error_message: String },
}

#[derive(Serialize)]
struct OpenChannelRequest<'a> {
    peer: String,
    chain: &'a str,
    token: Option<&'a str>,
    initial_deposit: u64,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct ChannelInfoResponse {
    channel_id: String,
    state: String,
    deposit: u64,
    balance: u64,
}

impl From<ChannelInfoResponse> for ChannelInfo {
    fn from(r: ChannelInfoResponse) -> Self {
        ChannelInfo {
            channel_id: r.channel_id,
            state: if r.state == "open" { ChannelState::Open } else { ChannelState::Closed },
            deposit: r.deposit,
            balance: r.balance,
        }
    }
}

#[async_trait]
impl Connector for RemoteConnector {
    async fn register_peer(
        &self,
        peer: PeerId,
        transport_endpoint: String,
        routing_address: String,
        routes: Vec<String>,
        priority: Option<u32>,
        channel_id: Option<String>,
    ) -> Result<()> {
        let peer_hex = starling_crypto::peer_id_to_string(&peer);
        self.retry
            .execute(|| async {
                let _: serde_json::Value = self
                    .post(
                        "/peers",
                        &RegisterPeerRequest {
                            peer: peer_hex.clone(),
                            transport_endpoint: &transport_endpoint,
                            routing_address: &routing_address,
                            routes: &routes,
                            priority,
                            channel_id: channel_id.as_deref(),
                        },
                    )
                    .await?;
                Ok(())
            })
            .await
    }

    async fn remove_peer(&self, peer: PeerId) -> Result<()> {
        let peer_hex = starling_crypto::peer_id_to_string(&peer);
        let url = format!("{}/peers/{}", self.base_url, peer_hex);
        self.retry
            .execute(|| async {
                self.client
                    .delete(&url)
                    .send()
                    .await
                    .map_err(|e| ConnectorError::Network(e.to_string()))?;
                Ok(())
            })
            .await
    }

    async fn send_packet(
        &self,
        destination_routing_address: &str,
        amount: u64,
        data: Vec<u8>,
        timeout_ms: u64,
    ) -> Result<PacketOutcome> {
        let response: SendPacketResponse = self
            .retry
            .execute(|| async {
                self.post(
                    "/packets",
                    &SendPacketRequest { destination_routing_address, amount, data: &data, timeout_ms },
                )
                .await
            })
            .await?;

        Ok(match response {
            SendPacketResponse::Fulfill { data } => PacketOutcome::Fulfill { data },
            SendPacketResponse::Reject { error_code, error_message } => {
                PacketOutcome::Reject { code: error_code, message: error_message }
            }
        })
    }

    async fn open_channel(
        &self,
        peer: PeerId,
        chain: ChainId,
        token: Option<String>,
        initial_deposit: u64,
        timeout_secs: u64,
    ) -> Result<ChannelInfo> {
        let peer_hex = starling_crypto::peer_id_to_string(&peer);
        let response: ChannelInfoResponse = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.retry.execute(|| async {
                self.post(
                    "/channels",
                    &OpenChannelRequest {
                        peer: peer_hex.clone(),
                        chain: &chain,
                        token: token.as_deref(),
                        initial_deposit,
                        timeout_secs,
                    },
                )
                .await
            }),
        )
        .await
        .map_err(|_| ConnectorError::ChannelOpenTimeout(timeout_secs * 1000))??;

        Ok(response.into())
    }

    async fn channel_state(&self, channel_id: &str) -> Result<ChannelInfo> {
        let url = format!("{}/channels/{}", self.base_url, channel_id);
        let response: ChannelInfoResponse = self
            .retry
            .execute(|| async {
                let resp = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ConnectorError::Network(e.to_string()))?;
                if resp.status().as_u16() == 404 {
                    return Err(ConnectorError::UnknownChannel(channel_id.to_string()));
                }
                let bytes = resp.bytes().await.map_err(|e| ConnectorError::Network(e.to_string()))?;
                Ok(serde_json::from_slice(&bytes)?)
            })
            .await?;
        Ok(response.into())
    }

    fn register_packet_handler(&self, _handler: PacketHandler) {
        // The remote connector receives inbound packets via its own
        // webhook/poll mechanism (wired up by the node binary, §10), not
        // through this in-process callback — registration is a no-op here
        // by design, matching the direct/remote split in §4.7.
    }
}
