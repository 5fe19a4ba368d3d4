//! The connector's capability contract (C7, §4.7).
//!
//! Two implementations satisfy this trait: [`crate::direct::DirectConnector`]
//! (in-process, zero latency) and [`crate::remote::RemoteConnector`] (HTTP,
//! retry-with-backoff on network errors only). Callers depend only on this
//! trait, never on a concrete implementation.

use async_trait::async_trait;
use starling_crypto::PeerId;
use starling_types::ChainId;

use crate::error::Result;
use crate::types::{ChannelInfo, PacketHandler, PacketOutcome};

#[async_trait]
pub trait Connector: Send + Sync {
    async fn register_peer(
        &self,
        peer: PeerId,
        transport_endpoint: String,
        routing_address: String,
        routes: Vec<String>,
        priority: Option<u32>,
        channel_id: Option<String>,
    ) -> Result<()>;

    async fn remove_peer(&self, peer: PeerId) -> Result<()>;

    async fn send_packet(
        &self,
        destination_routing_address: &str,
        amount: u64,
        data: Vec<u8>,
        timeout_ms: u64,
    ) -> Result<PacketOutcome>;

    /// Synchronous from the caller's perspective: resolves once the channel
    /// is confirmed `open` or `timeout_secs` elapses.
    async fn open_channel(
        &self,
        peer: PeerId,
        chain: ChainId,
        token: Option<String>,
        initial_deposit: u64,
        timeout_secs: u64,
    ) -> Result<ChannelInfo>;

    async fn channel_state(&self, channel_id: &str) -> Result<ChannelInfo>;

    /// Register the callback invoked for each inbound packet. Implementations
    /// hold at most one handler; registering a new one replaces the last.
    fn register_packet_handler(&self, handler: PacketHandler);
}
