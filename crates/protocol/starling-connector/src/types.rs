//! Shapes shared by every [`crate::Connector`] implementation.

use starling_crypto::PeerId;
use starling_types::ChainId;

/// A peer's routing-table entry (§3 "Peer table").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRoute {
    pub peer: PeerId,
    pub transport_endpoint: String,
    pub routing_address: String,
    pub routes: Vec<String>,
    pub priority: Option<u32>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Closed,
}

/// Result of `openChannel`/`channelState` (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub state: ChannelState,
    pub deposit: u64,
    pub balance: u64,
}

/// Outcome of `sendPacket` (§4.7): either the destination fulfilled the
/// packet with response data, or rejected it with an ILP-style code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    Fulfill { data: Vec<u8> },
    Reject { code: String, message: String },
}

/// A packet delivered to a locally registered handler (§4.7
/// `registerPacketHandler`).
#[derive(Debug, Clone)]
pub struct IncomingPacket {
    pub source_routing_address: String,
    pub amount: u64,
    pub data: Vec<u8>,
}

/// The function the connector invokes for each inbound packet; returns the
/// fulfill-or-reject decision. Boxed so both the direct and remote
/// implementations can hold the same handler type.
pub type PacketHandler = std::sync::Arc<dyn Fn(IncomingPacket) -> PacketOutcome + Send + Sync>;

pub type Chain = ChainId;
