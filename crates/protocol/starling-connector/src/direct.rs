//! In-process connector: zero-latency packet delivery between
//! [`DirectConnector`]s sharing a [`DirectNetwork`]. Used for bootstrap
//! testing, single-process demos, and any setup where the relay and the
//! connector run in the same node without a real settlement backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use starling_crypto::PeerId;
use starling_types::ChainId;

use crate::error::{ConnectorError, Result};
use crate::traits::Connector;
use crate::types::{ChannelInfo, ChannelState, IncomingPacket, PacketHandler, PacketOutcome, PeerRoute};

/// A shared routing table mapping routing addresses to the
/// [`DirectConnector`] registered at that address, so one node's
/// `send_packet` can reach another's handler directly.
#[derive(Default)]
pub struct DirectNetwork {
    nodes: RwLock<HashMap<String, Arc<DirectConnector>>>,
}

impl DirectNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

pub struct DirectConnector {
    network: Arc<DirectNetwork>,
    own_routing_address: String,
    peers: RwLock<HashMap<PeerId, PeerRoute>>,
    channels: RwLock<HashMap<String, ChannelInfo>>,
    handler: RwLock<Option<PacketHandler>>,
    next_channel_id: AtomicU64,
}

impl DirectConnector {
    /// Construct a connector and register it with `network` under
    /// `own_routing_address`. Any previous registration at that address is
    /// replaced.
    pub fn new(network: Arc<DirectNetwork>, own_routing_address: impl Into<String>) -> Arc<Self> {
        let own_routing_address = own_routing_address.into();
        let connector = Arc::new(Self {
            network: Arc::clone(&network),
            own_routing_address: own_routing_address.clone(),
            peers: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            handler: RwLock::new(None),
            next_channel_id: AtomicU64::new(1),
        });
        network
            .nodes
            .write()
            .expect("direct network lock poisoned")
            .insert(own_routing_address, Arc::clone(&connector));
        connector
    }

    fn deliver(&self, source_routing_address: &str, amount: u64, data: Vec<u8>) -> PacketOutcome {
        let handler = self.handler.read().expect("handler lock poisoned").clone();
        match handler {
            Some(handler) => handler(IncomingPacket {
                source_routing_address: source_routing_address.to_string(),
                amount,
                data,
            }),
            None => PacketOutcome::Reject {
                code: "F00".to_string(),
                message: "no packet handler registered".to_string(),
            },
        }
    }
}

#[async_trait]
impl Connector for DirectConnector {
    async fn register_peer(
        &self,
        peer: PeerId,
        transport_endpoint: String,
        routing_address: String,
        routes: Vec<String>,
        priority: Option<u32>,
        channel_id: Option<String>,
    ) -> Result<()> {
        self.peers.write().expect("peers lock poisoned").insert(
            peer,
            PeerRoute { peer, transport_endpoint, routing_address, routes, priority, channel_id },
        );
        Ok(())
    }

    async fn remove_peer(&self, peer: PeerId) -> Result<()> {
        self.peers.write().expect("peers lock poisoned").remove(&peer);
        Ok(())
    }

    async fn send_packet(
        &self,
        destination_routing_address: &str,
        amount: u64,
        data: Vec<u8>,
        _timeout_ms: u64,
    ) -> Result<PacketOutcome> {
        let destination = {
            let nodes = self.network.nodes.read().expect("direct network lock poisoned");
            nodes.get(destination_routing_address).cloned()
        };
        let Some(destination) = destination else {
            return Err(ConnectorError::NoRoute(destination_routing_address.to_string()));
        };
        Ok(destination.deliver(&self.own_routing_address, amount, data))
    }

    async fn open_channel(
        &self,
        _peer: PeerId,
        _chain: ChainId,
        _token: Option<String>,
        initial_deposit: u64,
        _timeout_secs: u64,
    ) -> Result<ChannelInfo> {
        let id = self.next_channel_id.fetch_add(1, Ordering::SeqCst);
        let channel = ChannelInfo {
            channel_id: format!("direct-{id}"),
            state: ChannelState::Open,
            deposit: initial_deposit,
            balance: initial_deposit,
        };
        self.channels
            .write()
            .expect("channels lock poisoned")
            .insert(channel.channel_id.clone(), channel.clone());
        Ok(channel)
    }

    async fn channel_state(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.channels
            .read()
            .expect("channels lock poisoned")
            .get(channel_id)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownChannel(channel_id.to_string()))
    }

    fn register_packet_handler(&self, handler: PacketHandler) {
        *self.handler.write().expect("handler lock poisoned") = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> PeerId {
        let (_, pk) = starling_crypto::generate_identity();
        starling_crypto::peer_id_from_public_key(&pk)
    }

    #[tokio::test]
    async fn delivers_packet_to_registered_handler() {
        let network = DirectNetwork::new();
        let alice = DirectConnector::new(Arc::clone(&network), "g.alice");
        let bob = DirectConnector::new(Arc::clone(&network), "g.bob");

        bob.register_packet_handler(Arc::new(|packet| PacketOutcome::Fulfill {
            data: packet.data,
        }));

        let outcome = alice.send_packet("g.bob", 100, b"hi".to_vec(), 1000).await.unwrap();
        assert_eq!(outcome, PacketOutcome::Fulfill { data: b"hi".to_vec() });
    }

    #[tokio::test]
    async fn unregistered_destination_is_no_route() {
        let network = DirectNetwork::new();
        let alice = DirectConnector::new(Arc::clone(&network), "g.alice");
        let err = alice.send_packet("g.nobody", 0, vec![], 1000).await.unwrap_err();
        assert!(matches!(err, ConnectorError::NoRoute(_)));
    }

    #[tokio::test]
    async fn destination_without_handler_rejects() {
        let network = DirectNetwork::new();
        let alice = DirectConnector::new(Arc::clone(&network), "g.alice");
        let _bob = DirectConnector::new(Arc::clone(&network), "g.bob");

        let outcome = alice.send_packet("g.bob", 0, vec![], 1000).await.unwrap();
        assert!(matches!(outcome, PacketOutcome::Reject { .. }));
    }

    #[tokio::test]
    async fn open_channel_is_immediately_open() {
        let network = DirectNetwork::new();
        let alice = DirectConnector::new(network, "g.alice");
        let channel = alice
            .open_channel(peer(), "hedera:testnet".to_string(), None, 1000, 30)
            .await
            .unwrap();
        assert_eq!(channel.state, ChannelState::Open);

        let fetched = alice.channel_state(&channel.channel_id).await.unwrap();
        assert_eq!(fetched, channel);
    }

    #[tokio::test]
    async fn unknown_channel_is_an_error() {
        let network = DirectNetwork::new();
        let alice = DirectConnector::new(network, "g.alice");
        assert!(matches!(
            alice.channel_state("nonexistent").await,
            Err(ConnectorError::UnknownChannel(_))
        ));
    }
}
