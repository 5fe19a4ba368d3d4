//! Shared peer registry (§5 "Peer table: shared; per-peer mutex protects
//! registration/channel updates").

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use starling_crypto::PeerId;
use starling_types::ChainId;

/// What the node knows about one peer, updated as bootstrap (C8) registers it
/// and the periodic trust refresh (§4.8 Phase 5) rewrites its priority.
#[derive(Debug, Clone, Default)]
pub struct TrackedPeer {
    pub routing_address: String,
    pub transport_endpoint: String,
    pub channel_id: Option<String>,
    pub negotiated_chain: Option<ChainId>,
    pub priority: u32,
    pub last_handshake_attempt_ms: Option<u64>,
}

/// An outer `RwLock` guards the map's shape (insert/remove); an inner
/// per-peer `Mutex` lets concurrent registration/channel updates for
/// different peers proceed without contending on each other.
#[derive(Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<PeerId, Arc<Mutex<TrackedPeer>>>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly discovered peer if absent; a no-op if already tracked.
    pub fn ensure(&self, peer: PeerId) -> Arc<Mutex<TrackedPeer>> {
        if let Some(existing) = self.peers.read().expect("peer table lock poisoned").get(&peer) {
            return Arc::clone(existing);
        }
        let mut peers = self.peers.write().expect("peer table lock poisoned");
        Arc::clone(peers.entry(peer).or_insert_with(|| Arc::new(Mutex::new(TrackedPeer::default()))))
    }

    pub fn get(&self, peer: &PeerId) -> Option<Arc<Mutex<TrackedPeer>>> {
        self.peers.read().expect("peer table lock poisoned").get(peer).cloned()
    }

    pub fn remove(&self, peer: &PeerId) {
        self.peers.write().expect("peer table lock poisoned").remove(peer);
    }

    pub fn len(&self) -> usize {
        self.peers.read().expect("peer table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.peers
            .read()
            .expect("peer table lock poisoned")
            .values()
            .filter(|p| p.lock().expect("peer lock poisoned").channel_id.is_some())
            .count()
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.peers.read().expect("peer table lock poisoned").contains_key(peer)
    }

    /// All currently tracked peer ids, for iteration outside the lock.
    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.read().expect("peer table lock poisoned").keys().copied().collect()
    }

    /// A snapshot of tracked peer ids, for gating checks that need set
    /// membership rather than a `Vec` to walk.
    pub fn known_peers(&self) -> HashSet<PeerId> {
        self.peers.read().expect("peer table lock poisoned").keys().copied().collect()
    }
}
