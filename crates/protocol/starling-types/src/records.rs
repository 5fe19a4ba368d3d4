//! Domain payload shapes carried as the `content`/`tags` of specific kinds.
//!
//! These are plain data: nothing here verifies signatures or touches
//! storage. Builders turn a payload into a `SignedMessage` by serializing it
//! into `content` (or `tags`, for the addressable records) and handing it to
//! the wire codec to sign.

use starling_crypto::{PeerId, SealPublicKey};

use crate::message::Tag;

/// A settlement chain identifier, `blockchain:network[:chainId]`.
pub type ChainId = String;

/// Replaceable record (kind `KIND_PEER_RECORD`) advertising how to pay this author.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PeerRecord {
    /// Dot-separated hierarchical packet-routing address, e.g. `g.alice.relay`.
    pub routing_address: String,
    /// Bilateral gossip-transport endpoint, e.g. `wss://relay.alice.example/ws`.
    pub transport_endpoint: String,
    /// Asset code, e.g. `"USD"`.
    pub asset_code: String,
    /// Asset scale (decimal places), e.g. `6` for micro-units.
    pub asset_scale: u8,
    /// Chains this author can settle on, most-preferred first.
    pub supported_chains: Vec<ChainId>,
    /// Per-chain settlement address.
    pub settlement_addresses: std::collections::BTreeMap<ChainId, String>,
    /// Per-chain preferred token contract, if any.
    pub preferred_tokens: std::collections::BTreeMap<ChainId, String>,
    /// Public key used to seal/open handshake payloads addressed to this author.
    pub seal_public_key: SealPublicKey,
}

/// Plaintext of a sealed `HS_REQ` payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HandshakeRequestPayload {
    pub request_id: String,
    pub supported_chains: Vec<ChainId>,
    pub settlement_addresses: std::collections::BTreeMap<ChainId, String>,
    pub preferred_tokens: std::collections::BTreeMap<ChainId, String>,
}

/// Plaintext of a sealed `HS_RES` payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HandshakeResponsePayload {
    pub request_id: String,
    pub destination_address: String,
    pub negotiated_chain: Option<ChainId>,
    pub settlement_address: Option<String>,
    pub channel_id: Option<String>,
    pub settlement_timeout_secs: Option<u64>,
    /// Set when negotiation failed; `None` on success.
    pub error: Option<HandshakeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HandshakeError {
    ChainMismatch,
    ChannelOpenTimeout,
    ChannelOpenFailed(String),
}

/// Tags enumerating followed public keys (replaceable, `KIND_FOLLOW_LIST`).
pub fn followed_keys(tags: &[Tag]) -> Vec<PeerId> {
    tags.iter()
        .filter(|t| t.first().map(|s| s.as_str()) == Some("p"))
        .filter_map(|t| t.get(1))
        .filter_map(|hex| starling_crypto::peer_id_from_string(hex).ok())
        .collect()
}

/// Fields carried by a zap receipt (regular, `KIND_ZAP_RECEIPT`): sender,
/// recipient, amount-with-asset, and a reference to the paid event.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ZapReceiptContent {
    pub sender: PeerId,
    pub recipient: PeerId,
    pub amount: u64,
    pub asset_scale: u8,
    pub paid_event_id: String,
}

/// Fields carried by a label/review message (regular, `KIND_LABEL`): a
/// namespace and zero or more label values within it, plus a subject.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LabelContent {
    pub namespace: String,
    pub labels: Vec<String>,
    pub subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn followed_keys_ignores_non_p_tags() {
        let (_, pk) = starling_crypto::generate_identity();
        let peer = starling_crypto::peer_id_from_public_key(&pk);
        let tags = vec![
            vec!["d".into(), "x".into()],
            vec!["p".into(), starling_crypto::peer_id_to_string(&peer)],
        ];
        assert_eq!(followed_keys(&tags), vec![peer]);
    }
}
