//! Responder side: chain negotiation and channel opening (§4.5 steps 1-5).

use std::time::{SystemTime, UNIX_EPOCH};

use starling_connector::Connector;
use starling_crypto::{PeerId, PrivateKey, SealPrivateKey, SealPublicKey};
use starling_types::constants::{KIND_HANDSHAKE_RESPONSE, MAX_CLOCK_SKEW_MS};
use starling_types::message::Tag;
use starling_types::{ChainId, HandshakeRequestPayload, HandshakeResponsePayload, SignedMessage};
use starling_types::HandshakeError as NegotiationError;

use crate::error::{HandshakeError, Result};
use crate::payload::{open_payload, seal_payload};
use crate::rate_limit::HandshakeRateLimiter;
use crate::request::{TAG_PEER, TAG_REQUEST_ID};

/// Everything about the responder's own peer needed to answer a handshake,
/// distinct from a full `PeerRecord` so this crate doesn't need to know how
/// peer records are published.
pub struct ResponderIdentity {
    pub peer: PeerId,
    pub signing_key: PrivateKey,
    pub seal_key: SealPrivateKey,
    pub routing_address: String,
    pub supported_chains: Vec<ChainId>,
    pub settlement_addresses: std::collections::BTreeMap<ChainId, String>,
    pub preferred_tokens: std::collections::BTreeMap<ChainId, String>,
}

pub struct NegotiationParams {
    pub initial_deposit: u64,
    pub settlement_timeout_secs: u64,
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as u64
}

/// Pick the chain both sides can settle on, preferring the requester's
/// preferred-token chain, then the responder's, then the first shared chain.
fn pick_chain(
    requester: &HandshakeRequestPayload,
    responder: &ResponderIdentity,
) -> Option<ChainId> {
    let shared = starling_valid::intersect_chains(&requester.supported_chains, &responder.supported_chains).ok()?;

    shared
        .iter()
        .find(|c| requester.preferred_tokens.contains_key(**c))
        .or_else(|| shared.iter().find(|c| responder.preferred_tokens.contains_key(**c)))
        .or_else(|| shared.first())
        .cloned()
}

fn error_response(
    request_id: &str,
    error: NegotiationError,
    responder: &ResponderIdentity,
    requester_seal_pub: &SealPublicKey,
    requester: PeerId,
    request_msg_id: starling_crypto::Hash,
    created_at: u64,
) -> Result<SignedMessage> {
    let payload = HandshakeResponsePayload {
        request_id: request_id.to_string(),
        destination_address: responder.routing_address.clone(),
        negotiated_chain: None,
        settlement_address: None,
        channel_id: None,
        settlement_timeout_secs: None,
        error: Some(error),
    };
    build_response(responder, requester_seal_pub, requester, request_msg_id, &payload, created_at)
}

fn build_response(
    responder: &ResponderIdentity,
    requester_seal_pub: &SealPublicKey,
    requester: PeerId,
    request_msg_id: starling_crypto::Hash,
    payload: &HandshakeResponsePayload,
    created_at: u64,
) -> Result<SignedMessage> {
    let content = seal_payload(&responder.seal_key, requester_seal_pub, payload)?;
    let tags: Vec<Tag> = vec![
        vec![TAG_PEER.to_string(), starling_crypto::peer_id_to_string(&requester)],
        vec![TAG_REQUEST_ID.to_string(), payload.request_id.clone()],
        vec!["e".to_string(), request_msg_id.to_string()],
    ];
    Ok(starling_wire::sign_message(
        &responder.signing_key,
        responder.peer,
        created_at,
        KIND_HANDSHAKE_RESPONSE,
        tags,
        content,
    ))
}

/// Handle an inbound `HS_REQ`: decrypt, negotiate a chain, open a channel,
/// and return the signed `HS_RES` to send back as fulfill data.
///
/// `request_msg` is assumed already signature-verified by the caller (C9).
pub async fn handle_request(
    connector: &dyn Connector,
    responder: &ResponderIdentity,
    requester_seal_pub: &SealPublicKey,
    rate_limiter: &HandshakeRateLimiter,
    request_msg: &SignedMessage,
    response_created_at: u64,
) -> Result<SignedMessage> {
    let requester = request_msg.author;

    if !rate_limiter.check(requester) {
        return Err(HandshakeError::RateLimited(requester));
    }

    if starling_valid::validate_freshness(request_msg.created_at, now_ms()).is_err() {
        return Err(HandshakeError::Stale(request_msg.id.to_string()));
    }

    let request: HandshakeRequestPayload =
        open_payload(&responder.seal_key, requester_seal_pub, &request_msg.content)?;

    let Some(chain) = pick_chain(&request, responder) else {
        return error_response(
            &request.request_id,
            NegotiationError::ChainMismatch,
            responder,
            requester_seal_pub,
            requester,
            request_msg.id,
            response_created_at,
        );
    };

    let token = request
        .preferred_tokens
        .get(&chain)
        .or_else(|| responder.preferred_tokens.get(&chain))
        .cloned();

    let params = NegotiationParams {
        initial_deposit: 0,
        settlement_timeout_secs: 30,
    };

    let channel = match connector
        .open_channel(requester, chain.clone(), token, params.initial_deposit, params.settlement_timeout_secs)
        .await
    {
        Ok(channel) => channel,
        Err(starling_connector::ConnectorError::ChannelOpenTimeout(_)) => {
            return error_response(
                &request.request_id,
                NegotiationError::ChannelOpenTimeout,
                responder,
                requester_seal_pub,
                requester,
                request_msg.id,
                response_created_at,
            );
        }
        Err(e) => {
            return error_response(
                &request.request_id,
                NegotiationError::ChannelOpenFailed(e.to_string()),
                responder,
                requester_seal_pub,
                requester,
                request_msg.id,
                response_created_at,
            );
        }
    };

    let settlement_address = responder.settlement_addresses.get(&chain).cloned();
    let payload = HandshakeResponsePayload {
        request_id: request.request_id.clone(),
        destination_address: responder.routing_address.clone(),
        negotiated_chain: Some(chain),
        settlement_address,
        channel_id: Some(channel.channel_id),
        settlement_timeout_secs: Some(params.settlement_timeout_secs),
        error: None,
    };
    build_response(responder, requester_seal_pub, requester, request_msg.id, &payload, response_created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_connector::{DirectConnector, DirectNetwork};
    use std::time::Duration;

    fn identity(routing_address: &str, chains: Vec<&str>) -> (ResponderIdentity, SealPublicKey) {
        let (sk, pk) = starling_crypto::generate_identity();
        let peer = starling_crypto::peer_id_from_public_key(&pk);
        let (seal_priv, seal_pub) = starling_crypto::seal::generate_seal_keypair();
        (
            ResponderIdentity {
                peer,
                signing_key: sk,
                seal_key: seal_priv,
                routing_address: routing_address.to_string(),
                supported_chains: chains.into_iter().map(String::from).collect(),
                settlement_addresses: Default::default(),
                preferred_tokens: Default::default(),
            },
            seal_pub,
        )
    }

    #[test]
    fn pick_chain_prefers_requester_token_chain() {
        let (responder, _) = identity("g.bob", vec!["hedera:testnet", "eth:sepolia"]);
        let mut requester_tokens = std::collections::BTreeMap::new();
        requester_tokens.insert("eth:sepolia".to_string(), "0xusdc".to_string());
        let request = HandshakeRequestPayload {
            request_id: "r1".into(),
            supported_chains: vec!["hedera:testnet".into(), "eth:sepolia".into()],
            settlement_addresses: Default::default(),
            preferred_tokens: requester_tokens,
        };
        assert_eq!(pick_chain(&request, &responder), Some("eth:sepolia".to_string()));
    }

    #[test]
    fn pick_chain_falls_back_to_first_shared() {
        let (responder, _) = identity("g.bob", vec!["hedera:testnet"]);
        let request = HandshakeRequestPayload {
            request_id: "r1".into(),
            supported_chains: vec!["hedera:testnet".into()],
            settlement_addresses: Default::default(),
            preferred_tokens: Default::default(),
        };
        assert_eq!(pick_chain(&request, &responder), Some("hedera:testnet".to_string()));
    }

    #[test]
    fn pick_chain_none_when_disjoint() {
        let (responder, _) = identity("g.bob", vec!["hedera:testnet"]);
        let request = HandshakeRequestPayload {
            request_id: "r1".into(),
            supported_chains: vec!["eth:sepolia".into()],
            settlement_addresses: Default::default(),
            preferred_tokens: Default::default(),
        };
        assert_eq!(pick_chain(&request, &responder), None);
    }

    #[tokio::test]
    async fn handle_request_opens_channel_on_shared_chain() {
        let (responder, responder_seal_pub) = identity("g.bob", vec!["hedera:testnet"]);
        let (requester_sk, requester_pk) = starling_crypto::generate_identity();
        let requester_peer = starling_crypto::peer_id_from_public_key(&requester_pk);
        let (requester_seal_priv, requester_seal_pub) = starling_crypto::seal::generate_seal_keypair();

        let request_payload = HandshakeRequestPayload {
            request_id: "abc".into(),
            supported_chains: vec!["hedera:testnet".into()],
            settlement_addresses: Default::default(),
            preferred_tokens: Default::default(),
        };
        let content =
            seal_payload(&requester_seal_priv, &responder_seal_pub, &request_payload).unwrap();
        let request_msg = starling_wire::sign_message(
            &requester_sk,
            requester_peer,
            now_ms(),
            starling_types::constants::KIND_HANDSHAKE_REQUEST,
            vec![],
            content,
        );

        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.bob");
        let rate_limiter = HandshakeRateLimiter::default();

        let response = handle_request(
            connector.as_ref(),
            &responder,
            &requester_seal_pub,
            &rate_limiter,
            &request_msg,
            now_ms(),
        )
        .await
        .unwrap();

        let decoded: HandshakeResponsePayload =
            open_payload(&requester_seal_priv, &responder_seal_pub, &response.content).unwrap();
        assert!(decoded.error.is_none());
        assert_eq!(decoded.negotiated_chain, Some("hedera:testnet".to_string()));
        assert!(decoded.channel_id.is_some());
    }

    #[tokio::test]
    async fn handle_request_rejects_disjoint_chains() {
        let (responder, responder_seal_pub) = identity("g.bob", vec!["hedera:testnet"]);
        let (requester_sk, requester_pk) = starling_crypto::generate_identity();
        let requester_peer = starling_crypto::peer_id_from_public_key(&requester_pk);
        let (requester_seal_priv, requester_seal_pub) = starling_crypto::seal::generate_seal_keypair();

        let request_payload = HandshakeRequestPayload {
            request_id: "abc".into(),
            supported_chains: vec!["eth:sepolia".into()],
            settlement_addresses: Default::default(),
            preferred_tokens: Default::default(),
        };
        let content =
            seal_payload(&requester_seal_priv, &responder_seal_pub, &request_payload).unwrap();
        let request_msg = starling_wire::sign_message(
            &requester_sk,
            requester_peer,
            now_ms(),
            starling_types::constants::KIND_HANDSHAKE_REQUEST,
            vec![],
            content,
        );

        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.bob");
        let rate_limiter = HandshakeRateLimiter::default();

        let response = handle_request(
            connector.as_ref(),
            &responder,
            &requester_seal_pub,
            &rate_limiter,
            &request_msg,
            now_ms(),
        )
        .await
        .unwrap();

        let decoded: HandshakeResponsePayload =
            open_payload(&requester_seal_priv, &responder_seal_pub, &response.content).unwrap();
        assert_eq!(decoded.error, Some(NegotiationError::ChainMismatch));
    }

    #[tokio::test]
    async fn stale_request_is_rejected_before_decryption() {
        let (responder, responder_seal_pub) = identity("g.bob", vec!["hedera:testnet"]);
        let (requester_sk, requester_pk) = starling_crypto::generate_identity();
        let requester_peer = starling_crypto::peer_id_from_public_key(&requester_pk);
        let (requester_seal_priv, requester_seal_pub) = starling_crypto::seal::generate_seal_keypair();

        let request_payload = HandshakeRequestPayload {
            request_id: "abc".into(),
            supported_chains: vec!["hedera:testnet".into()],
            settlement_addresses: Default::default(),
            preferred_tokens: Default::default(),
        };
        let content =
            seal_payload(&requester_seal_priv, &responder_seal_pub, &request_payload).unwrap();
        let stale_created_at = now_ms() - MAX_CLOCK_SKEW_MS - Duration::from_secs(60).as_millis() as u64;
        let request_msg = starling_wire::sign_message(
            &requester_sk,
            requester_peer,
            stale_created_at,
            starling_types::constants::KIND_HANDSHAKE_REQUEST,
            vec![],
            content,
        );

        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.bob");
        let rate_limiter = HandshakeRateLimiter::default();

        let result = handle_request(
            connector.as_ref(),
            &responder,
            &requester_seal_pub,
            &rate_limiter,
            &request_msg,
            now_ms(),
        )
        .await;

        assert!(matches!(result, Err(HandshakeError::Stale(_))));
    }

    #[tokio::test]
    async fn rate_limited_peer_is_rejected() {
        let (responder, _responder_seal_pub) = identity("g.bob", vec!["hedera:testnet"]);
        let (requester_sk, requester_pk) = starling_crypto::generate_identity();
        let requester_peer = starling_crypto::peer_id_from_public_key(&requester_pk);
        let (_requester_seal_priv, requester_seal_pub) = starling_crypto::seal::generate_seal_keypair();

        let request_msg = starling_wire::sign_message(
            &requester_sk,
            requester_peer,
            now_ms(),
            starling_types::constants::KIND_HANDSHAKE_REQUEST,
            vec![],
            "unreadable-without-first-check".to_string(),
        );

        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.bob");
        let rate_limiter = HandshakeRateLimiter::new(0, Duration::from_secs(60));

        let result = handle_request(
            connector.as_ref(),
            &responder,
            &requester_seal_pub,
            &rate_limiter,
            &request_msg,
            now_ms(),
        )
        .await;

        assert!(matches!(result, Err(HandshakeError::RateLimited(_))));
    }
}
