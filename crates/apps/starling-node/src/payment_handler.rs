//! Payment handler (C9, §4.9): the connector's callback for every inbound
//! packet. Pure from the connector's perspective — it only ever sees
//! fulfill/reject, never this module's internals.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use starling_connector::{Connector, IncomingPacket, PacketOutcome};
use starling_handshake::{HandshakeRateLimiter, ResponderIdentity};
use starling_pricing::PricingEngine;
use starling_relay::{should_broadcast, Broadcaster, PaymentContext, WriteGate};
use starling_store::{EventStore, Filter, PutOutcome};
use starling_types::constants::{KIND_DELETION, KIND_HANDSHAKE_REQUEST};
use starling_types::{classify, KindClass, PeerRecord, RejectCode, SignedMessage};
use starling_wire::envelope::{decode_packet_payload, encode_packet_payload};

use crate::dispatch;
use crate::identity::NodeIdentity;
use crate::peer_table::PeerTable;

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as u64
}

/// Everything the payment handler needs, shared across every invocation
/// (the connector may call it concurrently for different inbound packets).
pub struct PaymentHandlerContext<S: EventStore> {
    pub store: Arc<S>,
    pub pricing: Arc<PricingEngine>,
    pub write_gate: Arc<WriteGate<S>>,
    pub broadcaster: Broadcaster,
    pub peers: Arc<PeerTable>,
    pub rate_limiter: Arc<HandshakeRateLimiter>,
    pub identity: Arc<NodeIdentity>,
    pub responder: ResponderIdentity,
    pub peer_gating_enabled: bool,
}

fn reject(code: RejectCode, message: impl Into<String>) -> PacketOutcome {
    PacketOutcome::Reject { code: code.wire_code().to_string(), message: message.into() }
}

/// Look up the requester's advertised seal key from their stored
/// `PeerRecord` (§4.8 Phase 2 already registered it passively). Without
/// this, the responder has no way to open a sealed `HS_REQ`.
fn lookup_seal_public_key<S: EventStore>(store: &S, author: &starling_crypto::PeerId) -> Option<starling_crypto::SealPublicKey> {
    let filter = Filter {
        authors: vec![starling_crypto::peer_id_to_string(author)],
        kinds: vec![starling_types::constants::KIND_PEER_RECORD],
        limit: Some(1),
        ..Filter::default()
    };
    let matches = store.query_many(&[filter]).ok()?;
    let record_msg = matches.into_iter().next()?;
    let record: PeerRecord = serde_json::from_str(&record_msg.content).ok()?;
    Some(record.seal_public_key)
}

/// Step through the C9 contract for one inbound packet.
pub async fn handle_packet<S: EventStore>(
    ctx: &PaymentHandlerContext<S>,
    connector: &dyn Connector,
    packet: IncomingPacket,
) -> PacketOutcome {
    let msg: SignedMessage = match decode_packet_payload(&packet.data) {
        Ok(msg) => msg,
        Err(e) => return reject(RejectCode::BadRequest, format!("malformed envelope: {e}")),
    };

    if starling_valid::validate_signature(&msg).is_err() {
        return reject(RejectCode::BadRequest, "bad signature");
    }

    let gating_applies = ctx.peer_gating_enabled && msg.kind != KIND_HANDSHAKE_REQUEST;
    if starling_valid::validate_peered(&msg.author, &ctx.peers.known_peers(), gating_applies).is_err() {
        return reject(RejectCode::NotPeered, "sender is not in the current peer set");
    }

    let quote = ctx.pricing.price_for(&msg);
    if starling_valid::validate_payment(packet.amount, quote).is_err() {
        let mut outcome = reject(RejectCode::InsufficientPayment, format!("payment-required: {}", quote.amount));
        if let PacketOutcome::Reject { message, .. } = &mut outcome {
            *message = format!("{message} required={}", quote.amount);
        }
        return outcome;
    }

    match classify(msg.kind) {
        _ if msg.kind == KIND_HANDSHAKE_REQUEST => handle_handshake_request(ctx, connector, msg).await,
        _ if msg.kind == KIND_DELETION => handle_deletion(ctx, msg),
        KindClass::Ephemeral => {
            ctx.broadcaster.publish(msg);
            PacketOutcome::Fulfill { data: Vec::new() }
        }
        KindClass::Regular | KindClass::Replaceable | KindClass::ParameterizedReplaceable => {
            store_and_dispatch(ctx, msg)
        }
    }
}

async fn handle_handshake_request<S: EventStore>(
    ctx: &PaymentHandlerContext<S>,
    connector: &dyn Connector,
    msg: SignedMessage,
) -> PacketOutcome {
    let Some(requester_seal_pub) = lookup_seal_public_key(ctx.store.as_ref(), &msg.author) else {
        return reject(RejectCode::BadRequest, "no peer record on file for this requester");
    };

    match starling_handshake::handle_request(connector, &ctx.responder, &requester_seal_pub, &ctx.rate_limiter, &msg, now_ms()).await {
        Ok(response) => {
            let tracked = ctx.peers.ensure(msg.author);
            match encode_packet_payload(&response) {
                Ok(data) => {
                    tracked.lock().expect("peer lock poisoned").last_handshake_attempt_ms = Some(now_ms());
                    PacketOutcome::Fulfill { data }
                }
                Err(e) => reject(RejectCode::Internal, format!("failed to encode handshake response: {e}")),
            }
        }
        Err(e) => reject(RejectCode::Internal, e.to_string()),
    }
}

fn handle_deletion<S: EventStore>(ctx: &PaymentHandlerContext<S>, msg: SignedMessage) -> PacketOutcome {
    match ctx.store.apply_deletion(&msg) {
        Ok(_removed) => PacketOutcome::Fulfill { data: Vec::new() },
        Err(e) => reject(RejectCode::Internal, e.to_string()),
    }
}

fn store_and_dispatch<S: EventStore>(ctx: &PaymentHandlerContext<S>, msg: SignedMessage) -> PacketOutcome {
    let outcome = match ctx.write_gate.process(&msg, PaymentContext::Verified) {
        Ok(starling_relay::WriteOutcome::Accepted(outcome)) => outcome,
        Ok(starling_relay::WriteOutcome::Rejected(reason)) => return reject(RejectCode::BadRequest, reason),
        Err(e) => return reject(RejectCode::Internal, e.to_string()),
    };

    if should_broadcast(outcome) {
        ctx.broadcaster.publish(msg.clone());
    }
    if matches!(outcome, PutOutcome::Stored) {
        dispatch::dispatch(&msg);
    }
    PacketOutcome::Fulfill { data: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_connector::{DirectConnector, DirectNetwork};
    use starling_store::SqliteEventStore;
    use std::collections::BTreeMap;

    fn context() -> (PaymentHandlerContext<SqliteEventStore>, starling_crypto::PrivateKey) {
        let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let (owner_sk, owner_pk) = starling_crypto::generate_identity();
        let owner = starling_crypto::peer_id_from_public_key(&owner_pk);
        let pricing = Arc::new(PricingEngine::new(starling_pricing::PricingPolicy::new(owner, 6)));
        let write_gate = Arc::new(WriteGate::new(store.clone(), pricing.clone()));
        let (seal_priv, seal_pub) = starling_crypto::generate_seal_keypair();

        let responder = ResponderIdentity {
            peer: owner,
            signing_key: owner_sk.clone(),
            seal_key: seal_priv.clone(),
            routing_address: "g.owner".to_string(),
            supported_chains: vec!["evm:base:8453".to_string()],
            settlement_addresses: BTreeMap::new(),
            preferred_tokens: BTreeMap::new(),
        };

        let identity = Arc::new(crate::identity::NodeIdentity {
            peer: owner,
            signing_key: owner_sk.clone(),
            public_key: owner_pk,
            seal_key: seal_priv,
            seal_public_key: seal_pub,
        });

        let ctx = PaymentHandlerContext {
            store,
            pricing,
            write_gate,
            broadcaster: Broadcaster::default(),
            peers: Arc::new(PeerTable::new()),
            rate_limiter: Arc::new(HandshakeRateLimiter::default()),
            identity,
            responder,
            peer_gating_enabled: false,
        };
        (ctx, owner_sk)
    }

    #[tokio::test]
    async fn malformed_envelope_is_rejected_as_bad_request() {
        let (ctx, _) = context();
        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.owner");
        let packet = IncomingPacket { source_routing_address: "g.other".to_string(), amount: 0, data: vec![0xff, 0x00] };
        let outcome = handle_packet(&ctx, connector.as_ref(), packet).await;
        assert!(matches!(outcome, PacketOutcome::Reject { code, .. } if code == "F00"));
    }

    #[tokio::test]
    async fn underpaid_regular_message_is_rejected_with_required_amount() {
        let (ctx, _) = context();
        ctx.pricing.set_kind_pricing(1, starling_pricing::KindPricing { flat: 500, base_price_per_byte: 0 });
        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.owner");

        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        let msg = starling_wire::sign_message(&sk, author, now_ms(), 1, vec![], "hi".into());
        let data = encode_packet_payload(&msg).unwrap();

        let packet = IncomingPacket { source_routing_address: "g.other".to_string(), amount: 10, data };
        let outcome = handle_packet(&ctx, connector.as_ref(), packet).await;
        match outcome {
            PacketOutcome::Reject { code, message } => {
                assert_eq!(code, "F06");
                assert!(message.contains("500"));
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sufficiently_paid_regular_message_is_stored_and_fulfilled() {
        let (ctx, owner_sk) = context();
        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.owner");

        let owner = ctx.identity.peer;
        let msg = starling_wire::sign_message(&owner_sk, owner, now_ms(), 1, vec![], "hi".into());
        let data = encode_packet_payload(&msg).unwrap();

        let packet = IncomingPacket { source_routing_address: "g.other".to_string(), amount: 0, data };
        let outcome = handle_packet(&ctx, connector.as_ref(), packet).await;
        assert!(matches!(outcome, PacketOutcome::Fulfill { .. }));
        assert!(ctx.store.get(&msg.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn gating_rejects_a_regular_message_from_an_unknown_author() {
        let (mut ctx, _) = context();
        ctx.peer_gating_enabled = true;
        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.owner");

        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        let msg = starling_wire::sign_message(&sk, author, now_ms(), 1, vec![], "hi".into());
        let data = encode_packet_payload(&msg).unwrap();

        let packet = IncomingPacket { source_routing_address: "g.other".to_string(), amount: 0, data };
        let outcome = handle_packet(&ctx, connector.as_ref(), packet).await;
        match outcome {
            PacketOutcome::Reject { message, .. } => assert!(message.contains("not in the current peer set")),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn gating_exempts_handshake_requests_from_peer_membership() {
        let (mut ctx, _) = context();
        ctx.peer_gating_enabled = true;
        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.owner");

        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        let msg = starling_wire::sign_message(&sk, author, now_ms(), KIND_HANDSHAKE_REQUEST, vec![], "sealed-content".into());
        let data = encode_packet_payload(&msg).unwrap();

        let packet = IncomingPacket { source_routing_address: "g.other".to_string(), amount: 0, data };
        let outcome = handle_packet(&ctx, connector.as_ref(), packet).await;
        match outcome {
            PacketOutcome::Reject { message, .. } => assert!(!message.contains("not in the current peer set")),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handshake_request_without_a_known_peer_record_is_rejected() {
        let (ctx, _) = context();
        let network = DirectNetwork::new();
        let connector = DirectConnector::new(network, "g.owner");

        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        let msg = starling_wire::sign_message(&sk, author, now_ms(), KIND_HANDSHAKE_REQUEST, vec![], "sealed-content".into());
        let data = encode_packet_payload(&msg).unwrap();

        let packet = IncomingPacket { source_routing_address: "g.other".to_string(), amount: 0, data };
        let outcome = handle_packet(&ctx, connector.as_ref(), packet).await;
        assert!(matches!(outcome, PacketOutcome::Reject { code, .. } if code == "F00"));
    }
}
