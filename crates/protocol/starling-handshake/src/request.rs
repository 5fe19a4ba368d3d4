//! Requester side: build `HS_REQ` and track pending responses (§4.5).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rand::RngCore;
use starling_crypto::{PeerId, PrivateKey, SealPrivateKey, SealPublicKey};
use starling_types::{message::Tag, ChainId, HandshakeRequestPayload, SignedMessage};
use tokio::sync::oneshot;

use crate::error::{HandshakeError, Result};
use crate::payload::seal_payload;

pub const TAG_PEER: &str = "p";
pub const TAG_REQUEST_ID: &str = "request_id";

/// A fresh, unpredictable request id for one handshake attempt.
pub fn generate_request_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build and sign an `HS_REQ` message addressed to `peer`, sealed so only
/// `peer_seal_pub`'s holder can read it.
#[allow(clippy::too_many_arguments)]
pub fn build_request(
    self_priv: &PrivateKey,
    self_peer: PeerId,
    self_seal_priv: &SealPrivateKey,
    peer: PeerId,
    peer_seal_pub: &SealPublicKey,
    request_id: &str,
    supported_chains: Vec<ChainId>,
    settlement_addresses: std::collections::BTreeMap<ChainId, String>,
    preferred_tokens: std::collections::BTreeMap<ChainId, String>,
    created_at: u64,
) -> Result<SignedMessage> {
    let payload = HandshakeRequestPayload {
        request_id: request_id.to_string(),
        supported_chains,
        settlement_addresses,
        preferred_tokens,
    };
    let content = seal_payload(self_seal_priv, peer_seal_pub, &payload)?;
    let tags: Vec<Tag> = vec![
        vec![TAG_PEER.to_string(), starling_crypto::peer_id_to_string(&peer)],
        vec![TAG_REQUEST_ID.to_string(), request_id.to_string()],
    ];
    Ok(starling_wire::sign_message(
        self_priv,
        self_peer,
        created_at,
        starling_types::constants::KIND_HANDSHAKE_REQUEST,
        tags,
        content,
    ))
}

/// Tracks in-flight requests so a delivered `HS_RES` (matched by
/// `request_id`) can be routed back to whatever code is awaiting it.
#[derive(Default)]
pub struct PendingRequests {
    waiters: Mutex<HashMap<String, oneshot::Sender<SignedMessage>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request id, returning a receiver that resolves when the
    /// matching response is delivered via [`Self::complete`].
    pub fn register(&self, request_id: impl Into<String>) -> oneshot::Receiver<SignedMessage> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().expect("pending requests lock poisoned").insert(request_id.into(), tx);
        rx
    }

    /// Resolve the waiter for `response`'s `request_id` tag, if any is still
    /// pending. Returns `false` if no matching waiter was registered (already
    /// resolved, timed out, or never sent).
    pub fn complete(&self, request_id: &str, response: SignedMessage) -> bool {
        let sender = self.waiters.lock().expect("pending requests lock poisoned").remove(request_id);
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    pub fn cancel(&self, request_id: &str) {
        self.waiters.lock().expect("pending requests lock poisoned").remove(request_id);
    }
}

/// Await the response for `request_id`, giving up after `timeout`.
pub async fn await_response(
    rx: oneshot::Receiver<SignedMessage>,
    timeout: Duration,
) -> Result<SignedMessage> {
    tokio::time::timeout(timeout, rx)
        .await
        .map_err(|_| HandshakeError::UnknownRequestId("timed out waiting for response".to_string()))?
        .map_err(|_| HandshakeError::UnknownRequestId("responder channel dropped".to_string()))
}
