//! The packet-payload envelope (C1): a compact binary encoding of one
//! `SignedMessage`, carried opaquely in a routed packet's data field.
//!
//! Byte-stable by construction: CBOR preserves array/map field order and
//! integer widths deterministically, so `decode(encode(m)) == m` for every
//! `m`. Callers outside this module must treat the bytes as opaque.

use serde::{Deserialize, Serialize};
use starling_types::{SignedMessage, Tag};

use crate::error::{DecodeError, EncodeError};

/// On-the-wire shape of a packet-payload envelope. A plain newtype over
/// `SignedMessage` would also work, but spelling out the fields keeps the
/// CBOR layout stable even if `SignedMessage`'s derive order ever changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnvelopeV1 {
    id: starling_crypto::Hash,
    author: starling_crypto::PeerId,
    created_at: u64,
    kind: u16,
    tags: Vec<Tag>,
    content: String,
    signature: starling_crypto::Signature,
}

impl From<&SignedMessage> for EnvelopeV1 {
    fn from(msg: &SignedMessage) -> Self {
        Self {
            id: msg.id,
            author: msg.author,
            created_at: msg.created_at,
            kind: msg.kind,
            tags: msg.tags.clone(),
            content: msg.content.clone(),
            signature: msg.signature,
        }
    }
}

impl From<EnvelopeV1> for SignedMessage {
    fn from(env: EnvelopeV1) -> Self {
        SignedMessage {
            id: env.id,
            author: env.author,
            created_at: env.created_at,
            kind: env.kind,
            tags: env.tags,
            content: env.content,
            signature: env.signature,
        }
    }
}

/// Encode a signed message into the packet-payload envelope's bytes.
pub fn encode_packet_payload(msg: &SignedMessage) -> Result<Vec<u8>, EncodeError> {
    let env = EnvelopeV1::from(msg);
    let mut buf = Vec::new();
    ciborium::into_writer(&env, &mut buf)?;
    Ok(buf)
}

/// Decode a packet-payload envelope back into a signed message.
///
/// This only restores structure; callers still MUST call
/// [`crate::codec::verify`] before trusting the message.
pub fn decode_packet_payload(bytes: &[u8]) -> Result<SignedMessage, DecodeError> {
    let env: EnvelopeV1 = ciborium::from_reader(bytes)?;
    Ok(env.into())
}
