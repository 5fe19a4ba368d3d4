//! The gossip wire protocol (§4.4, §6): JSON arrays over a duplex text
//! frame connection, shaped the way the public-key gossip networks this
//! protocol interoperates with expect events to look — `id`/`pubkey`/
//! `created_at`/`kind`/`tags`/`content`/`sig`, all hex, none of our
//! internal `star1...` display form.
//!
//! `ClientMessage` and `RelayMessage` each (de)serialize as a JSON array
//! whose first element is a string tag (`"EVENT"`, `"REQ"`, ...). `serde`
//! has no built-in support for tagged-array enums, so both implement
//! `Serialize`/`Deserialize` by hand via an untyped `serde_json::Value`
//! round-trip.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use starling_crypto::{Hash, PeerId, Signature};
use starling_types::{Filter, SignedMessage, Tag};

use crate::error::DecodeError;

/// The wire shape of a signed message: Nostr-style field names, all keys
/// hex-encoded (never the internal `star1...` PeerId form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, DecodeError> {
    if s.len() % 2 != 0 {
        return Err(DecodeError::Gossip("odd-length hex string".to_string()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| DecodeError::Gossip(format!("invalid hex: {e}")))
        })
        .collect()
}

impl From<&SignedMessage> for WireEvent {
    fn from(msg: &SignedMessage) -> Self {
        Self {
            id: hex_encode(msg.id.as_ref()),
            pubkey: hex_encode(msg.author.as_bytes()),
            created_at: msg.created_at,
            kind: msg.kind,
            tags: msg.tags.clone(),
            content: msg.content.clone(),
            sig: hex_encode(msg.signature.as_ref()),
        }
    }
}

impl TryFrom<WireEvent> for SignedMessage {
    type Error = DecodeError;

    fn try_from(ev: WireEvent) -> Result<Self, Self::Error> {
        let id_bytes = hex_decode(&ev.id)?;
        let pubkey_bytes = hex_decode(&ev.pubkey)?;
        let sig_bytes = hex_decode(&ev.sig)?;

        let id: [u8; 32] = id_bytes
            .try_into()
            .map_err(|_| DecodeError::Gossip("id must be 32 bytes".to_string()))?;
        let author: [u8; 32] = pubkey_bytes
            .try_into()
            .map_err(|_| DecodeError::Gossip("pubkey must be 32 bytes".to_string()))?;
        let sig: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| DecodeError::Gossip("sig must be 64 bytes".to_string()))?;

        Ok(SignedMessage {
            id: Hash(id),
            author: PeerId::from_bytes(author),
            created_at: ev.created_at,
            kind: ev.kind,
            tags: ev.tags,
            content: ev.content,
            signature: Signature::from_bytes(sig),
        })
    }
}

/// A subscription filter as it appears inside a `REQ` array, Nostr-style
/// (`#<tagName>` keys for tag filters rather than a nested list of pairs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    kinds: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    since: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    until: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(flatten)]
    tag_filters: std::collections::BTreeMap<String, Vec<String>>,
}

impl From<&Filter> for WireFilter {
    fn from(f: &Filter) -> Self {
        Self {
            ids: f.ids.clone(),
            authors: f.authors.clone(),
            kinds: f.kinds.clone(),
            since: f.since,
            until: f.until,
            limit: f.limit,
            tag_filters: f
                .tags
                .iter()
                .map(|(name, values)| (format!("#{name}"), values.clone()))
                .collect(),
        }
    }
}

impl From<WireFilter> for Filter {
    fn from(w: WireFilter) -> Self {
        Filter {
            ids: w.ids,
            authors: w.authors,
            kinds: w.kinds,
            since: w.since,
            until: w.until,
            tags: w
                .tag_filters
                .into_iter()
                .filter_map(|(k, v)| k.strip_prefix('#').map(|name| (name.to_string(), v)))
                .collect(),
            limit: w.limit,
        }
    }
}

/// A message sent from a gossip client to a relay.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    Event(SignedMessage),
    Req { sub_id: String, filters: Vec<Filter> },
    Close(String),
}

/// A message sent from a relay to a gossip client.
#[derive(Debug, Clone)]
pub enum RelayMessage {
    Event { sub_id: String, event: SignedMessage },
    Eose(String),
    Ok { id: Hash, accepted: bool, message: String },
}

fn bad_arity(tag: &str) -> DecodeError {
    DecodeError::Gossip(format!("wrong number of elements for {tag}"))
}

impl ClientMessage {
    pub fn to_json(&self) -> String {
        let value = match self {
            ClientMessage::Event(msg) => {
                serde_json::json!(["EVENT", WireEvent::from(msg)])
            }
            ClientMessage::Req { sub_id, filters } => {
                let mut arr = vec![Value::String("REQ".into()), Value::String(sub_id.clone())];
                arr.extend(filters.iter().map(|f| serde_json::to_value(WireFilter::from(f)).unwrap()));
                Value::Array(arr)
            }
            ClientMessage::Close(sub_id) => {
                serde_json::json!(["CLOSE", sub_id])
            }
        };
        value.to_string()
    }

    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let arr = value
            .as_array()
            .ok_or_else(|| DecodeError::Gossip("gossip message must be a JSON array".to_string()))?;
        let tag = arr
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::Gossip("missing message tag".to_string()))?;

        match tag {
            "EVENT" => {
                let event: WireEvent = arr
                    .get(1)
                    .cloned()
                    .ok_or_else(|| bad_arity("EVENT"))
                    .and_then(|v| serde_json::from_value(v).map_err(DecodeError::from))?;
                Ok(ClientMessage::Event(event.try_into()?))
            }
            "REQ" => {
                let sub_id = arr
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad_arity("REQ"))?
                    .to_string();
                let filters = arr[2..]
                    .iter()
                    .map(|v| {
                        serde_json::from_value::<WireFilter>(v.clone())
                            .map(Filter::from)
                            .map_err(DecodeError::from)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ClientMessage::Req { sub_id, filters })
            }
            "CLOSE" => {
                let sub_id = arr
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad_arity("CLOSE"))?
                    .to_string();
                Ok(ClientMessage::Close(sub_id))
            }
            other => Err(DecodeError::Gossip(format!("unknown client message tag {other:?}"))),
        }
    }
}

impl RelayMessage {
    pub fn to_json(&self) -> String {
        let value = match self {
            RelayMessage::Event { sub_id, event } => {
                serde_json::json!(["EVENT", sub_id, WireEvent::from(event)])
            }
            RelayMessage::Eose(sub_id) => serde_json::json!(["EOSE", sub_id]),
            RelayMessage::Ok { id, accepted, message } => {
                serde_json::json!(["OK", hex_encode(id.as_ref()), accepted, message])
            }
        };
        value.to_string()
    }

    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let arr = value
            .as_array()
            .ok_or_else(|| DecodeError::Gossip("gossip message must be a JSON array".to_string()))?;
        let tag = arr
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::Gossip("missing message tag".to_string()))?;

        match tag {
            "EVENT" => {
                let sub_id = arr
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad_arity("EVENT"))?
                    .to_string();
                let event: WireEvent = arr
                    .get(2)
                    .cloned()
                    .ok_or_else(|| bad_arity("EVENT"))
                    .and_then(|v| serde_json::from_value(v).map_err(DecodeError::from))?;
                Ok(RelayMessage::Event { sub_id, event: event.try_into()? })
            }
            "EOSE" => {
                let sub_id = arr
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or_else(|| bad_arity("EOSE"))?
                    .to_string();
                Ok(RelayMessage::Eose(sub_id))
            }
            "OK" => {
                let id_hex = arr.get(1).and_then(Value::as_str).ok_or_else(|| bad_arity("OK"))?;
                let id_bytes = hex_decode(id_hex)?;
                let id: [u8; 32] = id_bytes
                    .try_into()
                    .map_err(|_| DecodeError::Gossip("OK id must be 32 bytes".to_string()))?;
                let accepted = arr.get(2).and_then(Value::as_bool).ok_or_else(|| bad_arity("OK"))?;
                let message = arr
                    .get(3)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(RelayMessage::Ok { id: Hash(id), accepted, message })
            }
            other => Err(DecodeError::Gossip(format!("unknown relay message tag {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::sign_message;

    fn sample_message() -> SignedMessage {
        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        sign_message(&sk, author, 1000, 1, vec![vec!["d".into(), "x".into()]], "hi".into())
    }

    #[test]
    fn wire_event_uses_hex_not_star1() {
        let msg = sample_message();
        let wire = WireEvent::from(&msg);
        assert!(!wire.pubkey.starts_with("star1"));
        assert_eq!(wire.pubkey.len(), 64);
        assert_eq!(wire.id.len(), 64);
        assert_eq!(wire.sig.len(), 128);
    }

    #[test]
    fn client_event_roundtrips_through_json() {
        let msg = sample_message();
        let client_msg = ClientMessage::Event(msg.clone());
        let json = client_msg.to_json();
        assert!(json.starts_with("[\"EVENT\""));
        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::Event(decoded) => assert_eq!(decoded, msg),
            _ => panic!("expected EVENT"),
        }
    }

    #[test]
    fn req_roundtrips_with_filters() {
        let filter = Filter {
            kinds: vec![1, 2],
            tags: vec![("d".to_string(), vec!["profile".to_string()])],
            ..Default::default()
        };
        let client_msg = ClientMessage::Req {
            sub_id: "sub-1".to_string(),
            filters: vec![filter],
        };
        let json = client_msg.to_json();
        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::Req { sub_id, filters } => {
                assert_eq!(sub_id, "sub-1");
                assert_eq!(filters.len(), 1);
                assert_eq!(filters[0].kinds, vec![1, 2]);
                assert_eq!(filters[0].tags, vec![("d".to_string(), vec!["profile".to_string()])]);
            }
            _ => panic!("expected REQ"),
        }
    }

    #[test]
    fn close_roundtrips() {
        let json = ClientMessage::Close("sub-7".to_string()).to_json();
        assert_eq!(json, "[\"CLOSE\",\"sub-7\"]");
        match ClientMessage::from_json(&json).unwrap() {
            ClientMessage::Close(sub_id) => assert_eq!(sub_id, "sub-7"),
            _ => panic!("expected CLOSE"),
        }
    }

    #[test]
    fn relay_event_roundtrips() {
        let msg = sample_message();
        let relay_msg = RelayMessage::Event { sub_id: "sub-1".to_string(), event: msg.clone() };
        let json = relay_msg.to_json();
        match RelayMessage::from_json(&json).unwrap() {
            RelayMessage::Event { sub_id, event } => {
                assert_eq!(sub_id, "sub-1");
                assert_eq!(event, msg);
            }
            _ => panic!("expected EVENT"),
        }
    }

    #[test]
    fn eose_roundtrips() {
        let json = RelayMessage::Eose("sub-1".to_string()).to_json();
        assert_eq!(json, "[\"EOSE\",\"sub-1\"]");
    }

    #[test]
    fn ok_roundtrips_with_reason() {
        let msg = sample_message();
        let relay_msg = RelayMessage::Ok { id: msg.id, accepted: false, message: "bad-signature".to_string() };
        let json = relay_msg.to_json();
        match RelayMessage::from_json(&json).unwrap() {
            RelayMessage::Ok { id, accepted, message } => {
                assert_eq!(id, msg.id);
                assert!(!accepted);
                assert_eq!(message, "bad-signature");
            }
            _ => panic!("expected OK"),
        }
    }

    #[test]
    fn rejects_non_array_json() {
        assert!(ClientMessage::from_json("{}").is_err());
    }

    #[test]
    fn rejects_unknown_tag() {
        assert!(ClientMessage::from_json("[\"NONSENSE\"]").is_err());
    }
}
