//! The signed-message codec, packet-payload envelope, and gossip wire
//! protocol (C1).
//!
//! - [`codec`]: canonical encoding, id computation, signing, and
//!   verification of a [`starling_types::SignedMessage`].
//! - [`envelope`]: the byte-stable binary envelope carried in a routed
//!   packet's opaque data field.
//! - [`gossip`]: the JSON-array client/relay protocol (`EVENT`/`REQ`/
//!   `CLOSE`/`EOSE`/`OK`) spoken over the long-lived duplex connection.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod gossip;

pub use codec::{canonical_bytes, compute_id, sign_id, sign_message, verify};
pub use envelope::{decode_packet_payload, encode_packet_payload};
pub use error::{DecodeError, EncodeError, VerifyError};
pub use gossip::{ClientMessage, RelayMessage, WireEvent};
