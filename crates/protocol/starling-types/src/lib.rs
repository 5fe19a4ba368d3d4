//! Data model for the Starling protocol: signed messages, kind classes, the
//! domain payloads carried inside them, and query filters.
//!
//! # Type conventions
//!
//! - Identity and signature newtypes ([`starling_crypto::PeerId`],
//!   [`starling_crypto::Hash`], [`starling_crypto::Signature`]) come from
//!   `starling-crypto`; this crate only adds the protocol-level shapes built
//!   on top of them.
//! - All payload structs derive `Serialize`/`Deserialize` and are stored in
//!   `SignedMessage::content` as JSON; nothing in this crate signs, hashes,
//!   or encodes — see `starling-wire` for that.

pub mod constants;
pub mod error;
pub mod filter;
pub mod message;
pub mod records;

pub use error::{Reject, RejectCode};
pub use filter::Filter;
pub use message::{classify, d_tag_value, first_tag_value, KindClass, SignedMessage, Tag};
pub use records::{
    followed_keys, ChainId, HandshakeError, HandshakeRequestPayload, HandshakeResponsePayload,
    LabelContent, PeerRecord, ZapReceiptContent,
};
