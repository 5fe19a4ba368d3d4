//! Encrypted handshake and chain negotiation (C5, §4.5).
//!
//! The requester builds a sealed `HS_REQ` with [`request::build_request`] and
//! tracks it with [`request::PendingRequests`]; the responder answers with
//! [`responder::handle_request`], which negotiates a settlement chain,
//! opens a channel through a [`starling_connector::Connector`], and returns
//! the signed `HS_RES` to send back as fulfill data.

mod error;
mod payload;
mod rate_limit;
mod request;
mod responder;

pub use error::{HandshakeError, Result};
pub use payload::{open_payload, seal_payload};
pub use rate_limit::HandshakeRateLimiter;
pub use request::{await_response, build_request, generate_request_id, PendingRequests};
pub use responder::{handle_request, NegotiationParams, ResponderIdentity};
