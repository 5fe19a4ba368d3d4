//! The paid gossip-relay engine (C4, §4.4): a WebSocket server speaking
//! `EVENT`/`REQ`/`CLOSE`/`EOSE`/`OK`, gated on signature validity and price.
//!
//! [`server::router`] wires a [`server::RelayState`] (store + pricing +
//! live fan-out) into an `axum::Router`; each accepted connection runs
//! [`connection::handle_connection`] as its own sequential actor.

mod connection;
mod error;
mod server;
mod subscription;
mod write_gate;

pub use connection::{handle_connection, ConnectionConfig};
pub use error::{RelayError, Result};
pub use server::{router, RelayState};
pub use subscription::{Broadcaster, ConnectionSubscriptions};
pub use write_gate::{should_broadcast, PaymentContext, WriteGate, WriteOutcome};
