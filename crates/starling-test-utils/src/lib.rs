//! Shared fixture builders for the protocol crates' test suites: test
//! keypairs and signed messages, an in-memory event store, a connected
//! pair of in-process connectors, and a pre-configured pricing engine.

mod connector;
mod identity;
mod pricing;
mod store;

pub use connector::connector_pair;
pub use identity::{signed_message, signed_message_from, test_keypair};
pub use pricing::test_pricing_engine;
pub use store::test_store;
