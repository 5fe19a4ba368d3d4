//! Event store (C2, §4.2): durable storage and filtered retrieval for
//! signed messages, with kind-class replacement and deletion semantics
//! enforced atomically by the implementation.

mod error;
mod schema;
mod sqlite;
mod traits;

pub use error::{Result, StoreError};
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteEventStore;
pub use traits::{EventStore, PutOutcome};
