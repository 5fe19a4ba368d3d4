//! In-memory event store fixtures.

use starling_store::SqliteEventStore;

/// An in-memory `SqliteEventStore`, ready for `put`/`get`/`query_many` calls
/// without touching disk.
pub fn test_store() -> SqliteEventStore {
    SqliteEventStore::open_in_memory().expect("in-memory sqlite store never fails to open")
}
