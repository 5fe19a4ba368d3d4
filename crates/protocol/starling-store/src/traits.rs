//! The event store contract (C2, §4.2).

use starling_crypto::Hash;
use starling_types::{Filter, SignedMessage};

use crate::error::Result;

/// Outcome of [`EventStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Stored (new row, or replaced an older one in its replaceable slot).
    Stored,
    /// A newer message already occupies this message's replaceable slot.
    IgnoredOlder,
    /// A message with this `id` is already stored.
    IgnoredDuplicate,
    /// The message's kind is ephemeral; never persisted.
    Ephemeral,
    /// The message was a deletion request; the referenced rows were removed
    /// (the deletion message itself is not separately stored).
    Deleted,
}

/// Storage and query operations over signed messages (§4.2).
///
/// Each operation is atomic with respect to concurrent callers; replacement
/// and deletion semantics are enforced by the implementation, not callers.
pub trait EventStore: Send + Sync {
    /// Apply the kind-class replacement rules and store `msg` if it wins its slot.
    fn put(&self, msg: &SignedMessage) -> Result<PutOutcome>;

    /// Look up a single stored message by id.
    fn get(&self, id: &Hash) -> Result<Option<SignedMessage>>;

    /// Messages matching any of `filters`, newest first (`created_at` desc,
    /// `id` asc on ties), deduplicated, with each filter's `limit` applied
    /// to the merged result.
    fn query_many(&self, filters: &[Filter]) -> Result<Vec<SignedMessage>>;

    /// Remove messages referenced by `del_msg`'s `e`/`a` tags, scoped to
    /// `del_msg.author`. Idempotent; always succeeds even if nothing matched.
    fn apply_deletion(&self, del_msg: &SignedMessage) -> Result<usize>;
}
