//! Protocol constants: kind-class ranges, economics, timing.

/// Kind classes are determined by which half-open range a 16-bit kind falls into.
pub mod kind_range {
    use std::ops::Range;

    /// `[10000, 20000)` — replaceable: newest per `(author, kind)` wins.
    pub const REPLACEABLE: Range<u16> = 10_000..20_000;
    /// `[20000, 30000)` — ephemeral: never stored.
    pub const EPHEMERAL: Range<u16> = 20_000..30_000;
    /// `[30000, 40000)` — parameterized-replaceable: newest per `(author, kind, dTag)` wins.
    pub const PARAMETERIZED_REPLACEABLE: Range<u16> = 30_000..40_000;
}

/// The two ephemeral kinds that make up the encrypted handshake.
pub const KIND_HANDSHAKE_REQUEST: u16 = 24_133;
pub const KIND_HANDSHAKE_RESPONSE: u16 = 24_134;

/// Replaceable kind advertising routing/settlement capability for an author.
pub const KIND_PEER_RECORD: u16 = 10_002;

/// Replaceable kind enumerating followed public keys.
pub const KIND_FOLLOW_LIST: u16 = 10_003;

/// Regular kind recording a fulfilled paid message.
pub const KIND_ZAP_RECEIPT: u16 = 9_735;

/// Regular kind carrying a namespaced quality label.
pub const KIND_LABEL: u16 = 1_985;

/// Regular kind requesting deletion of other messages by the same author.
pub const KIND_DELETION: u16 = 5;

/// Regular kind for a simple reaction (e.g. "+", emoji).
pub const KIND_REACTION: u16 = 7;

/// Regular kind for an author-signed moderation report.
pub const KIND_REPORT: u16 = 1_984;

/// Maximum allowed clock skew between a message's `created_at` and local
/// time before it is considered suspect, in milliseconds.
pub const MAX_CLOCK_SKEW_MS: u64 = 300_000;

/// Trust cache entry time-to-live, in milliseconds.
pub const TRUST_CACHE_TTL_MS: u64 = 300_000;

/// Maximum hop count for follow-graph BFS distance.
pub const MAX_TRUST_HOPS: u32 = 3;

/// Default bound on a subscriber's outbound event buffer before the relay
/// starts dropping the oldest undelivered regular events for that subscriber.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Default maximum concurrent subscriptions per connection.
pub const DEFAULT_MAX_SUBSCRIPTIONS_PER_CONN: usize = 20;

/// Default maximum filters per subscription.
pub const DEFAULT_MAX_FILTERS_PER_SUB: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_ranges_are_disjoint_and_ordered() {
        assert!(kind_range::REPLACEABLE.end <= kind_range::EPHEMERAL.start);
        assert!(kind_range::EPHEMERAL.end <= kind_range::PARAMETERIZED_REPLACEABLE.start);
    }

    #[test]
    fn handshake_kinds_are_ephemeral() {
        assert!(kind_range::EPHEMERAL.contains(&KIND_HANDSHAKE_REQUEST));
        assert!(kind_range::EPHEMERAL.contains(&KIND_HANDSHAKE_RESPONSE));
    }

    #[test]
    fn peer_record_and_follow_list_are_replaceable() {
        assert!(kind_range::REPLACEABLE.contains(&KIND_PEER_RECORD));
        assert!(kind_range::REPLACEABLE.contains(&KIND_FOLLOW_LIST));
    }

    #[test]
    fn timing_constants() {
        assert_eq!(MAX_CLOCK_SKEW_MS, 5 * 60 * 1000);
        assert_eq!(TRUST_CACHE_TTL_MS, 5 * 60 * 1000);
        assert_eq!(MAX_TRUST_HOPS, 3);
    }
}
