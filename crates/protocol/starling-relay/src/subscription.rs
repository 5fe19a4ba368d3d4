//! Live fan-out and per-connection subscription bookkeeping (§4.4, §5).
//!
//! Fan-out uses a single [`tokio::sync::broadcast`] channel shared by every
//! connection. Its bounded ring buffer gives us the backpressure contract
//! for free: a subscriber that falls behind further than the buffer holds
//! simply misses the oldest events it hadn't read yet (a `Lagged` error on
//! its next `recv`), rather than blocking the publisher or any other
//! connection. Each connection tracks its own subscriptions locally —
//! message handling within a connection is already sequential, so there is
//! nothing here that needs a shared lock.

use starling_types::{constants, Filter, SignedMessage};
use tokio::sync::broadcast;

use crate::error::{RelayError, Result};

/// Broadcasts every stored (or ephemeral) message to every live connection.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<SignedMessage>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to all current subscribers. No-op (aside from the send call
    /// itself) if nobody is listening.
    pub fn publish(&self, msg: SignedMessage) {
        let _ = self.tx.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SignedMessage> {
        self.tx.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SUBSCRIBER_BUFFER)
    }
}

/// One connection's live `REQ` subscriptions, keyed by client-chosen `subId`.
pub struct ConnectionSubscriptions {
    subs: std::collections::HashMap<String, Vec<Filter>>,
    max_subscriptions: usize,
    max_filters_per_sub: usize,
}

impl ConnectionSubscriptions {
    pub fn new(max_subscriptions: usize, max_filters_per_sub: usize) -> Self {
        Self {
            subs: std::collections::HashMap::new(),
            max_subscriptions,
            max_filters_per_sub,
        }
    }

    /// Register or replace the subscription named `sub_id` (a `REQ` for an
    /// already-open `subId` replaces its filters, matching gossip-relay
    /// convention elsewhere in the ecosystem).
    pub fn open(&mut self, sub_id: String, filters: Vec<Filter>) -> Result<()> {
        if filters.len() > self.max_filters_per_sub {
            return Err(RelayError::TooManyFilters);
        }
        if !self.subs.contains_key(&sub_id) && self.subs.len() >= self.max_subscriptions {
            return Err(RelayError::TooManySubscriptions);
        }
        self.subs.insert(sub_id, filters);
        Ok(())
    }

    pub fn close(&mut self, sub_id: &str) -> bool {
        self.subs.remove(sub_id).is_some()
    }

    /// `subId`s whose filters match `msg`, in no particular order.
    pub fn matching(&self, msg: &SignedMessage) -> Vec<String> {
        let wire = starling_wire::WireEvent::from(msg);
        self.subs
            .iter()
            .filter(|(_, filters)| {
                filters.iter().any(|f| f.matches(&wire.id, &wire.pubkey, msg.kind, msg.created_at, &msg.tags))
            })
            .map(|(sub_id, _)| sub_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(kind: u16) -> SignedMessage {
        let (sk, pk) = starling_crypto::generate_identity();
        let author = starling_crypto::peer_id_from_public_key(&pk);
        starling_wire::sign_message(&sk, author, 1000, kind, vec![], "x".into())
    }

    #[test]
    fn broadcaster_delivers_to_all_subscribers() {
        let b = Broadcaster::new(8);
        let mut r1 = b.subscribe();
        let mut r2 = b.subscribe();
        let sent = msg(1);
        b.publish(sent.clone());
        assert_eq!(r1.try_recv().unwrap(), sent);
        assert_eq!(r2.try_recv().unwrap(), sent);
    }

    #[test]
    fn lagging_subscriber_skips_forward_instead_of_blocking() {
        let b = Broadcaster::new(2);
        let mut r = b.subscribe();
        for _ in 0..5 {
            b.publish(msg(1));
        }
        // The receiver is behind by more than the channel's capacity; its
        // next read reports how many it missed rather than replaying them.
        assert!(matches!(r.try_recv(), Err(broadcast::error::TryRecvError::Lagged(_))));
    }

    #[test]
    fn open_rejects_too_many_filters() {
        let mut subs = ConnectionSubscriptions::new(10, 1);
        let err = subs.open("a".into(), vec![Filter::default(), Filter::default()]);
        assert!(matches!(err, Err(RelayError::TooManyFilters)));
    }

    #[test]
    fn open_rejects_beyond_connection_limit() {
        let mut subs = ConnectionSubscriptions::new(1, 10);
        subs.open("a".into(), vec![Filter::default()]).unwrap();
        let err = subs.open("b".into(), vec![Filter::default()]);
        assert!(matches!(err, Err(RelayError::TooManySubscriptions)));
    }

    #[test]
    fn replacing_an_existing_sub_id_does_not_count_against_the_limit() {
        let mut subs = ConnectionSubscriptions::new(1, 10);
        subs.open("a".into(), vec![Filter::default()]).unwrap();
        subs.open("a".into(), vec![Filter { kinds: vec![1], ..Default::default() }]).unwrap();
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn matching_finds_subs_whose_filter_accepts_the_message() {
        let mut subs = ConnectionSubscriptions::new(10, 10);
        subs.open("wanted".into(), vec![Filter { kinds: vec![1], ..Default::default() }]).unwrap();
        subs.open("unwanted".into(), vec![Filter { kinds: vec![2], ..Default::default() }]).unwrap();

        let hits = subs.matching(&msg(1));
        assert_eq!(hits, vec!["wanted".to_string()]);
    }

    #[test]
    fn close_removes_the_subscription() {
        let mut subs = ConnectionSubscriptions::new(10, 10);
        subs.open("a".into(), vec![Filter::default()]).unwrap();
        assert!(subs.close("a"));
        assert!(subs.is_empty());
        assert!(!subs.close("a"));
    }
}
