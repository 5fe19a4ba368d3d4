//! The write gate (§4.4): the single path every inbound `EVENT` passes
//! through before it reaches the store or any subscriber.

use std::sync::Arc;

use starling_pricing::PricingEngine;
use starling_store::{EventStore, PutOutcome};
use starling_types::SignedMessage;

use crate::error::Result;

/// Whether the amount this write's price quote demands has already been
/// settled before it reached the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentContext {
    /// Arrived as a bare gossip `EVENT`; no payment is attached.
    Unpaid,
    /// Arrived via the payment handler (C9), which already confirmed the
    /// carrying packet's amount met [`PricingEngine::price_for`].
    Verified,
}

/// Result of running a message through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Accepted(PutOutcome),
    Rejected(String),
}

/// Whether an [`Accepted`](WriteOutcome::Accepted) write should be relayed
/// to live subscribers. Duplicate and stale replaceable writes are not —
/// subscribers have already seen (or should never see) those.
pub fn should_broadcast(outcome: PutOutcome) -> bool {
    matches!(outcome, PutOutcome::Stored | PutOutcome::Ephemeral | PutOutcome::Deleted)
}

pub struct WriteGate<S: EventStore> {
    store: Arc<S>,
    pricing: Arc<PricingEngine>,
}

impl<S: EventStore> WriteGate<S> {
    pub fn new(store: Arc<S>, pricing: Arc<PricingEngine>) -> Self {
        Self { store, pricing }
    }

    /// Run steps 1-2 of the write gate: signature verification and pricing.
    /// Step 3 (consulting the payment handler) is the caller's
    /// responsibility, expressed by which `ctx` it passes in; step 4
    /// (storing and deciding whether to broadcast) happens here once the
    /// price is cleared.
    pub fn process(&self, msg: &SignedMessage, ctx: PaymentContext) -> Result<WriteOutcome> {
        if starling_valid::validate_signature(msg).is_err() {
            return Ok(WriteOutcome::Rejected("bad-signature".to_string()));
        }

        let quote = self.pricing.price_for(msg);
        let paid_amount = match ctx {
            PaymentContext::Unpaid => 0,
            PaymentContext::Verified => quote.amount,
        };
        if starling_valid::validate_payment(paid_amount, quote).is_err() {
            return Ok(WriteOutcome::Rejected(format!("payment-required: {}", quote.amount)));
        }

        let outcome = self.store.put(msg)?;
        Ok(WriteOutcome::Accepted(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starling_crypto::PeerId;
    use starling_store::SqliteEventStore;

    fn gate(owner: PeerId) -> WriteGate<SqliteEventStore> {
        let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let pricing = Arc::new(PricingEngine::new(starling_pricing::PricingPolicy::new(owner, 6)));
        WriteGate::new(store, pricing)
    }

    fn identity() -> (starling_crypto::PrivateKey, PeerId) {
        let (sk, pk) = starling_crypto::generate_identity();
        (sk, starling_crypto::peer_id_from_public_key(&pk))
    }

    #[test]
    fn bad_signature_is_rejected_before_pricing_or_storage() {
        let (sk, author) = identity();
        let mut msg = starling_wire::sign_message(&sk, author, 1000, 1, vec![], "hi".into());
        msg.content = "tampered".into();

        let g = gate(author);
        let outcome = g.process(&msg, PaymentContext::Unpaid).unwrap();
        assert_eq!(outcome, WriteOutcome::Rejected("bad-signature".to_string()));
    }

    #[test]
    fn free_write_is_stored_even_when_unpaid() {
        let (sk, owner) = identity();
        let msg = starling_wire::sign_message(&sk, owner, 1000, 1, vec![], "hi".into());

        let g = gate(owner);
        let outcome = g.process(&msg, PaymentContext::Unpaid).unwrap();
        assert_eq!(outcome, WriteOutcome::Accepted(PutOutcome::Stored));
    }

    #[test]
    fn priced_write_is_rejected_without_proof_of_payment() {
        let (sk, author) = identity();
        let (_, owner) = identity();
        let msg = starling_wire::sign_message(&sk, author, 1000, 1, vec![], "hi".into());

        let g = gate(owner);
        let outcome = g.process(&msg, PaymentContext::Unpaid).unwrap();
        assert!(matches!(outcome, WriteOutcome::Rejected(reason) if reason.starts_with("payment-required:")));
    }

    #[test]
    fn priced_write_is_stored_once_marked_verified() {
        let (sk, author) = identity();
        let (_, owner) = identity();
        let msg = starling_wire::sign_message(&sk, author, 1000, 1, vec![], "hi".into());

        let g = gate(owner);
        let outcome = g.process(&msg, PaymentContext::Verified).unwrap();
        assert_eq!(outcome, WriteOutcome::Accepted(PutOutcome::Stored));
    }

    #[test]
    fn should_broadcast_excludes_stale_and_duplicate_outcomes() {
        assert!(should_broadcast(PutOutcome::Stored));
        assert!(should_broadcast(PutOutcome::Ephemeral));
        assert!(should_broadcast(PutOutcome::Deleted));
        assert!(!should_broadcast(PutOutcome::IgnoredOlder));
        assert!(!should_broadcast(PutOutcome::IgnoredDuplicate));
    }
}
