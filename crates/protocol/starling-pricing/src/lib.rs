//! Pricing engine (C3, §4.3): maps a signed message to the amount its
//! author must pay to have it accepted by the relay's write gate.
//!
//! The policy is held behind a `RwLock` so operators can retune prices
//! (flat fees, per-byte rates, the owner bypass) without restarting the
//! node; readers never block each other and a write only blocks other
//! writes.

mod policy;

pub use policy::{KindPricing, PriceQuote, PricingPolicy};

use std::sync::RwLock;

use starling_crypto::PeerId;
use starling_types::SignedMessage;

/// Runtime-mutable pricing policy plus the `priceFor` entry point the
/// write gate (C4) and payment handler (C9) call on every inbound message.
pub struct PricingEngine {
    policy: RwLock<PricingPolicy>,
}

impl PricingEngine {
    pub fn new(policy: PricingPolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }

    /// `priceFor(msg)`: owner bypass, then bootstrap-zero-price for
    /// handshake requests, then `max(flat, byteSize * basePricePerByte)`.
    pub fn price_for(&self, msg: &SignedMessage) -> PriceQuote {
        let policy = self.policy.read().expect("pricing policy lock poisoned");

        if msg.author == policy.owner_key {
            return PriceQuote::free(policy.asset_scale);
        }
        if policy.bootstrap_zero_price && msg.kind == starling_types::constants::KIND_HANDSHAKE_REQUEST {
            return PriceQuote::free(policy.asset_scale);
        }

        let pricing = policy.pricing_for_kind(msg.kind);
        let byte_size = starling_wire::canonical_bytes(
            msg.author,
            msg.created_at,
            msg.kind,
            &msg.tags,
            &msg.content,
        )
        .len() as u64;

        let amount = pricing.flat.max(byte_size.saturating_mul(pricing.base_price_per_byte));
        PriceQuote {
            amount,
            asset_scale: policy.asset_scale,
        }
    }

    /// Replace the whole policy atomically.
    pub fn set_policy(&self, policy: PricingPolicy) {
        *self.policy.write().expect("pricing policy lock poisoned") = policy;
    }

    /// Override pricing for a single kind without touching the rest of the policy.
    pub fn set_kind_pricing(&self, kind: u16, pricing: KindPricing) {
        self.policy
            .write()
            .expect("pricing policy lock poisoned")
            .overrides
            .insert(kind, pricing);
    }

    pub fn set_owner_key(&self, owner_key: PeerId) {
        self.policy.write().expect("pricing policy lock poisoned").owner_key = owner_key;
    }

    pub fn set_bootstrap_zero_price(&self, enabled: bool) {
        self.policy
            .write()
            .expect("pricing policy lock poisoned")
            .bootstrap_zero_price = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> PeerId {
        let (_, pk) = starling_crypto::generate_identity();
        starling_crypto::peer_id_from_public_key(&pk)
    }

    fn msg(author: PeerId, kind: u16, content: &str) -> SignedMessage {
        let (sk, _) = starling_crypto::generate_identity();
        starling_wire::sign_message(&sk, author, 1000, kind, vec![], content.into())
    }

    #[test]
    fn owner_writes_are_free() {
        let owner = peer();
        let engine = PricingEngine::new(PricingPolicy::new(owner, 6));
        let quote = engine.price_for(&msg(owner, 1, "hello"));
        assert_eq!(quote.amount, 0);
    }

    #[test]
    fn non_owner_pays_base_rate() {
        let mut policy = PricingPolicy::new(peer(), 6);
        policy.default_pricing.base_price_per_byte = 10;
        let engine = PricingEngine::new(policy);
        let author = peer();
        let quote = engine.price_for(&msg(author, 1, "hello"));
        assert!(quote.amount > 0);
    }

    #[test]
    fn flat_fee_wins_when_larger_than_per_byte_rate() {
        let mut policy = PricingPolicy::new(peer(), 6);
        policy.default_pricing = KindPricing { flat: 5_000, base_price_per_byte: 1 };
        let engine = PricingEngine::new(policy);
        let quote = engine.price_for(&msg(peer(), 1, "x"));
        assert_eq!(quote.amount, 5_000);
    }

    #[test]
    fn kind_override_takes_precedence_over_default() {
        let mut policy = PricingPolicy::new(peer(), 6);
        policy.overrides.insert(42, KindPricing { flat: 0, base_price_per_byte: 100 });
        let engine = PricingEngine::new(policy);
        let cheap = engine.price_for(&msg(peer(), 1, "same length!"));
        let expensive = engine.price_for(&msg(peer(), 42, "same length!"));
        assert!(expensive.amount > cheap.amount);
    }

    #[test]
    fn bootstrap_zero_price_only_applies_to_handshake_request_kind() {
        let mut policy = PricingPolicy::new(peer(), 6);
        policy.bootstrap_zero_price = true;
        policy.default_pricing.base_price_per_byte = 10;
        let engine = PricingEngine::new(policy);
        let author = peer();

        let handshake = msg(author, starling_types::constants::KIND_HANDSHAKE_REQUEST, "hs");
        assert_eq!(engine.price_for(&handshake).amount, 0);

        let other = msg(author, 1, "not a handshake");
        assert!(engine.price_for(&other).amount > 0);
    }

    #[test]
    fn runtime_override_takes_effect_without_rebuilding_the_engine() {
        let engine = PricingEngine::new(PricingPolicy::new(peer(), 6));
        let author = peer();
        let before = engine.price_for(&msg(author, 7, "same length!"));

        engine.set_kind_pricing(7, KindPricing { flat: 999_999, base_price_per_byte: 0 });
        let after = engine.price_for(&msg(author, 7, "same length!"));

        assert_ne!(before.amount, after.amount);
        assert_eq!(after.amount, 999_999);
    }
}
