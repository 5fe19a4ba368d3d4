//! The pricing policy's data shape, kept separate from [`crate::PricingEngine`]
//! so it can be constructed, serialized by config loading, and swapped in
//! whole via `set_policy` without touching the lock machinery.

use std::collections::HashMap;

use starling_crypto::PeerId;

/// Flat fee and per-byte rate applying to one kind (or the default, when
/// no per-kind override matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPricing {
    pub flat: u64,
    pub base_price_per_byte: u64,
}

impl Default for KindPricing {
    fn default() -> Self {
        Self { flat: 0, base_price_per_byte: 1 }
    }
}

/// Required amount and asset scale for one message, as returned by
/// [`crate::PricingEngine::price_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub amount: u64,
    pub asset_scale: u8,
}

impl PriceQuote {
    pub fn free(asset_scale: u8) -> Self {
        Self { amount: 0, asset_scale }
    }
}

/// In-memory pricing policy (§3 "Pricing policy").
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    /// Writes authored by this key are always free.
    pub owner_key: PeerId,
    pub asset_scale: u8,
    /// When set, handshake-request messages are also free — lets a
    /// bootstrapping node pay nothing for its own first handshake.
    pub bootstrap_zero_price: bool,
    pub default_pricing: KindPricing,
    pub overrides: HashMap<u16, KindPricing>,
}

impl PricingPolicy {
    pub fn new(owner_key: PeerId, asset_scale: u8) -> Self {
        Self {
            owner_key,
            asset_scale,
            bootstrap_zero_price: false,
            default_pricing: KindPricing::default(),
            overrides: HashMap::new(),
        }
    }

    pub fn pricing_for_kind(&self, kind: u16) -> KindPricing {
        self.overrides.get(&kind).copied().unwrap_or(self.default_pricing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_kind_falls_back_to_default() {
        let mut policy = PricingPolicy::new(PeerId::from_bytes([0; 32]), 6);
        policy.overrides.insert(1, KindPricing { flat: 10, base_price_per_byte: 0 });
        assert_eq!(policy.pricing_for_kind(2), KindPricing::default());
        assert_eq!(policy.pricing_for_kind(1).flat, 10);
    }
}
