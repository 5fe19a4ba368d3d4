//! Pricing-engine fixtures.

use starling_crypto::PeerId;
use starling_pricing::{KindPricing, PricingEngine, PricingPolicy};

/// A `PricingEngine` with `owner` writing for free and every other kind
/// flat-priced at `flat_fee`, asset scale 2 (cents).
pub fn test_pricing_engine(owner: PeerId, flat_fee: u64) -> PricingEngine {
    let mut policy = PricingPolicy::new(owner, 2);
    policy.default_pricing = KindPricing { flat: flat_fee, base_price_per_byte: 0 };
    PricingEngine::new(policy)
}
