//! Trust engine (C6, §4.6): follow-graph BFS, composite scoring, and the
//! routing-priority/credit-limit mappings derived from it. Results are
//! cached per `(self, target)` pair with a time-to-live so a busy relay
//! doesn't recompute the full signal set on every packet.

mod graph;
mod scoring;

pub use graph::FollowGraph;
pub use scoring::{composite, credit_limit_for, priority_for, CreditCurve, TrustSignals, TrustWeights};

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use starling_crypto::PeerId;
use starling_types::constants::{MAX_TRUST_HOPS, TRUST_CACHE_TTL_MS};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as u64
}

#[derive(Clone, Copy)]
struct CacheEntry {
    composite: f64,
    computed_at_ms: u64,
}

fn is_stale(entry: &CacheEntry, now_ms: u64, ttl_ms: u64) -> bool {
    now_ms.saturating_sub(entry.computed_at_ms) >= ttl_ms
}

/// Computes and caches trust scores. Callers supply the raw per-pair
/// signals (via a [`TrustSignals`] source they own — the store, the
/// connector's admin API, etc); this type owns only the graph, the
/// weights, and the TTL cache of already-computed composites.
pub struct TrustEngine {
    weights: TrustWeights,
    cache: RwLock<HashMap<(PeerId, PeerId), CacheEntry>>,
    ttl_ms: u64,
}

impl TrustEngine {
    pub fn new(weights: TrustWeights) -> Self {
        Self {
            weights,
            cache: RwLock::new(HashMap::new()),
            ttl_ms: TRUST_CACHE_TTL_MS,
        }
    }

    pub fn max_hops(&self) -> u32 {
        MAX_TRUST_HOPS
    }

    /// BFS distance, delegated to the graph directly (not cached — cheap
    /// relative to the full signal aggregation, and callers often want a
    /// fresh distance even when the composite cache is still warm).
    pub fn distance(&self, graph: &FollowGraph, from: &PeerId, to: &PeerId) -> Option<u32> {
        graph.distance(from, to, self.max_hops())
    }

    pub fn mutuals(&self, graph: &FollowGraph, a: &PeerId, b: &PeerId) -> usize {
        graph.mutuals(a, b)
    }

    /// Composite score for `(self_key, target)`, using `signals` on a
    /// cache miss or expiry and caching the result for `ttl_ms`.
    pub fn composite_for(&self, self_key: PeerId, target: PeerId, signals: &TrustSignals) -> f64 {
        let now = now_ms();
        {
            let cache = self.cache.read().expect("trust cache lock poisoned");
            if let Some(entry) = cache.get(&(self_key, target)) {
                if !is_stale(entry, now, self.ttl_ms) {
                    return entry.composite;
                }
            }
        }

        let score = composite(&self.weights, signals);
        self.cache.write().expect("trust cache lock poisoned").insert(
            (self_key, target),
            CacheEntry { composite: score, computed_at_ms: now },
        );
        score
    }

    pub fn priority_for(&self, self_key: PeerId, target: PeerId, signals: &TrustSignals) -> u32 {
        priority_for(self.composite_for(self_key, target, signals))
    }

    pub fn credit_limit_for(
        &self,
        self_key: PeerId,
        target: PeerId,
        signals: &TrustSignals,
        curve: CreditCurve,
        min: u64,
        max: u64,
    ) -> u64 {
        credit_limit_for(curve, min, max, self.composite_for(self_key, target, signals))
    }

    /// Drop any cached entry for `(self_key, target)`, forcing recomputation
    /// on the next call even within the TTL window.
    pub fn invalidate(&self, self_key: PeerId, target: PeerId) {
        self.cache.write().expect("trust cache lock poisoned").remove(&(self_key, target));
    }
}
