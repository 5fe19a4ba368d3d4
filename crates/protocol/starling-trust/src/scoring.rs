//! Composite trust scoring, priority tiers, and credit-limit curves (§4.6).
//!
//! Signals arrive pre-aggregated (the relay and connector compute raw
//! counts; this module only normalizes and weights them) so that adding a
//! new signal never requires touching the BFS or event-store layers.

/// Configurable weights for each signal. Defaults match the ones named in
/// the design: social-distance 0.15, mutual-followers 0.10, reaction 0.05,
/// zap-volume 0.15, zap-diversity 0.10, settlement-reliability 0.15,
/// quality-label 0.10, badge 0.10, report-penalty -0.10.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustWeights {
    pub social_distance: f64,
    pub mutual_followers: f64,
    pub reaction_score: f64,
    pub zap_volume: f64,
    pub zap_diversity: f64,
    pub settlement_reliability: f64,
    pub quality_label_score: f64,
    pub badge_score: f64,
    /// Always applied as a subtraction; stored as a positive magnitude.
    pub report_penalty: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            social_distance: 0.15,
            mutual_followers: 0.10,
            reaction_score: 0.05,
            zap_volume: 0.15,
            zap_diversity: 0.10,
            settlement_reliability: 0.15,
            quality_label_score: 0.10,
            badge_score: 0.10,
            report_penalty: 0.10,
        }
    }
}

impl TrustWeights {
    fn positive_sum(&self) -> f64 {
        self.social_distance
            + self.mutual_followers
            + self.reaction_score
            + self.zap_volume
            + self.zap_diversity
            + self.settlement_reliability
            + self.quality_label_score
            + self.badge_score
    }

    /// Whether the non-penalty weights sum to 1 within a small tolerance.
    /// Operators supplying custom weights are expected to satisfy this;
    /// the shipped defaults are kept as specified even though they land a
    /// little under 1, see the crate's design notes.
    pub fn is_normalized(&self) -> bool {
        (self.positive_sum() - 1.0).abs() < 0.02
    }
}

/// Raw per-signal inputs for one `(self, target)` pair, already aggregated
/// by the caller (relay subscriber counts, connector settlement history,
/// etc). Missing data is represented by zero/`None` rather than by the
/// absence of the struct — every field degrades gracefully.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustSignals {
    /// `None` when `target` is unreachable within the configured hop limit.
    pub hops: Option<u32>,
    pub mutual_followers: u32,
    pub reaction_likes: u32,
    pub reaction_dislikes: u32,
    pub zap_volume_units: u64,
    pub zap_unique_senders: u32,
    pub settlement_successes: u32,
    pub settlement_failures: u32,
    /// Social-distance-weighted mean of quality labels, pre-computed by
    /// the caller; already in `[0, 1]`.
    pub quality_label_score: f64,
    /// Issuer-filtered badge count, pre-capped by the caller.
    pub badge_score: f64,
    /// Trust-weighted sum of reports above the configured threshold,
    /// already in `[0, 1]`.
    pub report_penalty_score: f64,
}

const LOG_NORMALIZE_CAP: f64 = 1000.0;

/// `ln(1 + count) / ln(1 + cap)`, clamped to `[0, 1]`.
fn log_normalize(count: u64, cap: f64) -> f64 {
    ((1.0 + count as f64).ln() / (1.0 + cap).ln()).min(1.0)
}

/// Weighted composite score in `[0, 1]`. Unreachable (`hops = None`) always
/// yields `0.0` regardless of every other signal — no routing through
/// socially-disconnected keys.
pub fn composite(weights: &TrustWeights, signals: &TrustSignals) -> f64 {
    let Some(hops) = signals.hops else {
        return 0.0;
    };

    let distance_score = 1.0 / (1.0 + hops as f64);
    let mutual_score = (signals.mutual_followers as f64 / 10.0).min(1.0);
    let reaction_total = signals.reaction_likes + signals.reaction_dislikes;
    let reaction_score = if reaction_total == 0 {
        0.0
    } else {
        signals.reaction_likes as f64 / reaction_total as f64
    };
    let zap_volume_score = log_normalize(signals.zap_volume_units, LOG_NORMALIZE_CAP);
    let zap_diversity_score = log_normalize(signals.zap_unique_senders as u64, LOG_NORMALIZE_CAP);
    let settlement_total = signals.settlement_successes + signals.settlement_failures;
    let settlement_score = if settlement_total == 0 {
        0.0
    } else {
        signals.settlement_successes as f64 / settlement_total as f64
    };

    let score = distance_score * weights.social_distance
        + mutual_score * weights.mutual_followers
        + reaction_score * weights.reaction_score
        + zap_volume_score * weights.zap_volume
        + zap_diversity_score * weights.zap_diversity
        + settlement_score * weights.settlement_reliability
        + signals.quality_label_score.clamp(0.0, 1.0) * weights.quality_label_score
        + signals.badge_score.clamp(0.0, 1.0) * weights.badge_score
        - signals.report_penalty_score.clamp(0.0, 1.0) * weights.report_penalty;

    score.clamp(0.0, 1.0)
}

/// Routing priority tier for a composite score, piecewise on
/// `[0.8, 0.5, 0.2]`.
pub fn priority_for(composite: f64) -> u32 {
    if composite >= 0.8 {
        100
    } else if composite >= 0.5 {
        50
    } else if composite >= 0.2 {
        20
    } else {
        5
    }
}

/// A credit limit curve between `min` and `max` driven by composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditCurve {
    Linear,
    Exponential,
}

/// `creditLimitFor(target)`: interpolate between `min` and `max` by
/// composite score using the configured curve.
pub fn credit_limit_for(curve: CreditCurve, min: u64, max: u64, composite: f64) -> u64 {
    let composite = composite.clamp(0.0, 1.0);
    let span = max.saturating_sub(min) as f64;
    let fraction = match curve {
        CreditCurve::Linear => composite,
        // e^(k*x) normalized to land in [0, 1] at x=0 and x=1, k chosen so
        // low-trust peers get a visibly smaller limit than a linear curve would.
        CreditCurve::Exponential => {
            let k = 4.0_f64;
            ((k * composite).exp() - 1.0) / (k.exp() - 1.0)
        }
    };
    min + (span * fraction).round() as u64
}
