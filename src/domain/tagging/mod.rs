//! Four-layer prepayment tagging pipeline.
//!
//! Layer 1 classifies raw attributes ([`classify`]), Layer 2 derives
//! continuous metrics ([`metrics`]), Layer 3 emits behavioral tags
//! ([`behavior`]) and Layer 4 blends everything into scenario scores
//! ([`composite`]). All of it is pure: the market rate arrives through
//! [`TaggingContext`] and nothing here touches the store.

pub mod behavior;
pub mod classify;
pub mod composite;
pub mod metrics;

use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::TagSet;
use composite::CompositeWeights;
use serde::Serialize;

/// Conforming loan limit separating STD from JUMBO.
pub const DEFAULT_CONFORMING_LIMIT: f64 = 766_550.0;
/// 30-year mortgage rate used when no source can supply one.
pub const DEFAULT_MORTGAGE_RATE: f64 = 6.5;

/// Per-run inputs shared by every pool in the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaggingContext {
    /// Current 30-year mortgage rate, in percent.
    pub market_rate: f64,
    pub conforming_limit: f64,
    pub weights: CompositeWeights,
}

impl TaggingContext {
    pub fn new(market_rate: f64) -> Self {
        Self {
            market_rate,
            ..Default::default()
        }
    }

    pub fn with_conforming_limit(mut self, conforming_limit: f64) -> Self {
        self.conforming_limit = conforming_limit;
        self
    }
}

impl Default for TaggingContext {
    fn default() -> Self {
        Self {
            market_rate: DEFAULT_MORTGAGE_RATE,
            conforming_limit: DEFAULT_CONFORMING_LIMIT,
            weights: CompositeWeights::default(),
        }
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Run all four layers over one pool. Deterministic for a given pool and
/// context.
pub fn generate_tag_set(pool: &PoolAttributes, ctx: &TaggingContext) -> TagSet {
    let classes = classify::classify_pool(pool, ctx.conforming_limit);
    let metrics = metrics::derive_metrics(pool, &classes, ctx);
    let behavior_tags = behavior::generate_behavior_tags(&classes, &metrics, pool.factor);
    let scores = composite::score(&classes, &metrics, &ctx.weights);

    TagSet {
        classes,
        metrics,
        behavior_tags,
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.414375, 3), 0.414);
        assert_eq!(round_to(12.34, 1), 12.3);
        assert_eq!(round_to(-3.26, 1), -3.3);
    }

    #[test]
    fn test_context_builder() {
        let ctx = TaggingContext::new(7.1).with_conforming_limit(1_000_000.0);
        assert_eq!(ctx.market_rate, 7.1);
        assert_eq!(ctx.conforming_limit, 1_000_000.0);
        assert_eq!(ctx.weights, CompositeWeights::default());
    }
}
