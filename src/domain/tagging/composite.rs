//! Layer 4: headline scores, each pool-local and clamped to [0, 100].
//! Higher always means more prepayment protection for the holder.

use crate::domain::entities::tag_set::{CompositeScores, DerivedMetrics, StaticTags};
use crate::domain::tagging::round_to;
use crate::domain::values::fico_bucket::FicoBucket;
use crate::domain::values::loan_balance_tier::LoanBalanceTier;
use crate::domain::values::ltv_bucket::LtvBucket;
use crate::domain::values::seasoning_stage::SeasoningStage;
use crate::domain::values::servicer_risk::ServicerRisk;
use crate::domain::values::state_friction::StateFriction;
use serde::Serialize;

/// Score given to the factors no categorical tag covers yet.
pub const OTHER_FACTOR_SCORE: f64 = 50.0;

/// Blend weights for the composite prepay score. They sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeWeights {
    pub loan_balance: f64,
    pub servicer: f64,
    pub fico: f64,
    pub state: f64,
    pub burnout: f64,
    pub ltv: f64,
    pub seasoning: f64,
    pub other: f64,
}

impl CompositeWeights {
    pub fn total(&self) -> f64 {
        self.loan_balance
            + self.servicer
            + self.fico
            + self.state
            + self.burnout
            + self.ltv
            + self.seasoning
            + self.other
    }
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            loan_balance: 0.25,
            servicer: 0.15,
            fico: 0.15,
            state: 0.08,
            burnout: 0.10,
            ltv: 0.07,
            seasoning: 0.10,
            other: 0.10,
        }
    }
}

pub fn llb_score(tier: LoanBalanceTier) -> f64 {
    match tier {
        LoanBalanceTier::Llb1 => 95.0,
        LoanBalanceTier::Llb2 => 88.0,
        LoanBalanceTier::Llb3 => 80.0,
        LoanBalanceTier::Llb4 => 72.0,
        LoanBalanceTier::Llb5 => 65.0,
        LoanBalanceTier::Llb6 => 58.0,
        LoanBalanceTier::Llb7 => 52.0,
        LoanBalanceTier::Mlb => 45.0,
        LoanBalanceTier::Std => 40.0,
        LoanBalanceTier::Jumbo => 25.0,
    }
}

pub fn servicer_score(risk: ServicerRisk) -> f64 {
    match risk {
        ServicerRisk::PrepayProtected => 80.0,
        ServicerRisk::Neutral => 50.0,
        ServicerRisk::PrepayExposed => 20.0,
    }
}

pub fn state_score(friction: StateFriction) -> f64 {
    match friction {
        StateFriction::HighFriction => 75.0,
        StateFriction::ModerateFriction => 50.0,
        StateFriction::LowFriction => 30.0,
    }
}

pub fn fico_score(fico: FicoBucket) -> f64 {
    match fico {
        FicoBucket::Low => 80.0,
        FicoBucket::Subprime => 70.0,
        FicoBucket::Fair => 55.0,
        FicoBucket::Good => 50.0,
        FicoBucket::Excellent => 35.0,
        FicoBucket::Super => 25.0,
    }
}

pub fn ltv_score(ltv: LtvBucket) -> f64 {
    match ltv {
        LtvBucket::Low => 40.0,
        LtvBucket::Moderate => 50.0,
        LtvBucket::Standard => 55.0,
        LtvBucket::High => 65.0,
        LtvBucket::VeryHigh => 75.0,
        LtvBucket::Extreme => 85.0,
    }
}

pub fn seasoning_score(stage: SeasoningStage) -> f64 {
    match stage {
        SeasoningStage::NewProduction => 60.0,
        SeasoningStage::Ramping => 55.0,
        SeasoningStage::Seasoned => 50.0,
        SeasoningStage::FullySeasoned => 50.0,
        SeasoningStage::WellSeasoned => 65.0,
        SeasoningStage::BurnedOut => 75.0,
    }
}

fn bounded(score: f64) -> f64 {
    round_to(score, 1).clamp(0.0, 100.0)
}

pub fn composite_prepay_score(
    classes: &StaticTags,
    burnout: f64,
    weights: &CompositeWeights,
) -> f64 {
    let blended = llb_score(classes.loan_balance_tier) * weights.loan_balance
        + servicer_score(classes.servicer_prepay_risk) * weights.servicer
        + fico_score(classes.fico_bucket) * weights.fico
        + state_score(classes.state_prepay_friction) * weights.state
        + burnout * weights.burnout
        + ltv_score(classes.ltv_bucket) * weights.ltv
        + seasoning_score(classes.seasoning_stage) * weights.seasoning
        + OTHER_FACTOR_SCORE * weights.other;
    bounded(blended)
}

/// Rates falling: reward pools that resist contraction.
pub fn bull_scenario_score(contraction_risk: f64, composite: f64, burnout: f64) -> f64 {
    bounded(0.60 * (100.0 - contraction_risk) + 0.25 * composite + 0.15 * burnout)
}

/// Rates rising: reward pools that keep paying down.
pub fn bear_scenario_score(extension_risk: f64, discount_mult: f64, convexity: f64) -> f64 {
    let convexity_bonus = if convexity < 0.7 { 100.0 } else { 50.0 };
    bounded(
        0.50 * (100.0 - extension_risk)
            + 0.30 * (discount_mult * 50.0).min(100.0)
            + 0.20 * convexity_bonus,
    )
}

/// Rates flat: reward balanced profiles, penalizing convexity far from 1.
pub fn neutral_scenario_score(composite: f64, convexity: f64) -> f64 {
    let balance = 100.0 - (50.0 - convexity * 50.0).abs() * 2.0;
    bounded(0.40 * composite + 0.35 * balance + 0.25 * 50.0)
}

pub fn score(
    classes: &StaticTags,
    metrics: &DerivedMetrics,
    weights: &CompositeWeights,
) -> CompositeScores {
    let composite = composite_prepay_score(classes, metrics.burnout_score, weights);
    CompositeScores {
        composite_prepay_score: composite,
        bull_scenario_score: bull_scenario_score(
            metrics.contraction_risk_score,
            composite,
            metrics.burnout_score,
        ),
        bear_scenario_score: bear_scenario_score(
            metrics.extension_risk_score,
            metrics.discount_cpr_mult,
            metrics.convexity_score,
        ),
        neutral_scenario_score: neutral_scenario_score(composite, metrics.convexity_score),
    }
}
