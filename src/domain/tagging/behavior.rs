//! Layer 3: behavioral tags.
//!
//! Each rule is evaluated on its own against the Layer 1 and Layer 2
//! output, so several behaviors may fire for the same pool.

use crate::domain::entities::tag_set::{DerivedMetrics, StaticTags};
use crate::domain::values::behavior::*;
use crate::domain::values::fico_bucket::FicoBucket;
use crate::domain::values::loan_balance_tier::LoanBalanceTier;
use crate::domain::values::servicer_risk::ServicerRisk;
use crate::domain::values::state_friction::StateFriction;

pub const PROTECTED_MIN_SCORE: u32 = 35;
pub const STRONG_PROTECTION_MIN_SCORE: u32 = 50;
pub const EXPOSED_MAX_BURNOUT: f64 = 30.0;
pub const POSITIVE_CONVEXITY_BELOW: f64 = 0.70;
pub const NEGATIVE_CONVEXITY_ABOVE: f64 = 1.10;
pub const SEVERE_NEGATIVE_CONVEXITY_ABOVE: f64 = 1.25;
pub const BURNOUT_CANDIDATE_MIN: f64 = 60.0;
pub const BURNOUT_CANDIDATE_MIN_INCENTIVE_BPS: f64 = 25.0;
pub const EXTENSION_MAX_INCENTIVE_BPS: f64 = -100.0;
pub const EXTENSION_MAX_DISCOUNT_MULT: f64 = 0.85;
pub const EXTENSION_MIN_FACTOR: f64 = 0.85;

/// Factor assumed by the extension trigger when the pool's is unknown.
const DEFAULT_TRIGGER_FACTOR: f64 = 1.0;

fn llb_bonus(tier: LoanBalanceTier) -> u32 {
    match tier {
        LoanBalanceTier::Llb1 => 25,
        LoanBalanceTier::Llb2 => 20,
        LoanBalanceTier::Llb3 => 15,
        LoanBalanceTier::Llb4 => 12,
        LoanBalanceTier::Llb5 => 10,
        LoanBalanceTier::Llb6 => 8,
        LoanBalanceTier::Llb7 => 5,
        LoanBalanceTier::Mlb => 2,
        LoanBalanceTier::Std | LoanBalanceTier::Jumbo => 0,
    }
}

fn fico_bonus(fico: FicoBucket) -> u32 {
    match fico {
        FicoBucket::Low => 15,
        FicoBucket::Subprime => 10,
        FicoBucket::Fair => 5,
        FicoBucket::Good | FicoBucket::Excellent | FicoBucket::Super => 0,
    }
}

/// Additive protection score: no single characteristic can carry a pool
/// over the threshold alone.
pub fn protection_score(classes: &StaticTags, burnout: f64) -> u32 {
    let mut score = llb_bonus(classes.loan_balance_tier);
    if classes.servicer_prepay_risk == ServicerRisk::PrepayProtected {
        score += 12;
    }
    if classes.state_prepay_friction == StateFriction::HighFriction {
        score += 10;
    }
    score += fico_bonus(classes.fico_bucket);
    if burnout >= BURNOUT_CANDIDATE_MIN {
        score += 15;
    }
    score
}

pub fn generate_behavior_tags(
    classes: &StaticTags,
    metrics: &DerivedMetrics,
    factor: Option<f64>,
) -> BehaviorTags {
    let mut behavior = BehaviorTags::default();

    let protection = protection_score(classes, metrics.burnout_score);
    if protection >= PROTECTED_MIN_SCORE {
        behavior.prepay_protected = Some(PrepayProtectedEvidence {
            value: true,
            strength: if protection >= STRONG_PROTECTION_MIN_SCORE {
                Strength::Strong
            } else {
                Strength::Moderate
            },
            protection_score: protection,
        });
    }

    if classes.servicer_prepay_risk == ServicerRisk::PrepayExposed
        && classes.fico_bucket.is_prime_plus()
        && classes.loan_balance_tier.is_standard_or_jumbo()
        && metrics.burnout_score < EXPOSED_MAX_BURNOUT
    {
        behavior.prepay_exposed = Some(PrepayExposedEvidence {
            value: true,
            severity: Severity::High,
            premium_mult: metrics.premium_cpr_mult,
        });
    }

    let convexity = metrics.convexity_score;
    if convexity < POSITIVE_CONVEXITY_BELOW {
        behavior.positive_convexity = Some(PositiveConvexityEvidence {
            value: true,
            convexity_score: convexity,
            premium_mult: metrics.premium_cpr_mult,
            discount_mult: metrics.discount_cpr_mult,
        });
    }
    if convexity > NEGATIVE_CONVEXITY_ABOVE {
        behavior.negative_convexity = Some(NegativeConvexityEvidence {
            value: true,
            severity: if convexity > SEVERE_NEGATIVE_CONVEXITY_ABOVE {
                Severity::High
            } else {
                Severity::Moderate
            },
            convexity_score: convexity,
        });
    }

    let incentive = metrics.refi_incentive_bps;
    if metrics.burnout_score >= BURNOUT_CANDIDATE_MIN
        && incentive > BURNOUT_CANDIDATE_MIN_INCENTIVE_BPS
    {
        behavior.burnout_candidate = Some(BurnoutCandidateEvidence {
            value: true,
            burnout_score: metrics.burnout_score,
            refi_incentive_bps: incentive,
        });
    }

    let factor = factor.filter(|f| f.is_finite()).unwrap_or(DEFAULT_TRIGGER_FACTOR);
    if incentive < EXTENSION_MAX_INCENTIVE_BPS
        && metrics.discount_cpr_mult < EXTENSION_MAX_DISCOUNT_MULT
        && factor > EXTENSION_MIN_FACTOR
    {
        behavior.extension_risk = Some(ExtensionRiskEvidence {
            value: true,
            severity: Severity::High,
            refi_incentive_bps: incentive,
            discount_mult: metrics.discount_cpr_mult,
            factor,
        });
    }

    behavior
}
