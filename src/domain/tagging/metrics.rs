//! Layer 2: continuous metrics.
//!
//! The multiplier tables are calibration constants. Premium tables push
//! slow-refinancing characteristics below 1.0; discount tables run the
//! other way, since the same borrowers keep paying through turnover when
//! rates rise. The gap between the two is what the convexity score reads.

use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::{DerivedMetrics, StaticTags};
use crate::domain::tagging::{round_to, TaggingContext};
use crate::domain::values::fico_bucket::FicoBucket;
use crate::domain::values::loan_balance_tier::LoanBalanceTier;
use crate::domain::values::s_curve::SCurvePosition;
use crate::domain::values::servicer_risk::ServicerRisk;

/// Divisor floor for the convexity ratio.
pub const DISCOUNT_MULT_FLOOR: f64 = 0.01;

const DEFAULT_WALA_MONTHS: f64 = 36.0;
const DEFAULT_FACTOR: f64 = 0.85;

/// (coupon − market rate) in basis points; zero when the coupon is unknown.
pub fn refi_incentive_bps(wac: Option<f64>, market_rate: f64) -> f64 {
    match wac.filter(|c| c.is_finite()) {
        Some(coupon) => (coupon - market_rate) * 100.0,
        None => 0.0,
    }
}

/// Burnout in [0, 100]: seasoning (max 35) + paydown (max 45) + a bonus of
/// up to 20 for pools that stayed in the money past their first year.
pub fn burnout_score(wala: Option<f64>, factor: Option<f64>, refi_incentive_bps: f64) -> f64 {
    let age = wala.filter(|w| w.is_finite()).unwrap_or(DEFAULT_WALA_MONTHS);
    let factor = factor.filter(|f| f.is_finite()).unwrap_or(DEFAULT_FACTOR);

    let seasoning_pts = (age / 60.0 * 35.0).min(35.0);
    let paydown_pts = ((1.0 - factor) * 60.0).min(45.0);
    let itm_bonus = if refi_incentive_bps > 50.0 && age > 12.0 {
        (age / 24.0 * 20.0).min(20.0)
    } else {
        0.0
    };

    (seasoning_pts + paydown_pts + itm_bonus).clamp(0.0, 100.0)
}

fn premium_tier_mult(tier: LoanBalanceTier) -> f64 {
    match tier {
        LoanBalanceTier::Llb1 => 0.65,
        LoanBalanceTier::Llb2 => 0.70,
        LoanBalanceTier::Llb3 => 0.75,
        LoanBalanceTier::Llb4 => 0.80,
        LoanBalanceTier::Llb5 => 0.84,
        LoanBalanceTier::Llb6 => 0.87,
        LoanBalanceTier::Llb7 => 0.90,
        LoanBalanceTier::Mlb => 0.95,
        LoanBalanceTier::Std => 1.00,
        LoanBalanceTier::Jumbo => 1.10,
    }
}

fn premium_servicer_mult(risk: ServicerRisk) -> f64 {
    match risk {
        ServicerRisk::PrepayProtected => 0.85,
        ServicerRisk::Neutral => 1.0,
        ServicerRisk::PrepayExposed => 1.15,
    }
}

fn premium_fico_mult(fico: FicoBucket) -> f64 {
    match fico {
        FicoBucket::Low => 0.75,
        FicoBucket::Subprime => 0.80,
        FicoBucket::Fair => 0.90,
        FicoBucket::Good => 1.0,
        FicoBucket::Excellent => 1.08,
        FicoBucket::Super => 1.12,
    }
}

fn discount_tier_mult(tier: LoanBalanceTier) -> f64 {
    match tier {
        LoanBalanceTier::Llb1 => 1.20,
        LoanBalanceTier::Llb2 => 1.15,
        LoanBalanceTier::Llb3 => 1.12,
        LoanBalanceTier::Llb4 => 1.10,
        LoanBalanceTier::Llb5 => 1.08,
        LoanBalanceTier::Llb6 => 1.05,
        LoanBalanceTier::Llb7 => 1.03,
        LoanBalanceTier::Mlb => 1.00,
        LoanBalanceTier::Std => 1.00,
        LoanBalanceTier::Jumbo => 0.80,
    }
}

fn discount_servicer_mult(risk: ServicerRisk) -> f64 {
    match risk {
        ServicerRisk::PrepayProtected => 0.90,
        ServicerRisk::Neutral => 1.0,
        ServicerRisk::PrepayExposed => 0.70,
    }
}

fn discount_fico_mult(fico: FicoBucket) -> f64 {
    match fico {
        FicoBucket::Low => 1.15,
        FicoBucket::Subprime => 1.10,
        FicoBucket::Fair => 1.05,
        FicoBucket::Good => 1.0,
        FicoBucket::Excellent => 0.90,
        FicoBucket::Super => 0.85,
    }
}

/// Expected CPR acceleration when the pool is in the money.
pub fn premium_cpr_mult(tier: LoanBalanceTier, servicer: ServicerRisk, fico: FicoBucket) -> f64 {
    round_to(
        premium_tier_mult(tier) * premium_servicer_mult(servicer) * premium_fico_mult(fico),
        3,
    )
}

/// Expected CPR persistence when the pool is out of the money.
pub fn discount_cpr_mult(tier: LoanBalanceTier, servicer: ServicerRisk, fico: FicoBucket) -> f64 {
    round_to(
        discount_tier_mult(tier) * discount_servicer_mult(servicer) * discount_fico_mult(fico),
        3,
    )
}

/// Premium over discount multiplier. Below 1.0 is positive convexity.
pub fn convexity_score(premium_mult: f64, discount_mult: f64) -> f64 {
    premium_mult / discount_mult.max(DISCOUNT_MULT_FLOOR)
}

pub fn s_curve_position(refi_incentive_bps: f64) -> SCurvePosition {
    if refi_incentive_bps < -100.0 {
        SCurvePosition::LeftTail
    } else if refi_incentive_bps < -25.0 {
        SCurvePosition::LeftShoulder
    } else if refi_incentive_bps < 75.0 {
        SCurvePosition::Inflection
    } else if refi_incentive_bps < 150.0 {
        SCurvePosition::RightShoulder
    } else {
        SCurvePosition::RightTail
    }
}

fn contraction_servicer_adj(risk: ServicerRisk) -> f64 {
    match risk {
        ServicerRisk::PrepayProtected => -10.0,
        ServicerRisk::Neutral => 0.0,
        ServicerRisk::PrepayExposed => 15.0,
    }
}

fn contraction_fico_adj(fico: FicoBucket) -> f64 {
    match fico {
        FicoBucket::Low => -10.0,
        FicoBucket::Subprime => -5.0,
        FicoBucket::Fair => 0.0,
        FicoBucket::Good => 5.0,
        FicoBucket::Excellent => 10.0,
        FicoBucket::Super => 15.0,
    }
}

fn extension_tier_adj(tier: LoanBalanceTier) -> f64 {
    match tier {
        LoanBalanceTier::Llb1 => -15.0,
        LoanBalanceTier::Llb2 => -12.0,
        LoanBalanceTier::Llb3 => -10.0,
        LoanBalanceTier::Llb4 => -8.0,
        LoanBalanceTier::Llb5 => -6.0,
        LoanBalanceTier::Llb6 => -4.0,
        LoanBalanceTier::Llb7 => -2.0,
        LoanBalanceTier::Mlb => 0.0,
        LoanBalanceTier::Std => 0.0,
        LoanBalanceTier::Jumbo => 10.0,
    }
}

/// Risk of fast paydown, in [0, 100].
pub fn contraction_risk(
    premium_mult: f64,
    burnout: f64,
    servicer: ServicerRisk,
    fico: FicoBucket,
) -> f64 {
    let base_risk = (premium_mult - 0.5) / 0.7 * 50.0;
    let burnout_reduction = burnout / 100.0 * 25.0;
    let risk = base_risk - burnout_reduction
        + contraction_servicer_adj(servicer)
        + contraction_fico_adj(fico);
    round_to(risk, 1).clamp(0.0, 100.0)
}

/// Risk of slow paydown, in [0, 100].
pub fn extension_risk(
    discount_mult: f64,
    refi_incentive_bps: f64,
    factor: Option<f64>,
    tier: LoanBalanceTier,
) -> f64 {
    let factor = factor.filter(|f| f.is_finite()).unwrap_or(DEFAULT_FACTOR);
    let base_risk = (1.2 - discount_mult) / 0.5 * 40.0;
    let otm_adj = if refi_incentive_bps < -100.0 {
        20.0
    } else if refi_incentive_bps < -50.0 {
        10.0
    } else {
        0.0
    };
    let factor_adj = if factor > 0.5 { (factor - 0.5) * 20.0 } else { 0.0 };
    let risk = base_risk + otm_adj + factor_adj + extension_tier_adj(tier);
    round_to(risk, 1).clamp(0.0, 100.0)
}

pub fn derive_metrics(
    pool: &PoolAttributes,
    classes: &StaticTags,
    ctx: &TaggingContext,
) -> DerivedMetrics {
    let tier = classes.loan_balance_tier;
    let servicer = classes.servicer_prepay_risk;
    let fico = classes.fico_bucket;

    let refi = refi_incentive_bps(pool.wac, ctx.market_rate);
    let burnout = burnout_score(pool.wala, pool.factor, refi);
    let premium = premium_cpr_mult(tier, servicer, fico);
    let discount = discount_cpr_mult(tier, servicer, fico);

    DerivedMetrics {
        refi_incentive_bps: refi,
        burnout_score: burnout,
        premium_cpr_mult: premium,
        discount_cpr_mult: discount,
        convexity_score: convexity_score(premium, discount),
        s_curve_position: s_curve_position(refi),
        contraction_risk_score: contraction_risk(premium, burnout, servicer, fico),
        extension_risk_score: extension_risk(discount, refi, pool.factor, tier),
    }
}
