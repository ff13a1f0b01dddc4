//! Layer 1: map a single raw pool attribute to a categorical tag.
//!
//! Every rule is total. A missing or non-finite input falls back to the
//! documented default bucket instead of failing the pool.

use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::StaticTags;
use crate::domain::values::fico_bucket::FicoBucket;
use crate::domain::values::geo_concentration::GeoConcentration;
use crate::domain::values::loan_balance_tier::LoanBalanceTier;
use crate::domain::values::ltv_bucket::LtvBucket;
use crate::domain::values::seasoning_stage::SeasoningStage;
use crate::domain::values::servicer_risk::ServicerRisk;
use crate::domain::values::state_friction::StateFriction;

/// Judicial-foreclosure states where refinancing is slow and costly.
pub const HIGH_FRICTION_STATES: [&str; 8] = ["NY", "NJ", "FL", "IL", "CT", "MA", "PA", "OH"];
pub const LOW_FRICTION_STATES: [&str; 8] = ["CA", "TX", "AZ", "CO", "WA", "GA", "NV", "OR"];

/// Servicers that recapture aggressively (fast prepays).
pub const FAST_SERVICERS: [&str; 8] = [
    "rocket",
    "quicken",
    "better",
    "loandepot",
    "uwm",
    "united wholesale",
    "pennymac",
    "freedom mortgage",
];
pub const SLOW_SERVICERS: [&str; 10] = [
    "wells fargo",
    "chase",
    "jpmorgan",
    "bank of america",
    "bofa",
    "ocwen",
    "carrington",
    "specialized loan servicing",
    "cenlar",
    "us bank",
];

const COASTAL_STATES: [&str; 6] = ["CA", "FL", "NY", "WA", "OR", "MA"];
const SUNBELT_STATES: [&str; 5] = ["TX", "FL", "AZ", "NV", "GA"];
const MIDWEST_STATES: [&str; 5] = ["OH", "MI", "IL", "IN", "WI"];

/// Share of balance a state needs before it can move friction off MODERATE.
pub const FRICTION_MIN_SHARE: f64 = 25.0;
/// Share needed to actually earn HIGH or LOW friction.
pub const FRICTION_CLASS_SHARE: f64 = 30.0;
pub const GEO_HEAVY_SHARE: f64 = 30.0;
pub const GEO_NY_HEAVY_SHARE: f64 = 25.0;
pub const GEO_REGIONAL_SHARE: f64 = 25.0;
pub const GEO_DIVERSIFIED_BELOW: f64 = 20.0;

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn state_code(top_state: Option<&str>) -> Option<String> {
    top_state
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
}

pub fn loan_balance_tier(avg_loan_size: Option<f64>, conforming_limit: f64) -> LoanBalanceTier {
    let Some(size) = finite(avg_loan_size) else {
        return LoanBalanceTier::Std;
    };
    if size <= 85_000.0 {
        LoanBalanceTier::Llb1
    } else if size <= 110_000.0 {
        LoanBalanceTier::Llb2
    } else if size <= 125_000.0 {
        LoanBalanceTier::Llb3
    } else if size <= 150_000.0 {
        LoanBalanceTier::Llb4
    } else if size <= 175_000.0 {
        LoanBalanceTier::Llb5
    } else if size <= 200_000.0 {
        LoanBalanceTier::Llb6
    } else if size <= 225_000.0 {
        LoanBalanceTier::Llb7
    } else if size <= 300_000.0 {
        LoanBalanceTier::Mlb
    } else if size <= conforming_limit {
        LoanBalanceTier::Std
    } else {
        LoanBalanceTier::Jumbo
    }
}

pub fn fico_bucket(avg_fico: Option<f64>) -> FicoBucket {
    let Some(fico) = finite(avg_fico) else {
        return FicoBucket::Good;
    };
    if fico < 660.0 {
        FicoBucket::Low
    } else if fico < 680.0 {
        FicoBucket::Subprime
    } else if fico < 720.0 {
        FicoBucket::Fair
    } else if fico < 760.0 {
        FicoBucket::Good
    } else if fico < 780.0 {
        FicoBucket::Excellent
    } else {
        FicoBucket::Super
    }
}

pub fn ltv_bucket(avg_ltv: Option<f64>) -> LtvBucket {
    let Some(ltv) = finite(avg_ltv) else {
        return LtvBucket::Standard;
    };
    if ltv <= 60.0 {
        LtvBucket::Low
    } else if ltv <= 70.0 {
        LtvBucket::Moderate
    } else if ltv <= 80.0 {
        LtvBucket::Standard
    } else if ltv <= 90.0 {
        LtvBucket::High
    } else if ltv <= 95.0 {
        LtvBucket::VeryHigh
    } else {
        LtvBucket::Extreme
    }
}

pub fn seasoning_stage(wala: Option<f64>) -> SeasoningStage {
    let Some(age) = finite(wala) else {
        return SeasoningStage::FullySeasoned;
    };
    if age <= 6.0 {
        SeasoningStage::NewProduction
    } else if age <= 12.0 {
        SeasoningStage::Ramping
    } else if age <= 24.0 {
        SeasoningStage::Seasoned
    } else if age <= 36.0 {
        SeasoningStage::FullySeasoned
    } else if age <= 60.0 {
        SeasoningStage::WellSeasoned
    } else {
        SeasoningStage::BurnedOut
    }
}

/// Friction needs two thresholds: below 25% the state never matters, and
/// only at 30% does a listed state earn HIGH or LOW.
pub fn state_friction(top_state: Option<&str>, top_state_pct: Option<f64>) -> StateFriction {
    let (Some(state), Some(pct)) = (state_code(top_state), finite(top_state_pct)) else {
        return StateFriction::ModerateFriction;
    };
    if pct < FRICTION_MIN_SHARE {
        return StateFriction::ModerateFriction;
    }
    let s = state.as_str();
    if HIGH_FRICTION_STATES.contains(&s) && pct >= FRICTION_CLASS_SHARE {
        StateFriction::HighFriction
    } else if LOW_FRICTION_STATES.contains(&s) && pct >= FRICTION_CLASS_SHARE {
        StateFriction::LowFriction
    } else {
        StateFriction::ModerateFriction
    }
}

/// Case-insensitive substring match; the fast list is checked first.
pub fn servicer_risk(servicer_name: Option<&str>) -> ServicerRisk {
    let name = match servicer_name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_lowercase(),
        _ => return ServicerRisk::Neutral,
    };
    if FAST_SERVICERS.iter().any(|s| name.contains(s)) {
        ServicerRisk::PrepayExposed
    } else if SLOW_SERVICERS.iter().any(|s| name.contains(s)) {
        ServicerRisk::PrepayProtected
    } else {
        ServicerRisk::Neutral
    }
}

/// Checked in order: state-specific heavy flags, then regions, then the
/// diversified cut-off, then the per-state catch-all.
pub fn geo_concentration(top_state: Option<&str>, top_state_pct: Option<f64>) -> GeoConcentration {
    let (Some(state), Some(pct)) = (state_code(top_state), finite(top_state_pct)) else {
        return GeoConcentration::Diversified;
    };
    let s = state.as_str();

    if s == "CA" && pct >= GEO_HEAVY_SHARE {
        GeoConcentration::CaHeavy
    } else if s == "TX" && pct >= GEO_HEAVY_SHARE {
        GeoConcentration::TxHeavy
    } else if s == "FL" && pct >= GEO_HEAVY_SHARE {
        GeoConcentration::FlHeavy
    } else if s == "NY" && pct >= GEO_NY_HEAVY_SHARE {
        GeoConcentration::NyHeavy
    } else if COASTAL_STATES.contains(&s) && pct >= GEO_REGIONAL_SHARE {
        GeoConcentration::Coastal
    } else if SUNBELT_STATES.contains(&s) && pct >= GEO_REGIONAL_SHARE {
        GeoConcentration::Sunbelt
    } else if MIDWEST_STATES.contains(&s) && pct >= GEO_REGIONAL_SHARE {
        GeoConcentration::Midwest
    } else if pct < GEO_DIVERSIFIED_BELOW {
        GeoConcentration::Diversified
    } else {
        GeoConcentration::Concentrated(state)
    }
}

pub fn classify_pool(pool: &PoolAttributes, conforming_limit: f64) -> StaticTags {
    let top_state = pool.top_state.as_deref();
    StaticTags {
        loan_balance_tier: loan_balance_tier(pool.avg_loan_size, conforming_limit),
        fico_bucket: fico_bucket(pool.avg_fico),
        ltv_bucket: ltv_bucket(pool.avg_ltv),
        seasoning_stage: seasoning_stage(pool.wala),
        state_prepay_friction: state_friction(top_state, pool.top_state_pct),
        servicer_prepay_risk: servicer_risk(pool.servicer_name.as_deref()),
        geo_concentration_tag: geo_concentration(top_state, pool.top_state_pct),
    }
}
