use crate::domain::values::behavior::BehaviorTags;
use crate::domain::values::fico_bucket::FicoBucket;
use crate::domain::values::geo_concentration::GeoConcentration;
use crate::domain::values::loan_balance_tier::LoanBalanceTier;
use crate::domain::values::ltv_bucket::LtvBucket;
use crate::domain::values::s_curve::SCurvePosition;
use crate::domain::values::seasoning_stage::SeasoningStage;
use crate::domain::values::servicer_risk::ServicerRisk;
use crate::domain::values::state_friction::StateFriction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Layer 1: one categorical tag per raw attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticTags {
    pub loan_balance_tier: LoanBalanceTier,
    pub fico_bucket: FicoBucket,
    pub ltv_bucket: LtvBucket,
    pub seasoning_stage: SeasoningStage,
    pub state_prepay_friction: StateFriction,
    pub servicer_prepay_risk: ServicerRisk,
    pub geo_concentration_tag: GeoConcentration,
}

/// Layer 2: continuous metrics derived from raw attributes, Layer 1
/// tags and the run's market rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub refi_incentive_bps: f64,
    pub burnout_score: f64,
    pub premium_cpr_mult: f64,
    pub discount_cpr_mult: f64,
    pub convexity_score: f64,
    pub s_curve_position: SCurvePosition,
    pub contraction_risk_score: f64,
    pub extension_risk_score: f64,
}

/// Layer 4: headline scores, each in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScores {
    pub composite_prepay_score: f64,
    pub bull_scenario_score: f64,
    pub bear_scenario_score: f64,
    pub neutral_scenario_score: f64,
}

/// Complete output of one tagging pass over one pool. Serializes flat,
/// one key per stored column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(flatten)]
    pub classes: StaticTags,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub behavior_tags: BehaviorTags,
    #[serde(flatten)]
    pub scores: CompositeScores,
}

/// A persisted tag set as read back from the pool store.
#[derive(Debug, Clone, Serialize)]
pub struct PoolTagRecord {
    pub pool_id: String,
    pub tags_updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub tags: TagSet,
}
