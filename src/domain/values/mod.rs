pub mod behavior;
pub mod fico_bucket;
pub mod geo_concentration;
pub mod loan_balance_tier;
pub mod ltv_bucket;
pub mod s_curve;
pub mod seasoning_stage;
pub mod servicer_risk;
pub mod state_friction;
