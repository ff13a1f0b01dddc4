use serde::{Deserialize, Serialize};

/// Raw attributes of one security pool as delivered by the ingestion
/// pipeline. Every attribute may be missing; the tagging rules define a
/// default for each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolAttributes {
    pub pool_id: String,
    pub avg_loan_size: Option<f64>,
    pub avg_fico: Option<f64>,
    pub avg_ltv: Option<f64>,
    /// Weighted-average loan age in months.
    pub wala: Option<f64>,
    /// Weighted-average coupon, in percent.
    pub wac: Option<f64>,
    pub top_state: Option<String>,
    /// Share of pool balance in `top_state`, in percent (0–100).
    pub top_state_pct: Option<f64>,
    pub servicer_name: Option<String>,
    pub product_type: Option<String>,
    /// Fraction of original face still outstanding (0–1).
    pub factor: Option<f64>,
}

impl PoolAttributes {
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            ..Default::default()
        }
    }
}
