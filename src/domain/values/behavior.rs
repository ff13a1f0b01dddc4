//! Behavioral tags and the evidence recorded when each one fires.
//!
//! [`BehaviorTags`] is sparse: a behavior whose trigger did not hold is
//! absent from the document rather than stored as `false`.

use serde::{Deserialize, Serialize};

/// Every behavior name that may appear in a [`BehaviorTags`] document.
pub const BEHAVIOR_NAMES: [&str; 6] = [
    "prepay_protected",
    "prepay_exposed",
    "positive_convexity",
    "negative_convexity",
    "burnout_candidate",
    "extension_risk",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepayProtectedEvidence {
    pub value: bool,
    pub strength: Strength,
    pub protection_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepayExposedEvidence {
    pub value: bool,
    pub severity: Severity,
    pub premium_mult: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositiveConvexityEvidence {
    pub value: bool,
    pub convexity_score: f64,
    pub premium_mult: f64,
    pub discount_mult: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeConvexityEvidence {
    pub value: bool,
    pub severity: Severity,
    pub convexity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnoutCandidateEvidence {
    pub value: bool,
    pub burnout_score: f64,
    pub refi_incentive_bps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRiskEvidence {
    pub value: bool,
    pub severity: Severity,
    pub refi_incentive_bps: f64,
    pub discount_mult: f64,
    pub factor: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepay_protected: Option<PrepayProtectedEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepay_exposed: Option<PrepayExposedEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_convexity: Option<PositiveConvexityEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_convexity: Option<NegativeConvexityEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burnout_candidate: Option<BurnoutCandidateEvidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_risk: Option<ExtensionRiskEvidence>,
}

impl BehaviorTags {
    /// Names of the behaviors present, in [`BEHAVIOR_NAMES`] order.
    pub fn names(&self) -> Vec<&'static str> {
        let present = [
            self.prepay_protected.is_some(),
            self.prepay_exposed.is_some(),
            self.positive_convexity.is_some(),
            self.negative_convexity.is_some(),
            self.burnout_candidate.is_some(),
            self.extension_risk.is_some(),
        ];
        BEHAVIOR_NAMES
            .iter()
            .zip(present)
            .filter_map(|(name, on)| on.then_some(*name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}
