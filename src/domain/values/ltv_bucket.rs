use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LtvBucket {
    #[serde(rename = "LTV_LOW")]
    Low,
    #[serde(rename = "LTV_MOD")]
    Moderate,
    #[serde(rename = "LTV_STANDARD")]
    Standard,
    #[serde(rename = "LTV_HIGH")]
    High,
    #[serde(rename = "LTV_VERY_HIGH")]
    VeryHigh,
    #[serde(rename = "LTV_EXTREME")]
    Extreme,
}

impl LtvBucket {
    pub const ALL: [LtvBucket; 6] = [
        LtvBucket::Low,
        LtvBucket::Moderate,
        LtvBucket::Standard,
        LtvBucket::High,
        LtvBucket::VeryHigh,
        LtvBucket::Extreme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LtvBucket::Low => "LTV_LOW",
            LtvBucket::Moderate => "LTV_MOD",
            LtvBucket::Standard => "LTV_STANDARD",
            LtvBucket::High => "LTV_HIGH",
            LtvBucket::VeryHigh => "LTV_VERY_HIGH",
            LtvBucket::Extreme => "LTV_EXTREME",
        }
    }
}

impl fmt::Display for LtvBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LtvBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| format!("Unknown LTV bucket: {s}"))
    }
}
