use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FicoBucket {
    #[serde(rename = "FICO_LOW")]
    Low,
    #[serde(rename = "FICO_SUBPRIME")]
    Subprime,
    #[serde(rename = "FICO_FAIR")]
    Fair,
    #[serde(rename = "FICO_GOOD")]
    Good,
    #[serde(rename = "FICO_EXCELLENT")]
    Excellent,
    #[serde(rename = "FICO_SUPER")]
    Super,
}

impl FicoBucket {
    pub const ALL: [FicoBucket; 6] = [
        FicoBucket::Low,
        FicoBucket::Subprime,
        FicoBucket::Fair,
        FicoBucket::Good,
        FicoBucket::Excellent,
        FicoBucket::Super,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FicoBucket::Low => "FICO_LOW",
            FicoBucket::Subprime => "FICO_SUBPRIME",
            FicoBucket::Fair => "FICO_FAIR",
            FicoBucket::Good => "FICO_GOOD",
            FicoBucket::Excellent => "FICO_EXCELLENT",
            FicoBucket::Super => "FICO_SUPER",
        }
    }

    /// Borrowers in these buckets refinance the moment they are in the money.
    pub fn is_prime_plus(&self) -> bool {
        matches!(self, FicoBucket::Excellent | FicoBucket::Super)
    }
}

impl fmt::Display for FicoBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FicoBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| format!("Unknown FICO bucket: {s}"))
    }
}
