use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Servicer prepayment risk from the investor's side: fast servicers
/// expose a premium holder, slow ones protect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicerRisk {
    PrepayProtected,
    Neutral,
    PrepayExposed,
}

impl ServicerRisk {
    pub const ALL: [ServicerRisk; 3] = [
        ServicerRisk::PrepayProtected,
        ServicerRisk::Neutral,
        ServicerRisk::PrepayExposed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServicerRisk::PrepayProtected => "PREPAY_PROTECTED",
            ServicerRisk::Neutral => "NEUTRAL",
            ServicerRisk::PrepayExposed => "PREPAY_EXPOSED",
        }
    }
}

impl fmt::Display for ServicerRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServicerRisk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PREPAY_PROTECTED" => Ok(ServicerRisk::PrepayProtected),
            "NEUTRAL" => Ok(ServicerRisk::Neutral),
            "PREPAY_EXPOSED" => Ok(ServicerRisk::PrepayExposed),
            _ => Err(format!("Unknown servicer risk: {s}")),
        }
    }
}
