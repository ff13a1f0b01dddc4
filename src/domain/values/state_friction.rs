use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How costly it is to refinance in the pool's dominant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateFriction {
    HighFriction,
    ModerateFriction,
    LowFriction,
}

impl StateFriction {
    pub const ALL: [StateFriction; 3] = [
        StateFriction::HighFriction,
        StateFriction::ModerateFriction,
        StateFriction::LowFriction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateFriction::HighFriction => "HIGH_FRICTION",
            StateFriction::ModerateFriction => "MODERATE_FRICTION",
            StateFriction::LowFriction => "LOW_FRICTION",
        }
    }
}

impl fmt::Display for StateFriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateFriction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HIGH_FRICTION" => Ok(StateFriction::HighFriction),
            "MODERATE_FRICTION" => Ok(StateFriction::ModerateFriction),
            "LOW_FRICTION" => Ok(StateFriction::LowFriction),
            _ => Err(format!("Unknown state friction: {s}")),
        }
    }
}
