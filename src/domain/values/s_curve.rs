use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the pool's refinance incentive sits on the prepayment S-curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SCurvePosition {
    LeftTail,
    LeftShoulder,
    Inflection,
    RightShoulder,
    RightTail,
}

impl SCurvePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SCurvePosition::LeftTail => "LEFT_TAIL",
            SCurvePosition::LeftShoulder => "LEFT_SHOULDER",
            SCurvePosition::Inflection => "INFLECTION",
            SCurvePosition::RightShoulder => "RIGHT_SHOULDER",
            SCurvePosition::RightTail => "RIGHT_TAIL",
        }
    }
}

impl fmt::Display for SCurvePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SCurvePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LEFT_TAIL" => Ok(SCurvePosition::LeftTail),
            "LEFT_SHOULDER" => Ok(SCurvePosition::LeftShoulder),
            "INFLECTION" => Ok(SCurvePosition::Inflection),
            "RIGHT_SHOULDER" => Ok(SCurvePosition::RightShoulder),
            "RIGHT_TAIL" => Ok(SCurvePosition::RightTail),
            _ => Err(format!("Unknown S-curve position: {s}")),
        }
    }
}
