use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasoningStage {
    NewProduction,
    Ramping,
    Seasoned,
    FullySeasoned,
    WellSeasoned,
    BurnedOut,
}

impl SeasoningStage {
    pub const ALL: [SeasoningStage; 6] = [
        SeasoningStage::NewProduction,
        SeasoningStage::Ramping,
        SeasoningStage::Seasoned,
        SeasoningStage::FullySeasoned,
        SeasoningStage::WellSeasoned,
        SeasoningStage::BurnedOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasoningStage::NewProduction => "NEW_PRODUCTION",
            SeasoningStage::Ramping => "RAMPING",
            SeasoningStage::Seasoned => "SEASONED",
            SeasoningStage::FullySeasoned => "FULLY_SEASONED",
            SeasoningStage::WellSeasoned => "WELL_SEASONED",
            SeasoningStage::BurnedOut => "BURNED_OUT",
        }
    }
}

impl fmt::Display for SeasoningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasoningStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NEW_PRODUCTION" => Ok(SeasoningStage::NewProduction),
            "RAMPING" => Ok(SeasoningStage::Ramping),
            "SEASONED" => Ok(SeasoningStage::Seasoned),
            "FULLY_SEASONED" => Ok(SeasoningStage::FullySeasoned),
            "WELL_SEASONED" => Ok(SeasoningStage::WellSeasoned),
            "BURNED_OUT" => Ok(SeasoningStage::BurnedOut),
            _ => Err(format!("Unknown seasoning stage: {s}")),
        }
    }
}
