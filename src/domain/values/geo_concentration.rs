use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Geographic concentration of a pool's balance.
///
/// The named heavy and regional variants cover the concentrations the
/// screens care about; any other concentrated state falls into
/// `Concentrated` carrying the upper-cased state code, rendered as
/// `{STATE}_CONCENTRATED`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeoConcentration {
    CaHeavy,
    TxHeavy,
    FlHeavy,
    NyHeavy,
    Coastal,
    Sunbelt,
    Midwest,
    Concentrated(String),
    Diversified,
}

const CONCENTRATED_SUFFIX: &str = "_CONCENTRATED";

impl fmt::Display for GeoConcentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoConcentration::CaHeavy => write!(f, "CA_HEAVY"),
            GeoConcentration::TxHeavy => write!(f, "TX_HEAVY"),
            GeoConcentration::FlHeavy => write!(f, "FL_HEAVY"),
            GeoConcentration::NyHeavy => write!(f, "NY_HEAVY"),
            GeoConcentration::Coastal => write!(f, "COASTAL"),
            GeoConcentration::Sunbelt => write!(f, "SUNBELT"),
            GeoConcentration::Midwest => write!(f, "MIDWEST"),
            GeoConcentration::Concentrated(state) => write!(f, "{state}{CONCENTRATED_SUFFIX}"),
            GeoConcentration::Diversified => write!(f, "DIVERSIFIED"),
        }
    }
}

impl FromStr for GeoConcentration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "CA_HEAVY" => Ok(GeoConcentration::CaHeavy),
            "TX_HEAVY" => Ok(GeoConcentration::TxHeavy),
            "FL_HEAVY" => Ok(GeoConcentration::FlHeavy),
            "NY_HEAVY" => Ok(GeoConcentration::NyHeavy),
            "COASTAL" => Ok(GeoConcentration::Coastal),
            "SUNBELT" => Ok(GeoConcentration::Sunbelt),
            "MIDWEST" => Ok(GeoConcentration::Midwest),
            "DIVERSIFIED" => Ok(GeoConcentration::Diversified),
            other => match other.strip_suffix(CONCENTRATED_SUFFIX) {
                Some(state) if !state.is_empty() => {
                    Ok(GeoConcentration::Concentrated(state.to_string()))
                }
                _ => Err(format!("Unknown geo concentration: {s}")),
            },
        }
    }
}

impl Serialize for GeoConcentration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GeoConcentration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
