use crate::application::tag_pools::{DEFAULT_LEASE_SECS, MAX_LEASE_SECS};
use crate::domain::error::DomainError;
use crate::domain::ports::rate_source::DEFAULT_RATE_SERIES;
use crate::domain::tagging::DEFAULT_CONFORMING_LIMIT;
use crate::infrastructure::fred::FRED_BASE_URL;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "./mbs_tagger.db";

/// Runtime settings, read from the environment. CLI flags override the
/// per-run values.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggerConfig {
    pub db_path: String,
    pub rate_series: String,
    pub conforming_limit: f64,
    pub lease_secs: i64,
    pub fred_api_key: Option<String>,
    pub fred_base_url: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.into(),
            rate_series: DEFAULT_RATE_SERIES.into(),
            conforming_limit: DEFAULT_CONFORMING_LIMIT,
            lease_secs: DEFAULT_LEASE_SECS,
            fred_api_key: None,
            fred_base_url: FRED_BASE_URL.into(),
        }
    }
}

impl TaggerConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let lease_secs = parse_var("MBS_TAGGER_LEASE_SECS", get("MBS_TAGGER_LEASE_SECS"))?
            .unwrap_or(defaults.lease_secs);
        if !(1..=MAX_LEASE_SECS).contains(&lease_secs) {
            return Err(DomainError::InvalidInput(format!(
                "MBS_TAGGER_LEASE_SECS={lease_secs}: must be between 1 and {MAX_LEASE_SECS}"
            )));
        }

        Ok(Self {
            db_path: get("MBS_TAGGER_DB").unwrap_or(defaults.db_path),
            rate_series: get("MBS_TAGGER_RATE_SERIES").unwrap_or(defaults.rate_series),
            conforming_limit: parse_var(
                "MBS_TAGGER_CONFORMING_LIMIT",
                get("MBS_TAGGER_CONFORMING_LIMIT"),
            )?
            .unwrap_or(defaults.conforming_limit),
            lease_secs,
            fred_api_key: get("FRED_API_KEY"),
            fred_base_url: get("FRED_BASE_URL").unwrap_or(defaults.fred_base_url),
        })
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, DomainError>
where
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| DomainError::InvalidInput(format!("{key}={v}: {e}")))
        })
        .transpose()
}
