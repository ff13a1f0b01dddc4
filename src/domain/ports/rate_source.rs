use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

/// FRED series id of the weekly 30-year fixed mortgage average.
pub const DEFAULT_RATE_SERIES: &str = "MORTGAGE30US";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateObservation {
    pub series_id: String,
    pub date: NaiveDate,
    /// Rate in percent.
    pub value: f64,
}

/// Pluggable source for the current market mortgage rate.
#[async_trait]
pub trait MarketRateSource: Send + Sync {
    /// Name of this source for logging (e.g. "sqlite", "fred").
    fn name(&self) -> &str;

    /// Most recent non-missing observation of `series_id`, if any.
    async fn latest(&self, series_id: &str) -> Result<Option<RateObservation>, DomainError>;
}
