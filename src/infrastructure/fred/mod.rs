use crate::domain::error::DomainError;
use crate::domain::ports::rate_source::{MarketRateSource, RateObservation};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

pub const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// FRED observations API. Asks for the newest few points and takes the
/// first one that is not the "." missing marker.
pub struct FredRateSource {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl FredRateSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, FRED_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .user_agent(concat!("mbs-tagger/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<FredObservation>,
}

#[derive(Debug, serde::Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

fn first_valid(series_id: &str, observations: Vec<FredObservation>) -> Option<RateObservation> {
    observations.into_iter().find_map(|obs| {
        let value: f64 = obs.value.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").ok()?;
        Some(RateObservation {
            series_id: series_id.to_string(),
            date,
            value,
        })
    })
}

#[async_trait]
impl MarketRateSource for FredRateSource {
    fn name(&self) -> &str {
        "fred"
    }

    async fn latest(&self, series_id: &str) -> Result<Option<RateObservation>, DomainError> {
        let url = format!("{}/series/observations", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", "10"),
            ])
            .send()
            .await
            .map_err(|e| DomainError::RateSource(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DomainError::RateSource(format!(
                "FRED API returned {} for {series_id}",
                resp.status()
            )));
        }

        let data: ObservationsResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(e.to_string()))?;
        debug!(series_id, count = data.observations.len(), "fetched FRED observations");

        Ok(first_valid(series_id, data.observations))
    }
}
