use crate::domain::error::DomainError;
use crate::domain::ports::rate_source::MarketRateSource;
use crate::domain::tagging::DEFAULT_MORTGAGE_RATE;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a run's market rate came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateOrigin {
    Override,
    Observed {
        source: String,
        series_id: String,
        date: NaiveDate,
    },
    Fallback,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateOrigin::Override => write!(f, "override"),
            RateOrigin::Observed {
                source,
                series_id,
                date,
            } => write!(f, "{source} {series_id} as of {date}"),
            RateOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub rate: f64,
    pub origin: RateOrigin,
}

pub struct MarketRateUseCase {
    sources: Vec<Arc<dyn MarketRateSource>>,
    series_id: String,
}

impl MarketRateUseCase {
    /// `sources` are tried in order; the first with a value wins.
    pub fn new(sources: Vec<Arc<dyn MarketRateSource>>, series_id: impl Into<String>) -> Self {
        Self {
            sources,
            series_id: series_id.into(),
        }
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub async fn resolve(&self, rate_override: Option<f64>) -> Result<ResolvedRate, DomainError> {
        if let Some(rate) = rate_override {
            validate_rate(rate)?;
            info!(rate, "using market rate override");
            return Ok(ResolvedRate {
                rate,
                origin: RateOrigin::Override,
            });
        }

        for source in &self.sources {
            match source.latest(&self.series_id).await {
                Ok(Some(obs)) if validate_rate(obs.value).is_ok() => {
                    info!(
                        source = source.name(),
                        series_id = %obs.series_id,
                        date = %obs.date,
                        rate = obs.value,
                        "resolved market rate"
                    );
                    return Ok(ResolvedRate {
                        rate: obs.value,
                        origin: RateOrigin::Observed {
                            source: source.name().to_string(),
                            series_id: obs.series_id,
                            date: obs.date,
                        },
                    });
                }
                Ok(Some(obs)) => {
                    warn!(source = source.name(), value = obs.value, "ignoring implausible rate");
                }
                Ok(None) => {
                    debug!(source = source.name(), series_id = %self.series_id, "no observation");
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "rate source failed, trying next");
                }
            }
        }

        warn!(
            rate = DEFAULT_MORTGAGE_RATE,
            series_id = %self.series_id,
            "no market rate available, using fallback"
        );
        Ok(ResolvedRate {
            rate: DEFAULT_MORTGAGE_RATE,
            origin: RateOrigin::Fallback,
        })
    }
}

/// Rates are percentages; anything outside (0, 100) is a unit mistake.
fn validate_rate(rate: f64) -> Result<(), DomainError> {
    if rate.is_finite() && rate > 0.0 && rate < 100.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!(
            "Market rate must be a percentage between 0 and 100, got {rate}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::rate_source::RateObservation;
    use async_trait::async_trait;

    struct FixedSource {
        name: &'static str,
        result: Result<Option<f64>, ()>,
    }

    #[async_trait]
    impl MarketRateSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn latest(&self, series_id: &str) -> Result<Option<RateObservation>, DomainError> {
            match self.result {
                Ok(value) => Ok(value.map(|value| RateObservation {
                    series_id: series_id.to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
                    value,
                })),
                Err(()) => Err(DomainError::RateSource("unreachable".into())),
            }
        }
    }

    fn source(name: &'static str, result: Result<Option<f64>, ()>) -> Arc<dyn MarketRateSource> {
        Arc::new(FixedSource { name, result })
    }

    #[tokio::test]
    async fn test_override_wins() {
        let uc = MarketRateUseCase::new(vec![source("a", Ok(Some(7.0)))], "MORTGAGE30US");
        let resolved = uc.resolve(Some(5.25)).await.unwrap();
        assert_eq!(resolved.rate, 5.25);
        assert_eq!(resolved.origin, RateOrigin::Override);
    }

    #[tokio::test]
    async fn test_invalid_override_rejected() {
        let uc = MarketRateUseCase::new(vec![], "MORTGAGE30US");
        assert!(matches!(
            uc.resolve(Some(f64::NAN)).await,
            Err(DomainError::InvalidInput(_))
        ));
        assert!(uc.resolve(Some(-1.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_source_falls_through() {
        let uc = MarketRateUseCase::new(
            vec![
                source("broken", Err(())),
                source("empty", Ok(None)),
                source("good", Ok(Some(6.88))),
            ],
            "MORTGAGE30US",
        );
        let resolved = uc.resolve(None).await.unwrap();
        assert_eq!(resolved.rate, 6.88);
        match resolved.origin {
            RateOrigin::Observed { source, .. } => assert_eq!(source, "good"),
            other => panic!("unexpected origin {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fallback_when_nothing_available() {
        let uc = MarketRateUseCase::new(vec![source("empty", Ok(None))], "MORTGAGE30US");
        let resolved = uc.resolve(None).await.unwrap();
        assert_eq!(resolved.rate, DEFAULT_MORTGAGE_RATE);
        assert_eq!(resolved.origin, RateOrigin::Fallback);
    }
}
