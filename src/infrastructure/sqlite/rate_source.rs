use crate::domain::error::DomainError;
use crate::domain::ports::rate_source::{MarketRateSource, RateObservation};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads macro observations already ingested into `fred_observation`.
pub struct SqliteRateSource {
    conn: Mutex<Connection>,
}

impl SqliteRateSource {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Store one observation; `None` records a missing value.
    pub fn record_observation(
        &self,
        series_id: &str,
        date: NaiveDate,
        value: Option<f64>,
    ) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO fred_observation (series_id, obs_date, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(series_id, obs_date) DO UPDATE SET value = excluded.value",
            params![series_id, date.format(DATE_FORMAT).to_string(), value],
        )
        .map_err(|e| DomainError::Database(format!("Failed to record observation: {e}")))?;
        Ok(())
    }

    fn latest_stored(&self, series_id: &str) -> Result<Option<RateObservation>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let row: Option<(String, f64)> = conn
            .query_row(
                "SELECT obs_date, value FROM fred_observation
                 WHERE series_id = ?1 AND value IS NOT NULL
                 ORDER BY obs_date DESC LIMIT 1",
                params![series_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let Some((date_str, value)) = row else {
            return Ok(None);
        };
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .map_err(|e| DomainError::Parse(format!("Bad observation date {date_str}: {e}")))?;
        Ok(Some(RateObservation {
            series_id: series_id.to_string(),
            date,
            value,
        }))
    }
}

#[async_trait]
impl MarketRateSource for SqliteRateSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn latest(&self, series_id: &str) -> Result<Option<RateObservation>, DomainError> {
        self.latest_stored(series_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite::migrations::run_migrations;

    fn source() -> SqliteRateSource {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        SqliteRateSource::new(conn)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_latest_skips_missing_values() {
        let src = source();
        src.record_observation("MORTGAGE30US", date("2024-05-02"), Some(7.22))
            .unwrap();
        src.record_observation("MORTGAGE30US", date("2024-05-09"), None)
            .unwrap();
        src.record_observation("DGS10", date("2024-05-16"), Some(4.4))
            .unwrap();

        let obs = src.latest_stored("MORTGAGE30US").unwrap().unwrap();
        assert_eq!(obs.date, date("2024-05-02"));
        assert_eq!(obs.value, 7.22);
    }

    #[test]
    fn test_latest_empty_series() {
        assert!(source().latest_stored("MORTGAGE30US").unwrap().is_none());
    }

    #[test]
    fn test_record_overwrites_same_date() {
        let src = source();
        src.record_observation("MORTGAGE30US", date("2024-05-02"), Some(7.0))
            .unwrap();
        src.record_observation("MORTGAGE30US", date("2024-05-02"), Some(7.1))
            .unwrap();
        assert_eq!(src.latest_stored("MORTGAGE30US").unwrap().unwrap().value, 7.1);
    }
}
