pub mod migrations;
pub mod pool_repo;
pub mod rate_source;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
pub(crate) fn to_db_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn from_db_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
