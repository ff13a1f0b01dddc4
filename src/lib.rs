pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::market_rate::{MarketRateUseCase, ResolvedRate};
use crate::application::stats::StatsUseCase;
use crate::application::tag_pools::{
    TagPoolsUseCase, TagRunOptions, TagRunReport, MAX_LEASE_SECS,
};
use crate::config::TaggerConfig;
use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::{PoolTagRecord, TagSet};
use crate::domain::error::DomainError;
use crate::domain::ports::pool_repository::{PoolRepository, PoolStats, TagSelection};
use crate::domain::ports::rate_source::MarketRateSource;
use crate::infrastructure::fred::FredRateSource;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::pool_repo::SqlitePoolRepo;
use crate::infrastructure::sqlite::rate_source::SqliteRateSource;
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use std::sync::Arc;

pub struct MbsTagger {
    config: TaggerConfig,
    pool_repo: Arc<dyn PoolRepository>,
    rate_store: Arc<SqliteRateSource>,
    market_rate_uc: Arc<MarketRateUseCase>,
    tag_pools_uc: TagPoolsUseCase,
    stats_uc: StatsUseCase,
}

fn open_connection(db_path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(|e| DomainError::Database(format!("busy timeout error: {e}")))?;
    run_migrations(&conn)?;
    Ok(conn)
}

impl MbsTagger {
    /// Wire the store and rate sources described by `config`. FRED is
    /// only consulted when an API key is configured.
    pub fn new(config: TaggerConfig) -> Result<Self, DomainError> {
        let mut remote: Vec<Arc<dyn MarketRateSource>> = Vec::new();
        if let Some(key) = &config.fred_api_key {
            remote.push(Arc::new(FredRateSource::with_base_url(
                key.clone(),
                config.fred_base_url.clone(),
            )));
        }
        Self::with_sources(config, remote)
    }

    /// Open `db_path` with default settings and no remote rate source.
    pub fn open(db_path: &str) -> Result<Self, DomainError> {
        Self::with_sources(
            TaggerConfig {
                db_path: db_path.to_string(),
                ..TaggerConfig::default()
            },
            Vec::new(),
        )
    }

    /// `remote` sources are consulted after the locally stored
    /// observations, in the given order.
    pub fn with_sources(
        config: TaggerConfig,
        remote: Vec<Arc<dyn MarketRateSource>>,
    ) -> Result<Self, DomainError> {
        let pool_conn = open_connection(&config.db_path)?;
        let rate_conn = open_connection(&config.db_path)?;

        let pool_repo: Arc<dyn PoolRepository> = Arc::new(SqlitePoolRepo::new(pool_conn));
        let rate_store = Arc::new(SqliteRateSource::new(rate_conn));

        let mut sources: Vec<Arc<dyn MarketRateSource>> = Vec::with_capacity(1 + remote.len());
        sources.push(rate_store.clone());
        sources.extend(remote);
        let market_rate_uc = Arc::new(MarketRateUseCase::new(sources, config.rate_series.clone()));

        Ok(Self {
            tag_pools_uc: TagPoolsUseCase::new(pool_repo.clone(), market_rate_uc.clone()),
            stats_uc: StatsUseCase::new(pool_repo.clone()),
            config,
            pool_repo,
            rate_store,
            market_rate_uc,
        })
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Run options seeded from the configuration.
    pub fn run_options(&self) -> TagRunOptions {
        TagRunOptions {
            conforming_limit: self.config.conforming_limit,
            // out-of-range values stay out of range so the run rejects them
            lease: Duration::seconds(self.config.lease_secs.clamp(0, MAX_LEASE_SECS + 1)),
            ..TagRunOptions::default()
        }
    }

    // Delegating methods
    pub fn add_pool(&self, pool: &PoolAttributes) -> Result<(), DomainError> {
        self.pool_repo.upsert_pool(pool)
    }

    pub fn get_pool(&self, pool_id: &str) -> Result<Option<PoolAttributes>, DomainError> {
        self.pool_repo.get_pool(pool_id)
    }

    pub fn count_eligible(&self, selection: TagSelection) -> Result<usize, DomainError> {
        self.pool_repo.count_eligible(selection)
    }

    pub fn record_rate_observation(
        &self,
        series_id: &str,
        date: NaiveDate,
        value: Option<f64>,
    ) -> Result<(), DomainError> {
        self.rate_store.record_observation(series_id, date, value)
    }

    pub async fn market_rate(
        &self,
        rate_override: Option<f64>,
    ) -> Result<ResolvedRate, DomainError> {
        self.market_rate_uc.resolve(rate_override).await
    }

    pub async fn tag(&self, options: &TagRunOptions) -> Result<TagRunReport, DomainError> {
        self.tag_pools_uc.execute(options).await
    }

    pub async fn score(
        &self,
        pool: &PoolAttributes,
        rate_override: Option<f64>,
    ) -> Result<TagSet, DomainError> {
        self.tag_pools_uc
            .score(pool, rate_override, self.config.conforming_limit)
            .await
    }

    pub fn show(&self, pool_id: &str) -> Result<PoolTagRecord, DomainError> {
        self.stats_uc.pool_tags(pool_id)
    }

    pub fn stats(&self) -> Result<PoolStats, DomainError> {
        self.stats_uc.stats()
    }
}
