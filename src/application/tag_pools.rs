use crate::application::market_rate::{MarketRateUseCase, RateOrigin};
use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::TagSet;
use crate::domain::error::DomainError;
use crate::domain::ports::pool_repository::{
    ClaimRequest, PoolRepository, TagSelection, TaggedPool,
};
use crate::domain::tagging::{generate_tag_set, TaggingContext, DEFAULT_CONFORMING_LIMIT};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_BATCH_SIZE: usize = 1_000;
pub const DEFAULT_LEASE_SECS: i64 = 900;
/// A week; longer leases would park pools behind a dead run for good.
pub const MAX_LEASE_SECS: i64 = 7 * 24 * 60 * 60;
/// Emit a progress line each time this many more pools are tagged.
pub const PROGRESS_EVERY: usize = 5_000;

#[derive(Debug, Clone)]
pub struct TagRunOptions {
    pub batch_size: usize,
    /// Cap on pools fetched across the whole run.
    pub limit: Option<usize>,
    pub selection: TagSelection,
    pub rate_override: Option<f64>,
    pub conforming_limit: f64,
    /// Claims older than this belong to a dead run and may be taken over.
    pub lease: Duration,
}

impl Default for TagRunOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
            selection: TagSelection::Untagged,
            rate_override: None,
            conforming_limit: DEFAULT_CONFORMING_LIMIT,
            lease: Duration::seconds(DEFAULT_LEASE_SECS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRunReport {
    pub run_id: String,
    pub market_rate: f64,
    pub rate_origin: RateOrigin,
    pub batches: usize,
    pub tagged: usize,
    /// Fetched pools not written: the claim was lost or the pool changed
    /// after it was claimed.
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct RunCounts {
    batches: usize,
    tagged: usize,
    skipped: usize,
}

pub struct TagPoolsUseCase {
    repo: Arc<dyn PoolRepository>,
    market_rate: Arc<MarketRateUseCase>,
}

impl TagPoolsUseCase {
    pub fn new(repo: Arc<dyn PoolRepository>, market_rate: Arc<MarketRateUseCase>) -> Self {
        Self { repo, market_rate }
    }

    /// Tag every eligible pool: claim a batch, compute tags, persist,
    /// repeat until the store has nothing left after the cursor.
    pub async fn execute(&self, options: &TagRunOptions) -> Result<TagRunReport, DomainError> {
        if options.batch_size == 0 {
            return Err(DomainError::InvalidInput("batch size must be positive".into()));
        }
        validate_conforming_limit(options.conforming_limit)?;
        validate_lease(options.lease)?;

        let resolved = self.market_rate.resolve(options.rate_override).await?;
        let ctx =
            TaggingContext::new(resolved.rate).with_conforming_limit(options.conforming_limit);
        let run_id = Uuid::new_v4().to_string();

        info!(
            run_id = %run_id,
            market_rate = resolved.rate,
            origin = %resolved.origin,
            selection = %options.selection,
            batch_size = options.batch_size,
            "starting tagging run"
        );

        let counts = match self.run_batches(&run_id, &ctx, options) {
            Ok(counts) => counts,
            Err(e) => {
                match self.repo.release_claims(&run_id) {
                    Ok(released) => warn!(
                        run_id = %run_id,
                        released,
                        error = %e,
                        "tagging run failed, claims released"
                    ),
                    Err(release_err) => warn!(
                        run_id = %run_id,
                        error = %e,
                        release_error = %release_err,
                        "tagging run failed, claims left to expire"
                    ),
                }
                return Err(e);
            }
        };

        info!(
            run_id = %run_id,
            tagged = counts.tagged,
            skipped = counts.skipped,
            batches = counts.batches,
            "tagging run complete"
        );

        Ok(TagRunReport {
            run_id,
            market_rate: resolved.rate,
            rate_origin: resolved.origin,
            batches: counts.batches,
            tagged: counts.tagged,
            skipped: counts.skipped,
        })
    }

    fn run_batches(
        &self,
        token: &str,
        ctx: &TaggingContext,
        options: &TagRunOptions,
    ) -> Result<RunCounts, DomainError> {
        let mut counts = RunCounts::default();
        let mut fetched = 0usize;
        let mut after: Option<String> = None;

        loop {
            let want = match options.limit {
                Some(limit) => limit.saturating_sub(fetched).min(options.batch_size),
                None => options.batch_size,
            };
            if want == 0 {
                break;
            }

            let lease_cutoff = Utc::now().checked_sub_signed(options.lease).ok_or_else(|| {
                DomainError::InvalidInput(format!("lease {} is out of range", options.lease))
            })?;
            let pools = self.repo.claim_batch(&ClaimRequest {
                token: token.to_string(),
                selection: options.selection,
                after: after.clone(),
                limit: want,
                lease_cutoff,
            })?;
            let Some(last) = pools.last() else {
                break;
            };
            // Advance past the whole batch even if some writes are lost.
            after = Some(last.pool_id.clone());
            fetched += pools.len();

            let batch: Vec<TaggedPool> = pools
                .iter()
                .map(|pool| TaggedPool {
                    pool_id: pool.pool_id.clone(),
                    tags: generate_tag_set(pool, ctx),
                })
                .collect();
            let written = self.repo.persist_tags(token, &batch)?;

            let before = counts.tagged;
            counts.batches += 1;
            counts.tagged += written;
            counts.skipped += batch.len() - written;
            debug!(batch = counts.batches, fetched = batch.len(), written, "batch persisted");

            if counts.tagged / PROGRESS_EVERY > before / PROGRESS_EVERY {
                info!(tagged = counts.tagged, "tagging progress");
            }

            if pools.len() < want {
                break;
            }
        }

        Ok(counts)
    }

    /// Tag ad-hoc attributes without touching the store.
    pub async fn score(
        &self,
        pool: &PoolAttributes,
        rate_override: Option<f64>,
        conforming_limit: f64,
    ) -> Result<TagSet, DomainError> {
        validate_conforming_limit(conforming_limit)?;
        let resolved = self.market_rate.resolve(rate_override).await?;
        let ctx = TaggingContext::new(resolved.rate).with_conforming_limit(conforming_limit);
        Ok(generate_tag_set(pool, &ctx))
    }
}

fn validate_lease(lease: Duration) -> Result<(), DomainError> {
    if lease > Duration::zero() && lease <= Duration::seconds(MAX_LEASE_SECS) {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!(
            "lease must be between 1 and {MAX_LEASE_SECS} seconds, got {}",
            lease.num_seconds()
        )))
    }
}

fn validate_conforming_limit(limit: f64) -> Result<(), DomainError> {
    if limit.is_finite() && limit > 0.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!(
            "conforming limit must be a positive amount, got {limit}"
        )))
    }
}
