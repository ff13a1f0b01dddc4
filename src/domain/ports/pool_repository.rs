use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::{PoolTagRecord, TagSet};
use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which pools a tagging run is allowed to pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSelection {
    /// Pools that have never been tagged.
    #[default]
    Untagged,
    /// Untagged pools plus pools whose raw attributes changed after their
    /// last tagging.
    Stale,
}

impl fmt::Display for TagSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSelection::Untagged => write!(f, "untagged"),
            TagSelection::Stale => write!(f, "stale"),
        }
    }
}

impl FromStr for TagSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "untagged" => Ok(TagSelection::Untagged),
            "stale" => Ok(TagSelection::Stale),
            _ => Err(format!("Unknown tag selection: {s}")),
        }
    }
}

/// One FETCH_BATCH step: atomically claim up to `limit` eligible pools
/// ordered by pool id, starting after the `after` cursor.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub token: String,
    pub selection: TagSelection,
    pub after: Option<String>,
    pub limit: usize,
    /// Claims taken before this instant are considered abandoned.
    pub lease_cutoff: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TaggedPool {
    pub pool_id: String,
    pub tags: TagSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct BehaviorCount {
    pub behavior: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolStats {
    pub total_pools: usize,
    pub tagged: usize,
    pub untagged: usize,
    pub stale: usize,
    pub claimed: usize,
    pub behaviors: Vec<BehaviorCount>,
}

/// Pool store boundary. The ingestion pipeline owns the raw attribute
/// columns; the tagger only claims rows and writes tag columns back.
pub trait PoolRepository: Send + Sync {
    fn upsert_pool(&self, pool: &PoolAttributes) -> Result<(), DomainError>;
    fn get_pool(&self, pool_id: &str) -> Result<Option<PoolAttributes>, DomainError>;
    fn count_eligible(&self, selection: TagSelection) -> Result<usize, DomainError>;
    fn claim_batch(&self, request: &ClaimRequest) -> Result<Vec<PoolAttributes>, DomainError>;
    /// Write every tag column and stamp `tags_updated_at` in one
    /// transaction. Only rows still claimed by `token` and unchanged since
    /// the claim are written; returns how many were.
    fn persist_tags(&self, token: &str, batch: &[TaggedPool]) -> Result<usize, DomainError>;
    fn release_claims(&self, token: &str) -> Result<usize, DomainError>;
    fn get_tags(&self, pool_id: &str) -> Result<Option<PoolTagRecord>, DomainError>;
    fn stats(&self) -> Result<PoolStats, DomainError>;
}
