use crate::domain::entities::tag_set::PoolTagRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::pool_repository::{PoolRepository, PoolStats};
use std::sync::Arc;

pub struct StatsUseCase {
    repo: Arc<dyn PoolRepository>,
}

impl StatsUseCase {
    pub fn new(repo: Arc<dyn PoolRepository>) -> Self {
        Self { repo }
    }

    pub fn stats(&self) -> Result<PoolStats, DomainError> {
        self.repo.stats()
    }

    pub fn pool_tags(&self, pool_id: &str) -> Result<PoolTagRecord, DomainError> {
        if self.repo.get_pool(pool_id)?.is_none() {
            return Err(DomainError::NotFound(format!("pool {pool_id}")));
        }
        self.repo
            .get_tags(pool_id)?
            .ok_or_else(|| {
                DomainError::NotFound(format!("tags for pool {pool_id} (not tagged yet)"))
            })
    }
}
