pub mod pool_repository;
pub mod rate_source;
