pub mod market_rate;
pub mod stats;
pub mod tag_pools;
