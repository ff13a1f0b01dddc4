pub mod pool;
pub mod tag_set;
