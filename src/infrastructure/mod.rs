pub mod fred;
pub mod sqlite;
