pub mod entities;
pub mod error;
pub mod ports;
pub mod tagging;
pub mod values;
