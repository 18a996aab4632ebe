#![deny(unsafe_code)]

pub mod error;
pub mod plain;
pub mod types;

pub use error::{ConfigError, ErrorKind, Result};
pub use plain::{PlainConfig, describe_value};
pub use types::{ColumnType, DataModality, SourceType, TemporalityType};
