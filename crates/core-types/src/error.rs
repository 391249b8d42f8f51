// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unsupported timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Unknown order side: {0}")]
    InvalidSide(String),
}

pub type Result<T> = std::result::Result<T, Error>;
