// In crates/risk/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid risk parameters: {0}")]
    InvalidParameters(String),

    #[error("Failed to access risk state file {}: {source}", .path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Risk state file {} exists but cannot be parsed: {source}", .path.display())]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize risk state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("A trade was recorded before the daily risk state was evaluated")]
    StateNotLoaded,
}

pub type Result<T> = std::result::Result<T, Error>;
