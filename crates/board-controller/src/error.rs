//! Controller error types

use chess_core::PositionError;
use thiserror::Error;

/// Failure talking to the analysis backend. Never fatal to the session:
/// it degrades to "no visible update" plus a status indicator.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid initial position: {0}")]
    Position(#[from] PositionError),
}
