//! Error type used by the crate.

use thiserror::Error;

/// Failure to decode a vector tile payload.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MvtError {
    /// The buffer is not a valid protobuf `Tile` message.
    #[error("proto error: {0}")]
    Proto(String),

    /// The message is valid protobuf but violates the vector tile format.
    #[error("{0}")]
    Generic(String),
}
