//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, PartialEq)]
pub enum TypesError {
    /// Bounds array has a wrong number of elements.
    #[error("expected 4 bound values, got {0}")]
    BoundsLength(usize),
    /// One of the input values is NaN or infinite.
    #[error("non-finite coordinate value")]
    NonFinite,
}
