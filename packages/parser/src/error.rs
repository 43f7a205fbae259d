//! Error types for the parser.
//!
//! Text scanning itself never fails: fragments that cannot be parsed are
//! left out of the results. Errors only arise when a caller hands in a value
//! that must be well-formed, such as an SFS number.

use thiserror::Error;

/// Main error type for the parser library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParserError {
    /// Invalid SFS number format.
    #[error("Invalid SFS number: '{0}'. Expected SFS YYYY:NNNN or YYYY:NNNN (e.g., SFS 1977:1160)")]
    InvalidSfsNumber(String),
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;
