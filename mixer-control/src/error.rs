//! Error types for the Mixer control path.

use thiserror::Error;

/// Error type for Mixer control operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Attribute bytes could not be decoded.
    #[error("malformed attributes: {0}")]
    Parse(#[from] prost::DecodeError),

    /// An attribute decoded from the wire carried an unusable value.
    #[error("attribute `{name}` has an invalid value: {reason}")]
    InvalidValue {
        /// Attribute name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An HTTP API spec pattern could not be compiled.
    #[error("invalid api spec pattern `{pattern}`: {reason}")]
    InvalidApiSpec {
        /// The offending `uri_template` or `regex`.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}

impl Error {
    /// Returns true if this error came from malformed attribute input.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::InvalidValue { .. })
    }
}

/// Result type alias for Mixer control operations.
pub type Result<T> = std::result::Result<T, Error>;
