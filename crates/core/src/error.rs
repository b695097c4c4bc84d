use thiserror::Error;

/// Result type for matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;

/// Errors surfaced by the matrix core.
///
/// Lookups never fail: malformed keys and unknown cell shapes resolve to
/// [`CellResult::Absent`](crate::CellResult::Absent) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// X and Y axis point at the same dimension
    #[error("Duplicate axis: dimension v{dimension} selected for both X and Y")]
    DuplicateAxis { dimension: usize },

    /// Coordinate key is not a canonical comma-joined list of indices
    #[error("Malformed coordinate key: {0:?}")]
    MalformedKey(String),

    /// Dimension reference could not be parsed
    #[error("Unknown dimension reference: {0:?}")]
    UnknownDimension(String),

    /// Invalid projector configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Payload could not be interpreted
    #[error("Payload error: {0}")]
    Payload(String),
}

impl MatrixError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an unknown dimension error
    pub fn unknown_dimension(raw: impl Into<String>) -> Self {
        Self::UnknownDimension(raw.into())
    }

    /// Create a payload error
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }
}
