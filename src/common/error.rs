//! Error types for graph_slam

use thiserror::Error;

use crate::common::types::LandmarkId;

/// Main error type for the GraphSLAM pipeline
#[derive(Debug, Error)]
pub enum SlamError {
    /// A block that has to be inverted is numerically singular
    #[error("Singular block: {block} (reciprocal condition {reciprocal_condition:.3e})")]
    SingularBlock {
        block: String,
        reciprocal_condition: f64,
    },

    /// Index ranges of the inputs are inconsistent
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The linear system references a landmark without an estimate
    #[error("Unknown landmark: {0}")]
    UnknownLandmark(LandmarkId),

    /// Invalid configuration parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed input data (non-finite values, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SlamError {
    pub(crate) fn dimension(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        SlamError::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

/// Result type alias for GraphSLAM operations
pub type SlamResult<T> = Result<T, SlamError>;
