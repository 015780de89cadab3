//! Error types for neurovis-stats

use thiserror::Error;

/// Errors raised by the correction and smoothing routines
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// Input arrays do not have the required shape
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Nothing to operate on (e.g. a map without any active voxel)
    #[error("Empty result: {reason}")]
    EmptyResult { reason: String },

    /// Cluster-size threshold outside the accepted range
    #[error("Invalid threshold {threshold}: {reason}")]
    InvalidThreshold { threshold: usize, reason: String },

    /// Any other invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StatsError {
    /// Build a shape mismatch from two shape slices
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        StatsError::ShapeMismatch {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }
}

/// Result type alias for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;
