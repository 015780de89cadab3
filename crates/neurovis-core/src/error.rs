//! Error types for neurovis-core
//!
//! Covers:
//! - Input validation for plotting calls
//! - Rendering and export failures
//! - Configuration loading

use std::path::PathBuf;
use thiserror::Error;

use neurovis_io::IoError;
use neurovis_stats::StatsError;

/// Main error type for plotting operations
#[derive(Error, Debug)]
pub enum PlotError {
    /// Input array has the wrong shape
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Nothing to draw (e.g. an all-NaN volume)
    #[error("No valid results: {reason}")]
    EmptyResult { reason: String },

    /// Cluster-size threshold rejected before correction
    #[error("Invalid threshold {threshold}: {reason}")]
    InvalidThreshold { threshold: usize, reason: String },

    /// A display option is out of range or inconsistent with the data
    #[error("Invalid option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    /// Correction or smoothing failed
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Volume, template or surface loading failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Rendering or writing the figure failed
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl PlotError {
    pub fn shape_mismatch(expected: impl Into<String>, actual: &[usize]) -> Self {
        PlotError::ShapeMismatch {
            expected: expected.into(),
            actual: format!("{:?}", actual),
        }
    }

    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        PlotError::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Errors related to rendering and writing figures
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output extension not understood
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    /// No usable font for a figure that contains text
    #[error("No usable font: {reason}")]
    FontUnavailable { reason: String },

    /// Drawing backend failure
    #[error("Render failed: {message}")]
    Render { message: String },

    /// Figure pixel size is zero or too large
    #[error("Invalid figure size: {width}x{height} px")]
    InvalidSize { width: u32, height: u32 },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

/// Result type alias for plotting operations
pub type PlotResult<T> = Result<T, PlotError>;
