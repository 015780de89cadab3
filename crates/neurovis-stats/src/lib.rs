//! neurovis-stats - Statistical post-processing for RSA result maps
//!
//! This crate provides the numerical routines that run before anything is
//! drawn:
//!
//! - **Correction**: FWE (Bonferroni) and FDR correction of 3-D p-value maps
//! - **Cluster**: exact connected-component labeling and cluster-size
//!   thresholding of statistical maps
//! - **Mask**: ROI masking of volumes
//! - **Spline**: not-a-knot cubic spline resampling of time courses
//! - **Filter**: Butterworth low-pass design and zero-phase filtering
//!
//! # Conventions
//!
//! Volumes are `ndarray` 3-D arrays indexed `[x, y, z]`. A voxel is *active*
//! when it is not NaN and non-zero; NaN marks "no data" and 0 marks
//! "background / not significant".

pub mod cluster;
pub mod correction;
pub mod error;
pub mod filter;
pub mod mask;
pub mod spline;

pub use cluster::*;
pub use correction::*;
pub use error::*;
pub use filter::*;
pub use mask::*;
pub use spline::*;

/// Whether a voxel carries a usable value (not NaN and non-zero)
#[inline]
pub fn is_active(value: f64) -> bool {
    !value.is_nan() && value != 0.0
}
